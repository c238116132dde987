//! Request signing for the Zadarma REST API.
//!
//! Every API call carries an `Authorization: <key>:<signature>` header. The
//! signature is derived from the endpoint path and the canonical query
//! string of the request:
//!
//! - **Canonicalization**: parameters sorted by key, RFC 1738 encoded
//!   (space as `+`), joined with `&`
//! - **Signature**: `base64(hex(hmac_sha1(secret, path ++ query ++ md5_hex(query))))`
//!
//! Both steps are pure: no clock, nonce or I/O is involved, so the same
//! inputs always produce the same signature.

mod error;
mod params;
mod signature;

pub use error::SigningError;
pub use params::{ParameterMap, canonicalize, encode_component};
pub use signature::{params_digest, sign, string_to_sign};
