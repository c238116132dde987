//! The provider's request signature.

use crate::error::SigningError;
use crate::params::{ParameterMap, canonicalize};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Lowercase hex MD5 of a canonical query string.
#[must_use]
pub fn params_digest(params_string: &str) -> String {
    hex::encode(Md5::digest(params_string.as_bytes()))
}

/// The message fed to the HMAC: path, query and query digest, unseparated.
#[must_use]
pub fn string_to_sign(endpoint_path: &str, params_string: &str) -> String {
    format!(
        "{endpoint_path}{params_string}{}",
        params_digest(params_string)
    )
}

/// Computes the signature for a request.
///
/// The result is base64 over the lowercase hex text of the HMAC-SHA1, not
/// over the raw MAC bytes. The provider verifies exactly this encoding.
///
/// # Errors
///
/// Returns [`SigningError::InvalidKey`] if the HMAC cannot be keyed, which
/// HMAC-SHA1 does not do for any key length.
pub fn sign(
    endpoint_path: &str,
    params: &ParameterMap,
    secret: &str,
) -> Result<String, SigningError> {
    let params_string = canonicalize(params);
    let message = string_to_sign(endpoint_path, &params_string);

    let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).map_err(|e| {
        SigningError::InvalidKey {
            details: e.to_string(),
        }
    })?;
    mac.update(message.as_bytes());
    let hex_mac = hex::encode(mac.finalize().into_bytes());

    Ok(BASE64.encode(hex_mac.as_bytes()))
}
