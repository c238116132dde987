//! Correlation ids for log spans.
//!
//! Ids use ULID format so that ids minted later sort after earlier ones,
//! which keeps log lines for consecutive batches easy to follow.

use std::fmt;
use ulid::Ulid;

/// Macro to generate a strongly-typed ID wrapper around ULID.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(Ulid);

        impl $name {
            /// Creates a new ID with a randomly generated ULID.
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }
    };
}

define_id!(
    /// Identifies one batch of input items.
    BatchId,
    "batch"
);

define_id!(
    /// Identifies a single signed request to the provider.
    RequestId,
    "req"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_id_display_format() {
        let id = BatchId::new();
        assert!(id.to_string().starts_with("batch_"));
    }

    #[test]
    fn request_id_display_format() {
        let id = RequestId::new();
        let rendered = id.to_string();
        let ulid = rendered.strip_prefix("req_").expect("prefix");
        assert_eq!(ulid.len(), 26);
    }

    #[test]
    fn fresh_ids_differ() {
        assert_ne!(RequestId::new(), RequestId::default());
    }
}
