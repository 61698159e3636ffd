//! NewType wrappers for strong typing throughout the platform core.
//!
//! These types prevent accidental mixing of semantically different strings
//! (e.g., passing a tenant key where a token id is expected).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate a NewType wrapper with standard trait implementations.
macro_rules! newtype_string {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Get the inner value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner String.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

newtype_string!(
    /// Globally unique, human-readable tenant key (the "subdomain").
    ///
    /// Tenant keys are case-insensitive on the wire and always normalized
    /// to lowercase before lookup. Use [`TenantKey::normalized`] when the
    /// value comes from an external signal such as a request header.
    TenantKey
);

impl TenantKey {
    /// Build a key from an external signal, normalizing to lowercase.
    pub fn normalized(value: &str) -> Self {
        Self(value.trim().to_ascii_lowercase())
    }
}

newtype_string!(
    /// Unique credential identifier (the `jti` claim).
    ///
    /// Freshly generated for every issued credential so two credentials for
    /// the same principal never collide in the revocation keyspace.
    TokenId
);

newtype_string!(
    /// Domain issue identifier, used only for naming issue rooms.
    ///
    /// Issue CRUD lives outside this core; the realtime layer treats the
    /// identifier as an opaque room key.
    IssueId
);
