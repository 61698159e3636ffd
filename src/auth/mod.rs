//! Authentication module: credential issuing, revocation, and the
//! per-request authentication pipeline.
//!
//! The design is a hybrid of two separate components:
//!
//! - **Stateless credentials**: signed, fixed-lifetime bearer tokens minted
//!   by [`CredentialIssuer`] and verified purely from their signature.
//! - **External revocation**: a keyed store ([`RevocationStore`]) consulted
//!   after signature verification, so an explicitly revoked credential never
//!   authenticates again inside its original window.
//!
//! Revocation is deliberately NOT folded into signature verification; the
//! verifier stays pure and the store stays a plain keyed lookup.
//!
//! ## Security model
//!
//! - Raw credentials and passwords are never persisted; both are stored as
//!   SHA-256 digests.
//! - Revocation reads fail open: an unreachable store re-admits only
//!   sessions that remain validly signed and unexpired, while failing
//!   closed would lock out every user on a single cache outage.
//! - Principal lookups fail closed; there is no safe default for identity.

mod authenticator;
mod context;
mod credentials;
mod principal_store;
mod revocation;

pub use authenticator::{RequestAuthenticator, bearer_token};
pub use context::RequestIdentity;
pub use credentials::{CREDENTIAL_TTL_DAYS, Claims, CredentialIssuer, hash_password};
pub use principal_store::PrincipalStore;
pub use revocation::{RevocationStore, hash_credential};
