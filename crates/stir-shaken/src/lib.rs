//! A SHAKEN/STIR identity token library: produces and verifies signed JWTs
//! carried in the `Identity` header of SIP INVITE messages, attesting a
//! caller's right to use an originating telephone number.
//!
//! The hard part is the verification pipeline ([`verify::full_verify`]):
//! parse the `Identity` header, resolve the signer's certificate (inline,
//! by URL with caching, or from a file), validate it against a
//! policy-configurable trust store, check revocation, and verify the
//! ECDSA-P256 signature over the JWT's `header.payload` segments. Signing
//! ([`sign::get_identity`]) is the simpler dual.
//!
//! Every operation here is request-scoped and synchronous from the
//! caller's point of view; no SIP message parsing beyond the `Identity`
//! header value, no TLS termination, no certificate issuance.

pub mod base64url;
pub mod cache;
pub mod cert;
pub mod clock;
pub mod error;
pub mod fetch;
pub mod identity;
pub mod jwt;
pub mod keys;
pub mod options;
pub mod pem_util;
pub mod sign;
pub mod verify;

pub use error::{Error, Result};
