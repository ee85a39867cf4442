//! EV trust database
//!
//! Maps each EV policy OID to the SHA-1 fingerprints of the root certificates
//! allowed to issue EV certificates under that policy.

pub mod database;
pub mod hasher;
pub mod index;

pub use database::{CertificateFingerprint, TrustDatabase};
pub use hasher::{FingerprintHasher, SHA1_LEN};
pub use index::FingerprintIndexBuilder;
