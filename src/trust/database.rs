//! The EV trust database: a property list mapping each EV policy OID to the
//! ordered array of SHA-1 fingerprints of the roots allowed to issue under it.
//!
//! ```text
//! <dict>
//!   <key>2.16.840.1.114412.2.1</key>
//!   <array>
//!     <data>X7fuBjPiWdutDEya5tOPGmHH3CU=</data>
//!   </array>
//! </dict>
//! ```

use super::hasher::SHA1_LEN;
use crate::config::DatabaseFormat;
use crate::{PipelineError, Result};
use plist::{Dictionary, Value};
use std::io::Cursor;
use std::path::Path;

/// SHA-1 of one DER certificate and its position in its OID's array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertificateFingerprint {
    pub digest: [u8; SHA1_LEN],
    pub index: usize,
}

impl CertificateFingerprint {
    pub fn new(digest: [u8; SHA1_LEN], index: usize) -> Self {
        Self { digest, index }
    }

    /// Canonical upper-case hex
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.digest)
    }
}

/// Ordered OID → fingerprints mapping backed by a plist dictionary
///
/// Keys keep insertion order, so a database filled in sorted OID order
/// serializes deterministically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrustDatabase {
    root: Dictionary,
}

impl TrustDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the empty array for an OID; the OID must not exist yet
    pub fn add_oid(&mut self, oid: &str) -> Result<()> {
        if self.root.contains_key(oid) {
            return Err(PipelineError::Config(format!(
                "OID {oid} is already present in the trust database"
            )));
        }
        self.root.insert(oid.to_string(), Value::Array(Vec::new()));
        Ok(())
    }

    /// Store a fingerprint at its index, which must be the next free slot
    pub fn append(&mut self, oid: &str, fingerprint: &CertificateFingerprint) -> Result<()> {
        let array = self
            .root
            .get_mut(oid)
            .and_then(Value::as_array_mut)
            .ok_or_else(|| {
                PipelineError::Config(format!("OID {oid} has no array in the trust database"))
            })?;

        if fingerprint.index != array.len() {
            return Err(PipelineError::Config(format!(
                "Fingerprint for {oid} has index {} but the next free index is {}",
                fingerprint.index,
                array.len()
            )));
        }

        array.push(Value::Data(fingerprint.digest.to_vec()));
        Ok(())
    }

    /// Raw bytes stored at `oid[index]`
    pub fn raw_at(&self, oid: &str, index: usize) -> Option<&[u8]> {
        self.root
            .get(oid)?
            .as_array()?
            .get(index)?
            .as_data()
    }

    /// Fingerprint stored at `oid[index]`, if it is a well-formed digest
    pub fn fingerprint_at(&self, oid: &str, index: usize) -> Option<CertificateFingerprint> {
        let bytes = self.raw_at(oid, index)?;
        let digest: [u8; SHA1_LEN] = bytes.try_into().ok()?;
        Some(CertificateFingerprint::new(digest, index))
    }

    /// Read back `oid[expected.index]` and compare its hex encoding against
    /// the expected fingerprint
    pub fn verify_entry(&self, oid: &str, expected: &CertificateFingerprint) -> Result<()> {
        let expected_hex = expected.to_hex();
        let actual_hex = self
            .raw_at(oid, expected.index)
            .map(hex::encode_upper)
            .unwrap_or_else(|| "<missing>".to_string());

        if expected_hex != actual_hex {
            return Err(PipelineError::Verification {
                key: format!("{oid}:{}", expected.index),
                expected: expected_hex,
                actual: actual_hex,
            });
        }
        Ok(())
    }

    /// Check that `read_back` holds exactly the same OIDs, in the same order,
    /// with the same fingerprints as `self`
    pub fn verify_matches(&self, read_back: &TrustDatabase) -> Result<()> {
        let expected_oids: Vec<&str> = self.oids().collect();
        let actual_oids: Vec<&str> = read_back.oids().collect();
        if expected_oids != actual_oids {
            return Err(PipelineError::Verification {
                key: "<keys>".to_string(),
                expected: expected_oids.join(","),
                actual: actual_oids.join(","),
            });
        }

        for oid in expected_oids {
            let expected = self.fingerprints(oid).unwrap_or_default();
            let actual_len = read_back.entry_count(oid);
            if expected.len() != actual_len {
                return Err(PipelineError::Verification {
                    key: oid.to_string(),
                    expected: format!("{} entries", expected.len()),
                    actual: format!("{actual_len} entries"),
                });
            }
            for fingerprint in &expected {
                read_back.verify_entry(oid, fingerprint)?;
            }
        }
        Ok(())
    }

    /// OIDs in storage order
    pub fn oids(&self) -> impl Iterator<Item = &str> {
        self.root.keys().map(String::as_str)
    }

    /// Number of array elements stored under an OID (0 if absent)
    pub fn entry_count(&self, oid: &str) -> usize {
        self.root
            .get(oid)
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    /// All well-formed fingerprints of an OID, in index order
    pub fn fingerprints(&self, oid: &str) -> Option<Vec<CertificateFingerprint>> {
        let count = self.root.get(oid)?.as_array()?.len();
        Some(
            (0..count)
                .filter_map(|index| self.fingerprint_at(oid, index))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Total number of fingerprints across all OIDs
    pub fn fingerprint_count(&self) -> usize {
        self.oids().map(|oid| self.entry_count(oid)).sum()
    }

    pub fn to_bytes(&self, format: DatabaseFormat) -> Result<Vec<u8>> {
        let value = Value::Dictionary(self.root.clone());
        let mut buffer = Vec::new();
        match format {
            DatabaseFormat::Xml => value.to_writer_xml(&mut buffer)?,
            DatabaseFormat::Binary => value.to_writer_binary(&mut buffer)?,
        }
        Ok(buffer)
    }

    pub fn write_to(&self, path: &Path, format: DatabaseFormat) -> Result<()> {
        std::fs::write(path, self.to_bytes(format)?)?;
        Ok(())
    }

    /// Parse a serialized database (XML or binary)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let value = Value::from_reader(Cursor::new(bytes))?;
        let root = value.into_dictionary().ok_or_else(|| {
            PipelineError::Config("Trust database root is not a dictionary".to_string())
        })?;

        for (oid, value) in root.iter() {
            let array = value.as_array().ok_or_else(|| {
                PipelineError::Config(format!("Trust database entry {oid} is not an array"))
            })?;
            if array.iter().any(|element| element.as_data().is_none()) {
                return Err(PipelineError::Config(format!(
                    "Trust database entry {oid} holds non-data elements"
                )));
            }
        }

        Ok(Self { root })
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// `{ oid: [hex, …] }` view for display
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for oid in self.oids() {
            let count = self.entry_count(oid);
            let digests: Vec<serde_json::Value> = (0..count)
                .map(|index| {
                    let hex = self
                        .raw_at(oid, index)
                        .map(hex::encode_upper)
                        .unwrap_or_default();
                    serde_json::Value::String(hex)
                })
                .collect();
            map.insert(oid.to_string(), serde_json::Value::Array(digests));
        }
        serde_json::Value::Object(map)
    }
}
