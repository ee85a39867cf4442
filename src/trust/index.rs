//! Phase 2: the EV OID → fingerprint trust database
//!
//! OIDs are processed in sorted order; within an OID the fingerprints keep the
//! filename order of its config line. Every fingerprint is read back and
//! compared as soon as it is stored, and the serialized file is parsed again
//! and compared element by element before it replaces the output. Either
//! comparison failing is a `Verification` error.

use super::database::{CertificateFingerprint, TrustDatabase};
use super::hasher::FingerprintHasher;
use crate::config::{DatabaseFormat, EvPolicyEntry};
use crate::engine::repository::CertificateRepository;
use crate::io::{BuildPaths, PathUtils};
use crate::{PipelineError, Result};
use std::path::Path;
use tracing::{debug, info};

/// Permission bits of the finished trust database
#[cfg(unix)]
pub const TRUST_DATABASE_MODE: u32 = 0o444;

pub struct FingerprintIndexBuilder {
    repository: CertificateRepository,
    hasher: FingerprintHasher,
    paths: BuildPaths,
    format: DatabaseFormat,
}

impl FingerprintIndexBuilder {
    pub fn new(
        repository: CertificateRepository,
        hasher: FingerprintHasher,
        paths: BuildPaths,
        format: DatabaseFormat,
    ) -> Self {
        Self {
            repository,
            hasher,
            paths,
            format,
        }
    }

    pub fn database_path(&self) -> &Path {
        &self.paths.trust_database
    }

    /// Build, verify and write the trust database
    ///
    /// `entries` must already be sorted by OID.
    pub async fn build(&self, entries: &[EvPolicyEntry]) -> Result<TrustDatabase> {
        self.paths.ensure_directories()?;
        if PathUtils::remove_if_exists(&self.paths.trust_database)? {
            debug!(
                "Removed previous trust database {}",
                self.paths.trust_database.display()
            );
        }
        PathUtils::remove_if_exists(&self.paths.trust_database_scratch())?;

        let mut database = TrustDatabase::new();
        for entry in entries {
            database.add_oid(&entry.oid)?;

            for (index, filename) in entry.filenames.iter().enumerate() {
                let certificate = self.repository.resolve(filename)?;
                let digest = self.hasher.fingerprint(&certificate).await?;
                let fingerprint = CertificateFingerprint::new(digest, index);

                database.append(&entry.oid, &fingerprint)?;
                database.verify_entry(&entry.oid, &fingerprint)?;

                debug!(
                    "{}[{}] = {} ({})",
                    entry.oid,
                    index,
                    fingerprint.to_hex(),
                    filename
                );
            }
        }

        self.persist(&database)?;

        info!(
            "Wrote trust database {} ({} OIDs, {} fingerprints)",
            self.paths.trust_database.display(),
            database.len(),
            database.fingerprint_count()
        );
        Ok(database)
    }

    /// Serialize to the scratch file, verify the file, then move it into place
    fn persist(&self, database: &TrustDatabase) -> Result<()> {
        let scratch = self.paths.trust_database_scratch();
        database.write_to(&scratch, self.format)?;

        let read_back =
            TrustDatabase::read_from(&scratch).map_err(|e| PipelineError::Verification {
                key: scratch.display().to_string(),
                expected: "a well-formed trust database".to_string(),
                actual: e.to_string(),
            })?;
        database.verify_matches(&read_back)?;

        std::fs::rename(&scratch, &self.paths.trust_database)?;
        set_read_only(&self.paths.trust_database)?;
        PathUtils::remove_if_exists(&scratch)?;
        Ok(())
    }

    /// Remove the trust database and its scratch file after a failed run
    pub fn discard_output(&self) -> Result<()> {
        let removed_database = PathUtils::remove_if_exists(&self.paths.trust_database)?;
        let removed_scratch = PathUtils::remove_if_exists(&self.paths.trust_database_scratch())?;
        if removed_database || removed_scratch {
            info!(
                "Discarded partial trust database {}",
                self.paths.trust_database.display()
            );
        }
        Ok(())
    }
}

#[cfg(unix)]
fn set_read_only(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(TRUST_DATABASE_MODE))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_read_only(path: &Path) -> Result<()> {
    let mut permissions = std::fs::metadata(path)?.permissions();
    permissions.set_readonly(true);
    std::fs::set_permissions(path, permissions)?;
    Ok(())
}
