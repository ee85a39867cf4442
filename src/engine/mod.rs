//! Pipeline orchestration
//!
//! A [`Pipeline`] owns the immutable run settings and the tool runner, builds
//! each component from them, and sequences the phases:
//!
//! 1. snapshot the user keychain search list
//! 2. Phase 1: fresh keychain with every referenced certificate
//! 3. Phase 2: verified OID → fingerprint trust database
//!
//! Asset staging and signing run separately against a pre-built input
//! directory. Every step is awaited before the next begins; the first error
//! ends the run.

pub mod command_executor;
pub mod keychain;
pub mod repository;
pub mod search_list;

use crate::asset::{AssetLayout, AssetManifest, AssetSigner, AssetStager, StagedAsset};
use crate::config::{ConfigLoader, EvPolicyEntry, PipelineSettings};
use crate::io::BuildPaths;
use crate::trust::{FingerprintHasher, FingerprintIndexBuilder, TrustDatabase};
use crate::Result;
use command_executor::{SystemToolRunner, ToolRunner};
use keychain::{KeychainBuilder, KeychainReport};
use repository::CertificateRepository;
use search_list::{KeychainListManager, SearchListSnapshot};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Outcome of a full `build` run
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub keychain: KeychainReport,
    pub trust_database: PathBuf,
    pub oids: usize,
    pub fingerprints: usize,
}

/// Outcome of `validate`: the config parsed and every certificate resolved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub oids: usize,
    pub certificates: usize,
    /// OIDs whose config line lists no files
    pub empty_oids: Vec<String>,
    /// Files in the roots directory that no OID references
    pub unreferenced: Vec<String>,
}

pub struct Pipeline {
    settings: PipelineSettings,
    runner: Arc<dyn ToolRunner>,
    paths: BuildPaths,
}

impl Pipeline {
    pub fn new(settings: PipelineSettings, runner: Arc<dyn ToolRunner>) -> Self {
        let paths = BuildPaths::from_settings(&settings);
        Self {
            settings,
            runner,
            paths,
        }
    }

    /// Pipeline running the real tools with the configured timeout
    pub fn with_system_tools(settings: PipelineSettings) -> Self {
        let timeout = Duration::from_secs(settings.tools.timeout_seconds);
        Self::new(settings, Arc::new(SystemToolRunner::new(timeout)))
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn paths(&self) -> &BuildPaths {
        &self.paths
    }

    pub fn config_loader(&self) -> ConfigLoader {
        ConfigLoader::new(&self.settings.ev_config)
    }

    pub fn repository(&self) -> Result<CertificateRepository> {
        CertificateRepository::new(&self.settings.roots_dir)
    }

    pub fn keychain_builder(&self) -> Result<KeychainBuilder> {
        Ok(KeychainBuilder::new(
            self.repository()?,
            self.runner.clone(),
            self.settings.tools.security.clone(),
            self.paths.keychain.clone(),
            self.settings.keychain.clone(),
        ))
    }

    pub fn index_builder(&self) -> Result<FingerprintIndexBuilder> {
        let hasher = FingerprintHasher::new(
            self.settings.database.digest,
            self.settings.tools.openssl.clone(),
            self.runner.clone(),
        );
        Ok(FingerprintIndexBuilder::new(
            self.repository()?,
            hasher,
            self.paths.clone(),
            self.settings.database.format,
        ))
    }

    pub fn list_manager(&self) -> KeychainListManager {
        KeychainListManager::new(self.runner.clone(), self.settings.tools.security.clone())
    }

    pub fn stager(&self) -> AssetStager {
        AssetStager::new(
            self.runner.clone(),
            self.settings.tools.assettool.clone(),
            AssetManifest::from_settings(&self.settings.asset),
            AssetLayout::from_settings(&self.settings.asset),
            self.settings.asset.staging_dir.clone(),
        )
    }

    pub fn signer(&self) -> AssetSigner {
        AssetSigner::new(self.runner.clone(), self.settings.tools.assettool.clone())
    }

    /// Snapshot, Phase 1, Phase 2
    pub async fn build(&self) -> Result<BuildReport> {
        let loader = self.config_loader();
        let entries = loader.entries()?;
        let sorted = loader.sorted_entries()?;

        // A failed run must not leave the previous trust database behind
        self.index_builder()?.discard_output()?;
        self.repository()?.resolve_all(&entries)?;

        let snapshot = self.snapshot_search_list().await?;

        info!("Phase 1: building keychain");
        let keychain = self.keychain_builder()?.build(&entries).await?;

        info!("Phase 2: building trust database");
        let database = self.run_index(&sorted, snapshot.as_ref()).await?;

        Ok(BuildReport {
            keychain,
            trust_database: self.paths.trust_database.clone(),
            oids: database.len(),
            fingerprints: database.fingerprint_count(),
        })
    }

    /// Phase 1 only
    pub async fn build_keychain(&self) -> Result<KeychainReport> {
        let entries = self.config_loader().entries()?;
        self.keychain_builder()?.build(&entries).await
    }

    /// Phase 2 only, still guarded by the search-list snapshot
    pub async fn build_index(&self) -> Result<TrustDatabase> {
        let sorted = self.config_loader().sorted_entries()?;
        let snapshot = self.snapshot_search_list().await?;
        self.run_index(&sorted, snapshot.as_ref()).await
    }

    async fn snapshot_search_list(&self) -> Result<Option<SearchListSnapshot>> {
        if !self.settings.keychain.manage_search_list {
            return Ok(None);
        }
        Ok(Some(self.list_manager().snapshot().await?))
    }

    async fn run_index(
        &self,
        sorted: &[EvPolicyEntry],
        snapshot: Option<&SearchListSnapshot>,
    ) -> Result<TrustDatabase> {
        let outcome = self.index_builder()?.build(sorted).await;
        self.settle_index(outcome, snapshot).await
    }

    /// Pass a Phase 2 outcome through, compensating first on a verification
    /// failure
    async fn settle_index(
        &self,
        outcome: Result<TrustDatabase>,
        snapshot: Option<&SearchListSnapshot>,
    ) -> Result<TrustDatabase> {
        match outcome {
            Ok(database) => Ok(database),
            Err(e) if e.is_verification() => {
                e.log_if_security_critical();
                self.recover_from_verification_failure(snapshot).await;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Restore the search list and delete the partial trust database
    ///
    /// Failures here are logged; the verification error stays the reported
    /// cause of the run.
    pub async fn recover_from_verification_failure(&self, snapshot: Option<&SearchListSnapshot>) {
        if let Some(snapshot) = snapshot {
            if let Err(e) = self.list_manager().restore(snapshot).await {
                error!("Failed to restore keychain search list: {}", e);
            }
        }

        let discarded = self
            .index_builder()
            .and_then(|builder| builder.discard_output());
        if let Err(e) = discarded {
            error!(
                "Failed to remove partial trust database {}: {}",
                self.paths.trust_database.display(),
                e
            );
        }
    }

    /// Assemble and stage the asset from the configured input directory
    pub async fn stage_asset(&self) -> Result<StagedAsset> {
        self.stager().stage(&self.settings.asset.input_dir).await
    }

    pub async fn sign_asset(&self) -> Result<()> {
        self.signer().sign(&self.settings.asset.staging_dir).await
    }

    /// Stage then sign; nothing is signed unless staging succeeded
    pub async fn publish_asset(&self) -> Result<StagedAsset> {
        let staged = self.stage_asset().await?;
        self.signer().sign(&staged.staging_dir).await?;
        Ok(staged)
    }

    /// Parse the config and resolve every certificate without producing output
    pub fn validate(&self) -> Result<ValidationReport> {
        let entries = self.config_loader().entries()?;
        let repository = self.repository()?;
        let certificates = repository.resolve_all(&entries)?;

        Ok(ValidationReport {
            oids: entries.len(),
            certificates: certificates.len(),
            empty_oids: entries
                .iter()
                .filter(|entry| entry.filenames.is_empty())
                .map(|entry| entry.oid.clone())
                .collect(),
            unreferenced: repository.unreferenced(&entries)?,
        })
    }
}
