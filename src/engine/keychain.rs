use super::command_executor::{ToolCommand, ToolOutput, ToolRunner};
use super::repository::CertificateRepository;
use crate::config::{EvPolicyEntry, KeychainSettings};
use crate::io::PathUtils;
use crate::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of Phase 1
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeychainReport {
    pub keychain: PathBuf,
    /// Certificates newly added
    pub imported: usize,
    /// Certificates the tool reported as already present
    pub already_present: usize,
}

/// Phase 1: imports every referenced certificate into a fresh keychain
pub struct KeychainBuilder {
    repository: CertificateRepository,
    runner: Arc<dyn ToolRunner>,
    security: PathBuf,
    keychain: PathBuf,
    settings: KeychainSettings,
}

impl KeychainBuilder {
    pub fn new(
        repository: CertificateRepository,
        runner: Arc<dyn ToolRunner>,
        security: PathBuf,
        keychain: PathBuf,
        settings: KeychainSettings,
    ) -> Self {
        Self {
            repository,
            runner,
            security,
            keychain,
            settings,
        }
    }

    pub fn keychain_path(&self) -> &Path {
        &self.keychain
    }

    /// Recreate the keychain and import the certificates of `entries` in
    /// source order
    pub async fn build(&self, entries: &[EvPolicyEntry]) -> Result<KeychainReport> {
        if let Some(parent) = self.keychain.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if PathUtils::remove_if_exists(&self.keychain)? {
            debug!("Removed previous keychain {}", self.keychain.display());
        }

        let create = ToolCommand::new(&self.security)
            .arg("create-keychain")
            .arg("-p")
            .arg(self.settings.password.clone())
            .path_arg(&self.keychain);
        self.runner.run_checked(&create).await?;

        let mut report = KeychainReport {
            keychain: self.keychain.clone(),
            ..Default::default()
        };

        for entry in entries {
            for filename in &entry.filenames {
                let certificate = self.repository.resolve(filename)?;
                let add = ToolCommand::new(&self.security)
                    .arg("add-certificates")
                    .arg("-k")
                    .path_arg(&self.keychain)
                    .path_arg(&certificate);

                let output = self.runner.run(&add).await?;
                if output.success() {
                    report.imported += 1;
                } else if self.is_already_present(&output) {
                    debug!("{} already present in keychain", filename);
                    report.already_present += 1;
                } else {
                    return Err(add.failure(output.describe_failure()));
                }
            }
        }

        info!(
            "Built keychain {} ({} imported, {} already present)",
            self.keychain.display(),
            report.imported,
            report.already_present
        );
        Ok(report)
    }

    fn is_already_present(&self, output: &ToolOutput) -> bool {
        output.exit_code == Some(self.settings.already_present_exit_code)
            || output.stderr.contains("already exists in the keychain")
    }
}
