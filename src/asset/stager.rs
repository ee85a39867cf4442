use super::manifest::{AssetLayout, AssetManifest, ASSET_VERSION_PLIST};
use crate::engine::command_executor::{ToolCommand, ToolRunner};
use crate::{PipelineError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a successful staging run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedAsset {
    pub tree_dir: PathBuf,
    pub staging_dir: PathBuf,
    /// Number of files copied into the tree
    pub files: usize,
    /// `VersionNumber` from the asset version plist, when readable
    pub version: Option<u64>,
}

/// Assembles the asset tree from an input directory and hands it to
/// `assettool stage`
pub struct AssetStager {
    runner: Arc<dyn ToolRunner>,
    assettool: PathBuf,
    manifest: AssetManifest,
    layout: AssetLayout,
    staging_dir: PathBuf,
}

impl AssetStager {
    pub fn new(
        runner: Arc<dyn ToolRunner>,
        assettool: PathBuf,
        manifest: AssetManifest,
        layout: AssetLayout,
        staging_dir: PathBuf,
    ) -> Self {
        Self {
            runner,
            assettool,
            manifest,
            layout,
            staging_dir,
        }
    }

    pub fn layout(&self) -> &AssetLayout {
        &self.layout
    }

    /// Check every required input, assemble the tree, then run the stage tool
    pub async fn stage(&self, input_dir: &Path) -> Result<StagedAsset> {
        let files = self.assemble(input_dir)?;
        let version = read_asset_version(&input_dir.join(ASSET_VERSION_PLIST));

        std::fs::create_dir_all(&self.staging_dir)?;
        let stage = ToolCommand::new(&self.assettool)
            .arg("stage")
            .arg("-p")
            .path_arg(&self.layout.tree_dir)
            .arg("-s")
            .path_arg(&self.staging_dir);
        self.runner.run_checked(&stage).await?;

        match version {
            Some(version) => info!(
                "Staged asset version {} into {}",
                version,
                self.staging_dir.display()
            ),
            None => info!("Staged asset into {}", self.staging_dir.display()),
        }

        Ok(StagedAsset {
            tree_dir: self.layout.tree_dir.clone(),
            staging_dir: self.staging_dir.clone(),
            files,
            version,
        })
    }

    /// Copy the manifest into a fresh asset tree; nothing is copied unless
    /// every required file is present
    pub fn assemble(&self, input_dir: &Path) -> Result<usize> {
        if !input_dir.is_dir() {
            return Err(PipelineError::Staging(format!(
                "asset input directory {} does not exist",
                input_dir.display()
            )));
        }

        let missing = self.manifest.missing_in(input_dir);
        if !missing.is_empty() {
            return Err(PipelineError::MissingAssetInputs {
                dir: input_dir.to_path_buf(),
                files: missing,
            });
        }

        if self.layout.tree_dir.exists() {
            debug!("Removing previous asset tree {}", self.layout.tree_dir.display());
            std::fs::remove_dir_all(&self.layout.tree_dir)?;
        }
        let data_dir = self.layout.data_dir();
        std::fs::create_dir_all(&data_dir)?;

        for name in &self.manifest.data_files {
            std::fs::copy(input_dir.join(name), data_dir.join(name))?;
            debug!("Copied {}", name);
        }
        std::fs::copy(
            input_dir.join(&self.manifest.info_plist),
            self.layout.info_plist(),
        )?;

        let files = self.manifest.data_files.len() + 1;
        info!(
            "Assembled {} files into {}",
            files,
            self.layout.collection_dir().display()
        );
        Ok(files)
    }
}

/// `VersionNumber` of an asset version plist, as integer or numeric string
pub fn read_asset_version(path: &Path) -> Option<u64> {
    let value = match plist::Value::from_file(path) {
        Ok(value) => value,
        Err(e) => {
            warn!("Could not read asset version from {}: {}", path.display(), e);
            return None;
        }
    };

    let version = value.as_dictionary()?.get("VersionNumber")?;
    version
        .as_unsigned_integer()
        .or_else(|| version.as_string().and_then(|s| s.trim().parse().ok()))
}
