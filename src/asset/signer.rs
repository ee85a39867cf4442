use crate::engine::command_executor::{ToolCommand, ToolRunner};
use crate::{PipelineError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Runs `assettool sign` against a staging directory
pub struct AssetSigner {
    runner: Arc<dyn ToolRunner>,
    assettool: PathBuf,
}

impl AssetSigner {
    pub fn new(runner: Arc<dyn ToolRunner>, assettool: PathBuf) -> Self {
        Self { runner, assettool }
    }

    pub async fn sign(&self, staging_dir: &Path) -> Result<()> {
        if !staging_dir.is_dir() {
            return Err(PipelineError::Staging(format!(
                "staging directory {} does not exist; stage the asset first",
                staging_dir.display()
            )));
        }

        let sign = ToolCommand::new(&self.assettool)
            .arg("sign")
            .arg("-s")
            .path_arg(staging_dir);
        self.runner.run_checked(&sign).await?;

        info!("Signed asset in {}", staging_dir.display());
        Ok(())
    }
}
