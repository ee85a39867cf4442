use super::CommandHandler;
use crate::asset::StagedAsset;
use crate::engine::Pipeline;
use crate::Result;
use async_trait::async_trait;

/// Which part of the asset flow to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetStep {
    Stage,
    Sign,
    /// Stage then sign
    Publish,
}

/// Handler for the `stage`, `sign` and `asset` commands
pub struct AssetCommand {
    pub step: AssetStep,
}

#[async_trait]
impl CommandHandler for AssetCommand {
    async fn execute(&self, pipeline: &Pipeline) -> Result<()> {
        match self.step {
            AssetStep::Stage => {
                let staged = pipeline.stage_asset().await?;
                print_staged(&staged);
            }
            AssetStep::Sign => {
                pipeline.sign_asset().await?;
                println!(
                    "Signed: {}",
                    pipeline.settings().asset.staging_dir.display()
                );
            }
            AssetStep::Publish => {
                let staged = pipeline.publish_asset().await?;
                print_staged(&staged);
                println!("Signed: {}", staged.staging_dir.display());
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        match self.step {
            AssetStep::Stage => "stage",
            AssetStep::Sign => "sign",
            AssetStep::Publish => "asset",
        }
    }
}

impl AssetCommand {
    pub fn new(step: AssetStep) -> Self {
        Self { step }
    }
}

fn print_staged(staged: &StagedAsset) {
    let version = staged
        .version
        .map(|v| v.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    println!(
        "Staged: {} ({} files, version {}) -> {}",
        staged.tree_dir.display(),
        staged.files,
        version,
        staged.staging_dir.display()
    );
}
