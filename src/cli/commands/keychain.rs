use super::CommandHandler;
use crate::engine::Pipeline;
use crate::Result;
use async_trait::async_trait;

/// Handler for the `keychain` command
pub struct KeychainCommand;

#[async_trait]
impl CommandHandler for KeychainCommand {
    async fn execute(&self, pipeline: &Pipeline) -> Result<()> {
        let report = pipeline.build_keychain().await?;
        println!(
            "Keychain: {} ({} imported, {} already present)",
            report.keychain.display(),
            report.imported,
            report.already_present
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "keychain"
    }
}
