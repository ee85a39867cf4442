use super::CommandHandler;
use crate::engine::Pipeline;
use crate::Result;
use async_trait::async_trait;

/// Handler for the `build` command
pub struct BuildCommand;

#[async_trait]
impl CommandHandler for BuildCommand {
    async fn execute(&self, pipeline: &Pipeline) -> Result<()> {
        let report = pipeline.build().await?;

        println!(
            "Keychain: {} ({} imported, {} already present)",
            report.keychain.keychain.display(),
            report.keychain.imported,
            report.keychain.already_present
        );
        println!(
            "Trust database: {} ({} OIDs, {} fingerprints)",
            report.trust_database.display(),
            report.oids,
            report.fingerprints
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "build"
    }
}
