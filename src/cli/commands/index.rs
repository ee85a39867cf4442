use super::CommandHandler;
use crate::engine::Pipeline;
use crate::Result;
use async_trait::async_trait;

/// Handler for the `index` command
pub struct IndexCommand;

#[async_trait]
impl CommandHandler for IndexCommand {
    async fn execute(&self, pipeline: &Pipeline) -> Result<()> {
        let database = pipeline.build_index().await?;
        println!(
            "Trust database: {} ({} OIDs, {} fingerprints)",
            pipeline.paths().trust_database.display(),
            database.len(),
            database.fingerprint_count()
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "index"
    }
}
