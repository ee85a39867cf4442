pub mod asset;
pub mod build;
pub mod index;
pub mod inspect;
pub mod keychain;
pub mod validate;

use crate::engine::Pipeline;
use crate::Result;
use async_trait::async_trait;

/// Common trait for all command handlers
#[async_trait]
pub trait CommandHandler: Sync {
    /// Execute the command against a configured pipeline
    async fn execute(&self, pipeline: &Pipeline) -> Result<()>;

    /// Get command name for logging
    fn name(&self) -> &'static str;
}
