use super::command_executor::{ToolCommand, ToolRunner};
use crate::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// The user-domain keychain search list as it was before the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchListSnapshot {
    /// Verbatim `list-keychains` output
    pub raw: String,
    /// Keychain paths, unquoted, in search order
    pub keychains: Vec<String>,
}

impl SearchListSnapshot {
    /// Parse `security list-keychains` output: one quoted path per line
    pub fn parse(raw: &str) -> Self {
        let keychains = raw
            .lines()
            .map(|line| line.trim().trim_matches('"').trim())
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            raw: raw.to_string(),
            keychains,
        }
    }
}

/// Saves and restores the user keychain search list
///
/// `create-keychain` adds the new keychain to the user's search list, which is
/// machine-global state; a run that fails verification puts it back.
pub struct KeychainListManager {
    runner: Arc<dyn ToolRunner>,
    security: PathBuf,
}

impl KeychainListManager {
    pub fn new(runner: Arc<dyn ToolRunner>, security: PathBuf) -> Self {
        Self { runner, security }
    }

    pub async fn snapshot(&self) -> Result<SearchListSnapshot> {
        let list = ToolCommand::new(&self.security).args(["list-keychains", "-d", "user"]);
        let output = self.runner.run_checked(&list).await?;

        let snapshot = SearchListSnapshot::parse(&output.stdout);
        info!(
            "Saved keychain search list ({} keychains)",
            snapshot.keychains.len()
        );
        Ok(snapshot)
    }

    pub async fn restore(&self, snapshot: &SearchListSnapshot) -> Result<()> {
        let restore = ToolCommand::new(&self.security)
            .args(["list-keychains", "-d", "user", "-s"])
            .args(snapshot.keychains.iter().cloned());
        self.runner.run_checked(&restore).await?;

        warn!(
            "Restored keychain search list ({} keychains)",
            snapshot.keychains.len()
        );
        Ok(())
    }
}
