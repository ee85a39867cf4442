use super::CommandHandler;
use crate::cli::app::OutputFormat;
use crate::engine::Pipeline;
use crate::trust::TrustDatabase;
use crate::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Handler for the `inspect` command
pub struct InspectCommand {
    pub path: Option<PathBuf>,
    pub format: OutputFormat,
}

#[async_trait]
impl CommandHandler for InspectCommand {
    async fn execute(&self, pipeline: &Pipeline) -> Result<()> {
        let path = self
            .path
            .clone()
            .unwrap_or_else(|| pipeline.paths().trust_database.clone());
        let database = TrustDatabase::read_from(&path)?;

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&database.to_json())?);
            }
            OutputFormat::Text => self.print_table(&database),
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "inspect"
    }
}

impl InspectCommand {
    /// Create new inspect command
    pub fn new(path: Option<PathBuf>, format: OutputFormat) -> Self {
        Self { path, format }
    }

    fn print_table(&self, database: &TrustDatabase) {
        if database.is_empty() {
            println!("Trust database is empty.");
            return;
        }

        let oid_width = database.oids().map(str::len).max().unwrap_or(3).max(3);

        println!("{:<oid_width$}  {:>5}  SHA-1", "OID", "INDEX");
        for oid in database.oids() {
            let count = database.entry_count(oid);
            if count == 0 {
                println!("{:<oid_width$}  {:>5}  -", oid, "");
            }
            for index in 0..count {
                let digest = database
                    .raw_at(oid, index)
                    .map(hex::encode_upper)
                    .unwrap_or_default();
                println!("{:<oid_width$}  {:>5}  {}", oid, index, digest);
            }
        }
        println!(
            "\n{} OIDs, {} fingerprints",
            database.len(),
            database.fingerprint_count()
        );
    }
}
