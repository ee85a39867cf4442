use super::CommandHandler;
use crate::cli::app::OutputFormat;
use crate::engine::Pipeline;
use crate::Result;
use async_trait::async_trait;

/// Handler for the `validate` command
pub struct ValidateCommand {
    pub format: OutputFormat,
}

#[async_trait]
impl CommandHandler for ValidateCommand {
    async fn execute(&self, pipeline: &Pipeline) -> Result<()> {
        let report = pipeline.validate()?;

        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "oids": report.oids,
                    "certificates": report.certificates,
                    "empty_oids": report.empty_oids,
                    "unreferenced": report.unreferenced,
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            OutputFormat::Text => {
                println!(
                    "OK: {} OIDs, {} certificate references",
                    report.oids, report.certificates
                );
                for oid in &report.empty_oids {
                    println!("  OID without certificates: {oid}");
                }
                for file in &report.unreferenced {
                    println!("  Unreferenced root: {file}");
                }
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "validate"
    }
}

impl ValidateCommand {
    /// Create new validate command
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}
