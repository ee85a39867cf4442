use super::types::EvPolicyEntry;
use crate::{PipelineError, Result};
use once_cell::sync::Lazy;
use once_cell::unsync::OnceCell;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

static DOTTED_OID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+(\.[0-9]+)+$").expect("static OID pattern"));

/// Loader for the EV policy configuration
///
/// The file format is line based:
///
/// ```text
/// # comment
/// 2.16.840.1.114412.2.1 "DigiCertHighAssuranceEVRootCA.cer"
/// "1.3.6.1.4.1.6334.1.100.1" "CybertrustGlobalRoot.cer" "GTECyberTrustGlobalRoot.cer"
/// ```
///
/// Each retained line is split on `"`; the first non-blank token is the OID and
/// the remaining non-blank tokens are certificate filenames.
pub struct ConfigLoader {
    path: PathBuf,
    /// Non-comment, non-blank lines with their 1-based line numbers
    retained: OnceCell<Vec<(usize, String)>>,
}

impl ConfigLoader {
    /// Create a loader for the given config path; nothing is read yet
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            retained: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries in source order (keychain phase)
    pub fn entries(&self) -> Result<Vec<EvPolicyEntry>> {
        let entries: Vec<EvPolicyEntry> = self
            .retained_lines()?
            .iter()
            .map(|(line_no, line)| parse_line(line, *line_no))
            .collect();

        check_unique_oids(&entries)?;

        for entry in &entries {
            if entry.filenames.is_empty() {
                warn!(
                    "{}:{}: OID {} lists no certificate files",
                    self.path.display(),
                    entry.line,
                    entry.oid
                );
            }
            if !is_dotted_oid(&entry.oid) {
                warn!(
                    "{}:{}: '{}' is not a dotted-decimal OID",
                    self.path.display(),
                    entry.line,
                    entry.oid
                );
            }
        }

        Ok(entries)
    }

    /// Entries sorted by OID (trust database phase)
    pub fn sorted_entries(&self) -> Result<Vec<EvPolicyEntry>> {
        let mut entries = self.entries()?;
        entries.sort_by(|a, b| a.oid.cmp(&b.oid));
        Ok(entries)
    }

    fn retained_lines(&self) -> Result<&Vec<(usize, String)>> {
        self.retained.get_or_try_init(|| {
            let contents = std::fs::read_to_string(&self.path).map_err(|e| {
                PipelineError::Config(format!(
                    "Failed to read EV config {}: {}",
                    self.path.display(),
                    e
                ))
            })?;

            let lines = retain_lines(&contents);
            debug!(
                "Loaded {} policy lines from {}",
                lines.len(),
                self.path.display()
            );
            Ok(lines)
        })
    }
}

/// Drop blank lines and full-line `#` comments
fn retain_lines(contents: &str) -> Vec<(usize, String)> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(index, line)| (index + 1, line.to_string()))
        .collect()
}

/// Parse one retained config line
pub fn parse_line(line: &str, line_no: usize) -> EvPolicyEntry {
    let mut tokens = line
        .split('"')
        .map(str::trim)
        .filter(|token| !token.is_empty());

    let oid = tokens.next().unwrap_or_default().to_string();
    let filenames = tokens.map(str::to_string).collect();

    EvPolicyEntry::new(oid, filenames, line_no)
}

/// Parse a whole config text without touching the filesystem
pub fn parse_entries(contents: &str) -> Result<Vec<EvPolicyEntry>> {
    let entries: Vec<EvPolicyEntry> = retain_lines(contents)
        .iter()
        .map(|(line_no, line)| parse_line(line, *line_no))
        .collect();
    check_unique_oids(&entries)?;
    Ok(entries)
}

pub fn is_dotted_oid(oid: &str) -> bool {
    DOTTED_OID.is_match(oid)
}

fn check_unique_oids(entries: &[EvPolicyEntry]) -> Result<()> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for entry in entries {
        if let Some(first_line) = seen.insert(&entry.oid, entry.line) {
            return Err(PipelineError::DuplicateOid {
                oid: entry.oid.clone(),
                first_line,
                second_line: entry.line,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_quoted_oid_line() {
        let entry = parse_line(r#""1.2.3.4" "a.cer" "b.cer""#, 7);

        assert_eq!(entry.oid, "1.2.3.4");
        assert_eq!(entry.filenames, vec!["a.cer", "b.cer"]);
        assert_eq!(entry.line, 7);
    }

    #[test]
    fn test_parse_bare_oid_line() {
        let entry = parse_line("  2.16.840.1.114412.2.1   \"DigiCert EV.cer\"\t", 1);

        assert_eq!(entry.oid, "2.16.840.1.114412.2.1");
        assert_eq!(entry.filenames, vec!["DigiCert EV.cer"]);
    }

    #[test]
    fn test_line_without_files_yields_empty_list() {
        let entry = parse_line("1.2.3.4", 3);

        assert_eq!(entry.oid, "1.2.3.4");
        assert!(entry.filenames.is_empty());
    }

    #[test]
    fn test_comments_and_blank_lines_are_ignored() {
        let contents = "# header\n\n   # indented comment\n1.2.3 \"a.cer\"\n\t\n1.2.4 \"b.cer\"\n";
        let entries = parse_entries(contents).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].oid, "1.2.3");
        assert_eq!(entries[0].line, 4);
        assert_eq!(entries[1].oid, "1.2.4");
        assert_eq!(entries[1].line, 6);
    }

    #[test]
    fn test_duplicate_oid_is_rejected() {
        let contents = "1.2.3 \"a.cer\"\n1.2.4 \"b.cer\"\n1.2.3 \"c.cer\"\n";
        let err = parse_entries(contents).unwrap_err();

        match err {
            PipelineError::DuplicateOid {
                oid,
                first_line,
                second_line,
            } => {
                assert_eq!(oid, "1.2.3");
                assert_eq!(first_line, 1);
                assert_eq!(second_line, 3);
            }
            other => panic!("Expected DuplicateOid, got {other:?}"),
        }
    }

    #[test]
    fn test_dotted_oid_check() {
        assert!(is_dotted_oid("2.16.840.1.114412.2.1"));
        assert!(!is_dotted_oid("2"));
        assert!(!is_dotted_oid("1.2.3 a.cer"));
        assert!(!is_dotted_oid(""));
    }

    #[test]
    fn test_missing_config_is_config_error() {
        let loader = ConfigLoader::new("/nonexistent/evroots.config");
        let err = loader.entries().unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_sorted_entries_keep_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evroots.config");
        std::fs::write(
            &path,
            "2.16.840.1.114412.2.1 \"c.cer\" \"b.cer\"\n1.3.6.1.4.1.6334.1.100.1 \"a.cer\"\n",
        )
        .unwrap();

        let loader = ConfigLoader::new(&path);
        let source = loader.entries().unwrap();
        let sorted = loader.sorted_entries().unwrap();

        assert_eq!(source[0].oid, "2.16.840.1.114412.2.1");
        assert_eq!(sorted[0].oid, "1.3.6.1.4.1.6334.1.100.1");
        assert_eq!(sorted[1].filenames, vec!["c.cer", "b.cer"]);
    }

    #[test]
    fn test_retained_lines_are_memoized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evroots.config");
        std::fs::write(&path, "1.2.3 \"a.cer\"\n").unwrap();

        let loader = ConfigLoader::new(&path);
        assert_eq!(loader.entries().unwrap().len(), 1);

        // Later edits are not observed by the same loader
        std::fs::write(&path, "1.2.3 \"a.cer\"\n1.2.4 \"b.cer\"\n").unwrap();
        assert_eq!(loader.entries().unwrap().len(), 1);
        assert_eq!(ConfigLoader::new(&path).entries().unwrap().len(), 2);
    }
}
