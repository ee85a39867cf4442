use crate::config::EvPolicyEntry;
use crate::io::paths::PathUtils;
use crate::{PipelineError, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The directory of DER root certificates referenced by the EV config
#[derive(Debug, Clone)]
pub struct CertificateRepository {
    roots_dir: PathBuf,
}

impl CertificateRepository {
    /// The roots directory is made absolute against the current directory
    pub fn new<P: AsRef<Path>>(roots_dir: P) -> Result<Self> {
        let roots_dir = roots_dir.as_ref();
        let roots_dir = if roots_dir.is_absolute() {
            roots_dir.to_path_buf()
        } else {
            std::env::current_dir()?.join(roots_dir)
        };
        Ok(Self { roots_dir })
    }

    pub fn roots_dir(&self) -> &Path {
        &self.roots_dir
    }

    /// Resolve a config filename to an existing file under the roots directory
    pub fn resolve(&self, filename: &str) -> Result<PathBuf> {
        let relative = Path::new(filename);
        if relative.is_absolute() || !PathUtils::is_safe_path(relative) {
            return Err(PipelineError::Config(format!(
                "Certificate filename '{filename}' must be relative to the roots directory"
            )));
        }

        let path = self.roots_dir.join(relative);
        if !path.is_file() {
            return Err(PipelineError::MissingCertificate {
                filename: filename.to_string(),
                path,
            });
        }
        Ok(path)
    }

    /// Resolve every filename of every entry, failing on the first missing one
    pub fn resolve_all(&self, entries: &[EvPolicyEntry]) -> Result<Vec<PathBuf>> {
        entries
            .iter()
            .flat_map(|entry| entry.filenames.iter())
            .map(|filename| self.resolve(filename))
            .collect()
    }

    /// Files in the roots directory that no entry references, sorted
    pub fn unreferenced(&self, entries: &[EvPolicyEntry]) -> Result<Vec<String>> {
        let referenced: BTreeSet<PathBuf> = entries
            .iter()
            .flat_map(|entry| entry.filenames.iter())
            .map(PathBuf::from)
            .collect();

        let mut unreferenced = Vec::new();
        for dir_entry in WalkDir::new(&self.roots_dir).sort_by_file_name() {
            let dir_entry = dir_entry.map_err(|e| {
                PipelineError::Config(format!(
                    "Failed to scan roots directory {}: {}",
                    self.roots_dir.display(),
                    e
                ))
            })?;
            if !dir_entry.file_type().is_file() {
                continue;
            }
            let relative = dir_entry
                .path()
                .strip_prefix(&self.roots_dir)
                .unwrap_or(dir_entry.path())
                .to_path_buf();
            if !referenced.contains(&relative) {
                unreferenced.push(relative.to_string_lossy().into_owned());
            }
        }
        Ok(unreferenced)
    }
}
