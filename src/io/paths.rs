use crate::config::PipelineSettings;
use crate::Result;
use std::path::{Component, Path, PathBuf};

/// Output locations of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPaths {
    /// Output directory (keychain and trust database live here)
    pub output_dir: PathBuf,
    /// Phase 1 keychain
    pub keychain: PathBuf,
    /// Phase 2 trust database
    pub trust_database: PathBuf,
}

impl BuildPaths {
    pub fn from_settings(settings: &PipelineSettings) -> Self {
        let output_dir = settings.output_dir.clone();
        Self {
            keychain: output_dir.join(&settings.keychain.name),
            trust_database: output_dir.join(&settings.database.name),
            output_dir,
        }
    }

    /// Scratch file the trust database is serialized to before it is moved
    /// into place
    pub fn trust_database_scratch(&self) -> PathBuf {
        PathUtils::scratch_path(&self.trust_database)
    }

    /// Ensure the output directory exists
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }
}

/// Utilities for working with paths
pub struct PathUtils;

impl PathUtils {
    /// Check if path is safe (no traversal attacks)
    pub fn is_safe_path(path: &Path) -> bool {
        !path
            .components()
            .any(|c| matches!(c, Component::ParentDir))
    }

    /// Sibling path with a `.tmp` suffix appended to the file name
    pub fn scratch_path(path: &Path) -> PathBuf {
        let mut name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        path.with_file_name(name)
    }

    /// Remove a file if it exists
    pub fn remove_if_exists(path: &Path) -> Result<bool> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_paths_from_settings() {
        let settings = PipelineSettings {
            output_dir: PathBuf::from("/tmp/evtrust-out"),
            ..Default::default()
        };
        let paths = BuildPaths::from_settings(&settings);

        assert_eq!(paths.keychain, PathBuf::from("/tmp/evtrust-out/EVRoots.keychain"));
        assert_eq!(
            paths.trust_database,
            PathBuf::from("/tmp/evtrust-out/EVRoots.plist")
        );
        assert_eq!(
            paths.trust_database_scratch(),
            PathBuf::from("/tmp/evtrust-out/EVRoots.plist.tmp")
        );
    }

    #[test]
    fn test_path_utils_safety() {
        assert!(PathUtils::is_safe_path(Path::new("safe/path/file.cer")));
        assert!(!PathUtils::is_safe_path(Path::new("../../../etc/passwd")));
        assert!(!PathUtils::is_safe_path(Path::new("safe/../unsafe/file.cer")));
    }

    #[test]
    fn test_remove_if_exists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.plist");

        assert!(!PathUtils::remove_if_exists(&path).unwrap());
        std::fs::write(&path, b"x").unwrap();
        assert!(PathUtils::remove_if_exists(&path).unwrap());
        assert!(!path.exists());
    }
}
