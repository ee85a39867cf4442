use crate::config::{AssetSettings, Platform};
use std::path::{Path, PathBuf};

/// Top-level property list of every asset
pub const INFO_PLIST: &str = "Info.plist";

/// Asset version file; its `VersionNumber` is reported after staging
pub const ASSET_VERSION_PLIST: &str = "AssetVersion.plist";

const COMMON_DATA_FILES: &[&str] = &[
    "EVRoots.plist",
    "certsIndex.data",
    "certsTable.data",
    "manifest.data",
    "Allowlist.plist",
    "GrayListedKeys.plist",
    ASSET_VERSION_PLIST,
    "TrustedCTLogs.plist",
];

const IOS_DATA_FILES: &[&str] = &["AppleESCertificates.plist"];

const MACOS_DATA_FILES: &[&str] = &["AnchorCertificates.plist"];

/// Named files an asset input directory must provide
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetManifest {
    /// Files copied into `AssetData/<type>/`
    pub data_files: Vec<String>,
    /// File copied next to `AssetData/`
    pub info_plist: String,
}

impl AssetManifest {
    pub fn for_platform(platform: Platform, extra: &[String]) -> Self {
        let platform_files = match platform {
            Platform::Ios => IOS_DATA_FILES,
            Platform::Macos => MACOS_DATA_FILES,
        };

        let mut data_files: Vec<String> = COMMON_DATA_FILES
            .iter()
            .chain(platform_files)
            .map(|name| name.to_string())
            .collect();
        for name in extra {
            if !data_files.contains(name) {
                data_files.push(name.clone());
            }
        }

        Self {
            data_files,
            info_plist: INFO_PLIST.to_string(),
        }
    }

    pub fn from_settings(settings: &AssetSettings) -> Self {
        Self::for_platform(settings.platform, &settings.extra_required_files)
    }

    /// Every required file name, data files first
    pub fn required_files(&self) -> impl Iterator<Item = &str> {
        self.data_files
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.info_plist.as_str()))
    }

    /// Required files absent from `input_dir`, in manifest order
    pub fn missing_in(&self, input_dir: &Path) -> Vec<String> {
        self.required_files()
            .filter(|name| !input_dir.join(name).is_file())
            .map(str::to_string)
            .collect()
    }
}

/// Directory layout of an assembled asset
///
/// ```text
/// <tree>/Assets/<collection>/Info.plist
/// <tree>/Assets/<collection>/AssetData/<type>/<data files>
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLayout {
    pub tree_dir: PathBuf,
    pub collection: String,
    pub asset_type: String,
}

impl AssetLayout {
    pub fn from_settings(settings: &AssetSettings) -> Self {
        Self {
            tree_dir: settings.tree_dir.clone(),
            collection: settings.collection.clone(),
            asset_type: settings.asset_type.clone(),
        }
    }

    pub fn collection_dir(&self) -> PathBuf {
        self.tree_dir.join("Assets").join(&self.collection)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.collection_dir()
            .join("AssetData")
            .join(&self.asset_type)
    }

    pub fn info_plist(&self) -> PathBuf {
        self.collection_dir().join(INFO_PLIST)
    }
}
