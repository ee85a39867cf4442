use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One retained line of the EV policy configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvPolicyEntry {
    /// EV policy OID, e.g. `2.16.840.1.114412.2.1`
    pub oid: String,
    /// Certificate filenames, relative to the roots directory, in line order
    pub filenames: Vec<String>,
    /// 1-based line number in the source file
    pub line: usize,
}

impl EvPolicyEntry {
    pub fn new(oid: impl Into<String>, filenames: Vec<String>, line: usize) -> Self {
        Self {
            oid: oid.into(),
            filenames,
            line,
        }
    }
}

// =============================================================================
// Pipeline settings (evtrust.yaml)
// =============================================================================

/// How certificate fingerprints are computed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DigestMode {
    /// Run `openssl x509 -fingerprint -sha1` and parse its output
    #[default]
    External,
    /// Hash the DER bytes in-process
    Native,
}

/// On-disk encoding of the trust database
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseFormat {
    #[default]
    Xml,
    Binary,
}

/// Target platform of the trust asset; selects the required input manifest
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Macos,
    Ios,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Macos => write!(f, "macos"),
            Platform::Ios => write!(f, "ios"),
        }
    }
}

/// Locations of the external tools and the limit applied to each call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default = "default_security")]
    pub security: PathBuf,

    #[serde(default = "default_openssl")]
    pub openssl: PathBuf,

    #[serde(default = "default_assettool")]
    pub assettool: PathBuf,

    /// Per-invocation timeout
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_security() -> PathBuf {
    PathBuf::from("/usr/bin/security")
}

fn default_openssl() -> PathBuf {
    PathBuf::from("/usr/bin/openssl")
}

fn default_assettool() -> PathBuf {
    PathBuf::from("assettool")
}

fn default_timeout() -> u64 {
    120
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            security: default_security(),
            openssl: default_openssl(),
            assettool: default_assettool(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Phase 1 settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeychainSettings {
    /// Keychain file name inside the output directory
    #[serde(default = "default_keychain_name")]
    pub name: String,

    /// Password given to `create-keychain`
    #[serde(default)]
    pub password: String,

    /// Exit status of `add-certificates` meaning the certificate is already present
    #[serde(default = "default_already_present_exit_code")]
    pub already_present_exit_code: i32,

    /// Snapshot the user keychain search list and restore it on verification failure
    #[serde(default = "default_true")]
    pub manage_search_list: bool,
}

fn default_keychain_name() -> String {
    "EVRoots.keychain".to_string()
}

// errSecDuplicateItem (-25299) truncated to an exit status byte
fn default_already_present_exit_code() -> i32 {
    45
}

fn default_true() -> bool {
    true
}

impl Default for KeychainSettings {
    fn default() -> Self {
        Self {
            name: default_keychain_name(),
            password: String::new(),
            already_present_exit_code: default_already_present_exit_code(),
            manage_search_list: true,
        }
    }
}

/// Phase 2 settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Trust database file name inside the output directory
    #[serde(default = "default_database_name")]
    pub name: String,

    #[serde(default)]
    pub format: DatabaseFormat,

    #[serde(default)]
    pub digest: DigestMode,
}

fn default_database_name() -> String {
    "EVRoots.plist".to_string()
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            name: default_database_name(),
            format: DatabaseFormat::default(),
            digest: DigestMode::default(),
        }
    }
}

/// Asset staging and signing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetSettings {
    #[serde(default)]
    pub platform: Platform,

    /// Upstream directory holding the pre-built asset inputs
    #[serde(default = "default_asset_input_dir")]
    pub input_dir: PathBuf,

    /// Root of the assembled asset tree
    #[serde(default = "default_asset_tree_dir")]
    pub tree_dir: PathBuf,

    /// Scratch directory handed to `assettool`
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,

    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(default = "default_asset_type")]
    pub asset_type: String,

    /// Files required in addition to the platform manifest
    #[serde(default)]
    pub extra_required_files: Vec<String>,
}

fn default_asset_input_dir() -> PathBuf {
    PathBuf::from("build/asset-input")
}

fn default_asset_tree_dir() -> PathBuf {
    PathBuf::from("build/asset")
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("build/staging")
}

fn default_collection() -> String {
    "com_apple_MobileAsset_PKITrustSupplementals".to_string()
}

fn default_asset_type() -> String {
    "PKITrustSupplementals".to_string()
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            platform: Platform::default(),
            input_dir: default_asset_input_dir(),
            tree_dir: default_asset_tree_dir(),
            staging_dir: default_staging_dir(),
            collection: default_collection(),
            asset_type: default_asset_type(),
            extra_required_files: Vec::new(),
        }
    }
}

/// Root configuration for one pipeline run
///
/// Built once (file + command-line overrides) and shared read-only with every
/// component; nothing reads the process environment after this point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// EV policy configuration file
    #[serde(default = "default_ev_config")]
    pub ev_config: PathBuf,

    /// Directory of DER root certificates named by the EV config
    #[serde(default = "default_roots_dir")]
    pub roots_dir: PathBuf,

    /// Directory receiving the keychain and the trust database
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub tools: ToolSettings,

    #[serde(default)]
    pub keychain: KeychainSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub asset: AssetSettings,
}

fn default_ev_config() -> PathBuf {
    PathBuf::from("config/evroots.config")
}

fn default_roots_dir() -> PathBuf {
    PathBuf::from("roots")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("build")
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            ev_config: default_ev_config(),
            roots_dir: default_roots_dir(),
            output_dir: default_output_dir(),
            tools: ToolSettings::default(),
            keychain: KeychainSettings::default(),
            database: DatabaseSettings::default(),
            asset: AssetSettings::default(),
        }
    }
}
