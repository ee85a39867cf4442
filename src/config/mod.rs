pub mod loader;
pub mod settings;
pub mod types;

pub use loader::ConfigLoader;
pub use settings::{SettingsOverrides, DEFAULT_SETTINGS_FILE};
pub use types::{
    AssetSettings, DatabaseFormat, DatabaseSettings, DigestMode, EvPolicyEntry, KeychainSettings,
    PipelineSettings, Platform, ToolSettings,
};
