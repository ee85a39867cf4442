//! Trust asset assembly, staging and signing

pub mod manifest;
pub mod signer;
pub mod stager;

pub use manifest::{AssetLayout, AssetManifest};
pub use signer::AssetSigner;
pub use stager::{AssetStager, StagedAsset};
