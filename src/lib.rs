pub mod asset;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod trust;

pub use error::{PipelineError, Result};
