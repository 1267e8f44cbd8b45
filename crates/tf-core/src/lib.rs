//! TokenFlow core: routing data model, provider registry, configuration and errors.

pub mod config;
pub mod error;
pub mod registry;
pub mod types;
pub mod wire;

pub use config::TfConfig;
pub use error::{Result, TfError};
pub use registry::ProviderRegistry;
pub use types::*;
