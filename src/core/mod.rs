pub mod config;
pub mod context;
pub mod errors;
pub mod utils;

pub use config::{
    AssetFiles,
    BundleFiles,
    KikuConfig,
};
pub use context::SessionContext;
pub use errors::KikuError;
