pub mod config;
pub mod error;
pub mod record;

pub use config::VigilConfig;
pub use error::VigilError;
pub use record::{RequestRecord, UNKNOWN};
