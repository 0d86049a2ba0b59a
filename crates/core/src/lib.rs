pub mod channel;
pub mod config;
pub mod error;
pub mod types;

pub use channel::resolve_channel_id;
pub use config::{ActionConfig, DeployMode, RawInputs, Repository};
pub use error::{Error, Result};
pub use types::*;
