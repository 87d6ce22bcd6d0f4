pub mod batch;
pub mod config;
pub mod extract;
pub mod features;
pub mod rows;
pub mod source;
pub mod store;

mod error;
pub use error::{PipelineError, Result};

pub use config::Config;
