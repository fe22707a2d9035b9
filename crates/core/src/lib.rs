pub mod config;
pub mod error;
pub mod priority;

pub use config::Config;
pub use error::*;
pub use priority::*;
