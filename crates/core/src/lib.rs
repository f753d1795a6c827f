pub mod blocklist;
pub mod config;
pub mod error;
pub mod job;

pub use blocklist::BlockList;
pub use config::Config;
pub use error::*;
pub use job::*;
