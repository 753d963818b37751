//! Configuration management

pub mod store;
pub mod version;

pub use store::Store;
pub use version::{check_version, VersionChange};
