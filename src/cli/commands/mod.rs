//! CLI command implementations

pub mod cache;
pub mod config;
pub mod entry;
pub mod fetch;
pub mod install;
pub mod manifest;
pub mod status;

pub use cache::execute as cache;
pub use config::execute as config;
pub use entry::execute as entry;
pub use fetch::execute as fetch;
pub use install::execute as install;
pub use manifest::execute as manifest;
pub use status::execute as status;
