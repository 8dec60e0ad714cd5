//! Versioned cache generations
//!
//! A generation is a named key-value cache of response snapshots. Its name is
//! derived from the deploy's version tag, so a new deploy always builds a new
//! generation beside the one currently serving requests.
//!
//! # Generation States
//!
//! | State | Serves fetches | Description |
//! |-------|----------------|-------------|
//! | Installing | no | Being filled from the asset manifest |
//! | Installed | no | Complete, waiting for old clients to close |
//! | Activating | no | Deleting stale generations, claiming clients |
//! | Activated | yes | The single active generation |
//! | Redundant | no | Failed install or superseded, scheduled for deletion |

mod disk;
pub mod entry;
mod memory;
mod storage;

pub use disk::DiskStorage;
pub use entry::{generation_name, validate_version, CachedEntry, MAX_VERSION_LEN};
pub use memory::MemoryStorage;
pub use storage::{Cache, CacheStorage};
