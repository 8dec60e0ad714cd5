//! Journal entry store
//!
//! The journal's pages keep their entries in a single JSON document under
//! the `diarioEntries` key. The cache controller never reads it; the CLI
//! manages it directly.

mod entry;
mod store;

pub use entry::Entry;
pub use store::EntryStore;
