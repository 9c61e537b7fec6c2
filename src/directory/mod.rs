//! Template storage directories
//!
//! The live tree (`tree`), the server snapshot it is compared with
//! (`skeleton`), and the two algorithms that move state between them:
//! `reconcile` on save and `refresh` on load.

pub mod outline;
pub mod reconcile;
pub(crate) mod refresh;
pub mod skeleton;
pub mod tree;

#[cfg(test)]
pub(crate) mod testing;

pub use outline::DirectoryOutline;
pub use reconcile::SyncStats;
pub use skeleton::{RemoteConfiguration, RemoteDirectory};
pub use tree::{DirectoryId, DirectoryTree, TemplateStorageDirectory};
