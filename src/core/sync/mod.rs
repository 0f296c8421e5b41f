pub mod reconciler;

pub use reconciler::{ensure_dir_tree, Reconciler, SyncEvent, SyncReport};
