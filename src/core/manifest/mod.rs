pub mod entry;
pub mod remote;

pub use entry::{parse_manifest, ManifestEntry};
pub use remote::{validate_channel, UpdateServer};
