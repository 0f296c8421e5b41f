pub mod profile;
pub mod settings;

pub use profile::{Profile, ProfileDefaults};
pub use settings::{ConfigFile, ConfigOverrides, UpdaterConfig, CONFIG_FILE};
