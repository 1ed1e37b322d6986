pub mod settings;
pub mod loader;

pub use settings::*;
pub use loader::{load_settings, to_toml};
