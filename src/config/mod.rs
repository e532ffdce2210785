//! Configuration module for querycraft.
//!
//! Loads render options and builder defaults from TOML.

mod settings;

pub use settings::{BuilderSettings, RenderSettings, Settings, SettingsError};
