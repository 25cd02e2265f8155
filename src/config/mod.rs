// src/config/mod.rs
pub mod profile;
pub mod settings;

pub use profile::WatcherProfile;
pub use settings::Settings;
