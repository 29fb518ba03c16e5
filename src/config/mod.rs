pub mod credentials;
pub mod loader;
pub mod settings;
pub mod types;
