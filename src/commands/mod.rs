// Command handlers module
pub mod config;
pub mod version;
pub mod watch;

// Re-exports for cleaner imports
pub use version::execute as version;
pub use watch::execute as watch;
