pub mod export;
pub mod loader;
