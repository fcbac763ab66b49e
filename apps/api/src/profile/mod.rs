pub mod customizer;
pub mod loader;
pub mod models;
