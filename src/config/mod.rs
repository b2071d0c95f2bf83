pub mod settings;

// Re-export the modules here for easy import elsewhere.
pub use settings::*;
