pub mod catalog;
pub mod helpers;
pub mod logger;
pub mod settings;
pub mod state;
pub mod types;
