pub mod controller;
pub mod types;

pub use controller::CatalogController;
pub use types::{CatalogMessage, CatalogState};
