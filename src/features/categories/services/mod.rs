mod category_service;

pub use category_service::{apply_update, CategoryService};
