pub mod file_loader;

pub use file_loader::{load_local_files, pick_markup_document, read_markup_document};
