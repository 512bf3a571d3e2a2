/// Filesystem-backed CSV/JSON source implementation.
pub mod file_source;
