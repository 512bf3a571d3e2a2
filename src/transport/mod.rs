/// Filesystem discovery for file-backed sources.
pub mod fs;
