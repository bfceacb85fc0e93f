pub mod archive;

pub use archive::{ArchiveFormat, HttpArchiveFetcher};
