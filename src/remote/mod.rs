pub mod repository;

pub use repository::{parse_archive_links, RemoteArchive, RemoteRepository};
