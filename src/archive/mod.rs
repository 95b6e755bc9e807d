pub mod multi_processor;
pub mod processor;
pub mod temp_manager;

pub use multi_processor::MultiArchiveProcessor;
pub use processor::{ArchiveProcessor, ArchiveReport};
pub use temp_manager::TempFileManager;

use crate::error::{ProcessingError, Result};
use crate::utils::constants::{TAR_EXTENSION, TAR_GZ_EXTENSIONS, ZIP_EXTENSION};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Tar,
    Zip,
}

impl ArchiveFormat {
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let lower = file_name.to_lowercase();

        if TAR_GZ_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            Some(ArchiveFormat::TarGz)
        } else if lower.ends_with(TAR_EXTENSION) {
            Some(ArchiveFormat::Tar)
        } else if lower.ends_with(ZIP_EXTENSION) {
            Some(ArchiveFormat::Zip)
        } else {
            None
        }
    }

    pub fn detect(path: &Path) -> Result<Self> {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(Self::from_file_name)
            .ok_or_else(|| {
                ProcessingError::InvalidFormat(format!(
                    "Unsupported archive format: {}",
                    path.display()
                ))
            })
    }
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::Tar => "tar",
            ArchiveFormat::Zip => "zip",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_format_from_name() {
        assert_eq!(
            ArchiveFormat::from_file_name("201701.pnt.tar.gz"),
            Some(ArchiveFormat::TarGz)
        );
        assert_eq!(
            ArchiveFormat::from_file_name("201701.PNT.TGZ"),
            Some(ArchiveFormat::TarGz)
        );
        assert_eq!(
            ArchiveFormat::from_file_name("201701.pnt.tar"),
            Some(ArchiveFormat::Tar)
        );
        assert_eq!(
            ArchiveFormat::from_file_name("201701.pnt.zip"),
            Some(ArchiveFormat::Zip)
        );
        assert_eq!(ArchiveFormat::from_file_name("readme.txt"), None);
    }

    #[test]
    fn test_detect_rejects_unknown() {
        assert!(ArchiveFormat::detect(Path::new("/data/readme.txt")).is_err());
        assert_eq!(
            ArchiveFormat::detect(Path::new("/data/189501.pnt.tar.gz")).unwrap(),
            ArchiveFormat::TarGz
        );
    }
}
