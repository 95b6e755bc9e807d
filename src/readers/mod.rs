pub mod record_parser;
pub mod source_file;

pub use record_parser::{parse_record, PointFileReader};
pub use source_file::SourceFile;
