pub mod csv_writer;

pub use csv_writer::{output_paths, DatasetWriters};
