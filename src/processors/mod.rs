pub mod batch_processor;
pub mod cell_aggregator;
pub mod file_processor;
pub mod grid_indexer;
pub mod summary;

pub use batch_processor::{BatchProcessor, FileOutcome};
pub use cell_aggregator::{CellAccumulator, CellAggregator, CellAverage};
pub use file_processor::{FileProcessor, ProcessedFile};
pub use grid_indexer::GridIndexer;
pub use summary::{FileFailure, RunSummary};
