pub mod measurement;
pub mod observation;

pub use measurement::MeasurementType;
pub use observation::{AggregatedRecord, GridCell, Observation};
