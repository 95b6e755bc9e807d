use crate::models::{AggregatedRecord, GridCell, Observation};
use crate::processors::GridIndexer;
use std::collections::HashMap;

/// Running sums for one cell.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CellAccumulator {
    pub count: usize,
    pub sum_latitude: f64,
    pub sum_longitude: f64,
    pub sum_value: f64,
}

impl CellAccumulator {
    pub fn add(&mut self, observation: &Observation) {
        self.count += 1;
        self.sum_latitude += observation.latitude;
        self.sum_longitude += observation.longitude;
        self.sum_value += observation.value;
    }

    /// `None` until at least one observation has been added.
    pub fn average(&self, cell: GridCell) -> Option<CellAverage> {
        if self.count == 0 {
            return None;
        }

        let n = self.count as f64;
        Some(CellAverage {
            cell,
            count: self.count,
            latitude: self.sum_latitude / n,
            longitude: self.sum_longitude / n,
            value: self.sum_value / n,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellAverage {
    pub cell: GridCell,
    pub count: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub value: f64,
}

impl CellAverage {
    pub fn into_record(self, year: i32, month: u32) -> AggregatedRecord {
        AggregatedRecord {
            year,
            month,
            latitude: self.latitude,
            longitude: self.longitude,
            value: self.value,
        }
    }
}

/// Folds one file's observations into per-cell averages.
///
/// Each instance belongs to a single source file; nothing is shared between
/// files.
#[derive(Debug, Clone)]
pub struct CellAggregator {
    indexer: GridIndexer,
    cells: HashMap<GridCell, CellAccumulator>,
    observations: usize,
}

impl CellAggregator {
    pub fn new(indexer: GridIndexer) -> Self {
        Self {
            indexer,
            cells: HashMap::new(),
            observations: 0,
        }
    }

    pub fn observe(&mut self, observation: &Observation) {
        let cell = self
            .indexer
            .cell_for(observation.latitude, observation.longitude);
        self.cells.entry(cell).or_default().add(observation);
        self.observations += 1;
    }

    /// Number of populated cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn observation_count(&self) -> usize {
        self.observations
    }

    /// Reduce every populated cell to its average, ordered by cell index.
    pub fn finish(self) -> impl Iterator<Item = CellAverage> {
        let mut averages: Vec<CellAverage> = self
            .cells
            .into_iter()
            .filter_map(|(cell, accumulator)| accumulator.average(cell))
            .collect();
        averages.sort_by_key(|average| average.cell);
        averages.into_iter()
    }
}

impl<'a> Extend<&'a Observation> for CellAggregator {
    fn extend<I: IntoIterator<Item = &'a Observation>>(&mut self, iter: I) {
        for observation in iter {
            self.observe(observation);
        }
    }
}

impl Extend<Observation> for CellAggregator {
    fn extend<I: IntoIterator<Item = Observation>>(&mut self, iter: I) {
        for observation in iter {
            self.observe(&observation);
        }
    }
}
