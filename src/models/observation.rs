use serde::{Deserialize, Serialize};

/// A single point measurement decoded from one line of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub latitude: f64,
    pub longitude: f64,
    pub value: f64,
}

impl Observation {
    pub fn new(latitude: f64, longitude: f64, value: f64) -> Self {
        Self {
            latitude,
            longitude,
            value,
        }
    }
}

/// Identity of a grid cell: floor-divided latitude and longitude indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    pub lat_index: i64,
    pub lon_index: i64,
}

impl GridCell {
    pub fn new(lat_index: i64, lon_index: i64) -> Self {
        Self {
            lat_index,
            lon_index,
        }
    }
}

impl std::fmt::Display for GridCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.lat_index, self.lon_index)
    }
}

/// One output row: the averaged position and value of a populated cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRecord {
    pub year: i32,
    pub month: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub value: f64,
}

impl AggregatedRecord {
    /// Render as the `Year,Month,Latitude,Longitude,Value` column set.
    pub fn to_fields(&self) -> [String; 5] {
        [
            self.year.to_string(),
            self.month.to_string(),
            format!("{:.6}", self.latitude),
            format!("{:.6}", self.longitude),
            format!("{:.2}", self.value),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_field_formatting() {
        let record = AggregatedRecord {
            year: 2017,
            month: 3,
            latitude: 40.11,
            longitude: -90.19,
            value: 6.0,
        };

        assert_eq!(
            record.to_fields(),
            ["2017", "3", "40.110000", "-90.190000", "6.00"].map(String::from)
        );
    }

    #[test]
    fn test_missing_value_sentinel_passes_through() {
        let record = AggregatedRecord {
            year: 1895,
            month: 12,
            latitude: 24.5625,
            longitude: -81.8125,
            value: -999.99,
        };

        let fields = record.to_fields();
        assert_eq!(fields[1], "12");
        assert_eq!(fields[4], "-999.99");
    }

    #[test]
    fn test_grid_cell_ordering() {
        let mut cells = vec![
            GridCell::new(1, -3),
            GridCell::new(-2, 5),
            GridCell::new(1, -4),
        ];
        cells.sort();
        assert_eq!(
            cells,
            vec![GridCell::new(-2, 5), GridCell::new(1, -4), GridCell::new(1, -3)]
        );
        assert_eq!(GridCell::new(-2, 5).to_string(), "(-2, 5)");
    }
}
