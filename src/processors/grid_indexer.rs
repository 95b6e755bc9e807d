use crate::error::{ProcessingError, Result};
use crate::models::GridCell;
use crate::settings::{GridConfig, LongitudeScale};
use crate::utils::constants::{
    EQUATORIAL_MILES_PER_DEGREE_LONGITUDE, MIN_MILES_PER_DEGREE_LONGITUDE,
};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq)]
enum LongitudeCells {
    Fixed(f64),
    /// Cell width depends on the latitude band; holds the cell side in miles.
    PerBand { cell_side_miles: f64 },
}

/// Maps coordinates onto grid cells by floor division.
///
/// Coordinates are not range-checked: anything finite lands in some cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridIndexer {
    degrees_latitude: f64,
    longitude: LongitudeCells,
}

impl GridIndexer {
    pub fn new(degrees_latitude_per_cell: f64, degrees_longitude_per_cell: f64) -> Result<Self> {
        check_cell_size("latitude", degrees_latitude_per_cell)?;
        check_cell_size("longitude", degrees_longitude_per_cell)?;

        Ok(Self {
            degrees_latitude: degrees_latitude_per_cell,
            longitude: LongitudeCells::Fixed(degrees_longitude_per_cell),
        })
    }

    pub fn from_config(config: &GridConfig) -> Result<Self> {
        config.validate()?;

        let cell_side_miles = config.cell_side_miles();
        let degrees_latitude = config.degrees_latitude_per_cell();
        check_cell_size("latitude", degrees_latitude)?;

        let longitude = match config.longitude {
            LongitudeScale::Constant { miles_per_degree } => {
                LongitudeCells::Fixed(cell_side_miles / miles_per_degree)
            }
            LongitudeScale::ReferenceLatitude { latitude } => {
                LongitudeCells::Fixed(cell_side_miles / miles_per_degree_longitude(latitude))
            }
            LongitudeScale::LatitudeBand => LongitudeCells::PerBand { cell_side_miles },
        };

        if let LongitudeCells::Fixed(degrees) = longitude {
            check_cell_size("longitude", degrees)?;
        }

        Ok(Self {
            degrees_latitude,
            longitude,
        })
    }

    pub fn degrees_latitude_per_cell(&self) -> f64 {
        self.degrees_latitude
    }

    /// Cell width in degrees of longitude for the band holding `lat_index`.
    pub fn degrees_longitude_per_cell(&self, lat_index: i64) -> f64 {
        match self.longitude {
            LongitudeCells::Fixed(degrees) => degrees,
            LongitudeCells::PerBand { cell_side_miles } => {
                let band_centre = (lat_index as f64 + 0.5) * self.degrees_latitude;
                cell_side_miles / miles_per_degree_longitude(band_centre)
            }
        }
    }

    pub fn cell_for(&self, latitude: f64, longitude: f64) -> GridCell {
        let lat_index = floor_index(latitude, self.degrees_latitude);
        let lon_index = floor_index(longitude, self.degrees_longitude_per_cell(lat_index));
        GridCell::new(lat_index, lon_index)
    }
}

fn floor_index(coordinate: f64, cell_degrees: f64) -> i64 {
    (coordinate / cell_degrees).floor() as i64
}

fn miles_per_degree_longitude(latitude: f64) -> f64 {
    (EQUATORIAL_MILES_PER_DEGREE_LONGITUDE * latitude.to_radians().cos())
        .max(MIN_MILES_PER_DEGREE_LONGITUDE)
}

fn check_cell_size(axis: &str, degrees: f64) -> Result<()> {
    if degrees.is_finite() && degrees > 0.0 {
        Ok(())
    } else {
        Err(ProcessingError::Config(format!(
            "Degrees {} per cell must be positive, got {}",
            axis, degrees
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_for_positive_and_negative() {
        let indexer = GridIndexer::new(0.5, 0.25).unwrap();

        assert_eq!(indexer.cell_for(0.1, 0.1), GridCell::new(0, 0));
        assert_eq!(indexer.cell_for(1.2, 0.6), GridCell::new(2, 2));
        // Floor, not truncation toward zero
        assert_eq!(indexer.cell_for(-0.1, -0.1), GridCell::new(-1, -1));
        assert_eq!(indexer.cell_for(-1.2, -0.6), GridCell::new(-3, -3));
    }

    #[test]
    fn test_boundary_goes_to_larger_index() {
        let indexer = GridIndexer::new(0.32, 0.37).unwrap();
        let lat = 2.0 * indexer.degrees_latitude_per_cell();
        let lon = -2.0 * indexer.degrees_longitude_per_cell(0);

        assert_eq!(indexer.cell_for(lat, lon), GridCell::new(2, -2));
        assert_eq!(indexer.cell_for(0.0, 0.0), GridCell::new(0, 0));
        assert_eq!(indexer.cell_for(-0.0, -0.0), GridCell::new(0, 0));
    }

    #[test]
    fn test_out_of_range_coordinates_pass_through() {
        let indexer = GridIndexer::new(1.0, 1.0).unwrap();

        assert_eq!(indexer.cell_for(95.5, 200.5), GridCell::new(95, 200));
        assert_eq!(indexer.cell_for(-95.5, -200.5), GridCell::new(-96, -201));
    }

    #[test]
    fn test_rejects_non_positive_cell_sizes() {
        assert!(GridIndexer::new(0.0, 0.37).is_err());
        assert!(GridIndexer::new(0.32, -0.37).is_err());
        assert!(GridIndexer::new(f64::NAN, 0.37).is_err());
    }

    #[test]
    fn test_from_default_config() {
        let indexer = GridIndexer::from_config(&GridConfig::default()).unwrap();

        let expected_lat = 500f64.sqrt() / 69.0;
        let expected_lon = 500f64.sqrt() / 60.0;
        assert!((indexer.degrees_latitude_per_cell() - expected_lat).abs() < 1e-12);
        assert!((indexer.degrees_longitude_per_cell(120) - expected_lon).abs() < 1e-12);
        assert!((indexer.degrees_longitude_per_cell(-7) - expected_lon).abs() < 1e-12);
    }

    #[test]
    fn test_reference_latitude_uses_degrees() {
        let config = GridConfig {
            longitude: LongitudeScale::ReferenceLatitude { latitude: 40.0 },
            ..GridConfig::default()
        };
        let indexer = GridIndexer::from_config(&config).unwrap();

        // 69.172 * cos(40°) ≈ 52.99 miles per degree
        let expected = 500f64.sqrt() / (69.172 * 40f64.to_radians().cos());
        assert!((indexer.degrees_longitude_per_cell(0) - expected).abs() < 1e-12);
        assert!(indexer.degrees_longitude_per_cell(0) > 0.0);
        assert_eq!(
            indexer.degrees_longitude_per_cell(0),
            indexer.degrees_longitude_per_cell(200)
        );
    }

    #[test]
    fn test_latitude_band_is_consistent_within_band() {
        let config = GridConfig {
            longitude: LongitudeScale::LatitudeBand,
            ..GridConfig::default()
        };
        let indexer = GridIndexer::from_config(&config).unwrap();
        let lat_degrees = indexer.degrees_latitude_per_cell();

        // Two latitudes in the same band share a cell width
        let low = 123.1 * lat_degrees;
        let high = 123.9 * lat_degrees;
        let a = indexer.cell_for(low, -90.0);
        let b = indexer.cell_for(high, -90.0);
        assert_eq!(a.lat_index, b.lat_index);
        assert_eq!(a.lon_index, b.lon_index);

        // Cells widen toward the pole
        assert!(indexer.degrees_longitude_per_cell(200) > indexer.degrees_longitude_per_cell(10));

        // Near the poles the width stays finite
        assert!(indexer.degrees_longitude_per_cell(280).is_finite());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = GridConfig {
            miles_per_degree_latitude: 0.0,
            ..GridConfig::default()
        };
        assert!(GridIndexer::from_config(&config).is_err());
    }
}
