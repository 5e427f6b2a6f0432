//! Freedraw payload.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Pressure recorded when the input device reports none.
pub const DEFAULT_PRESSURE: f64 = 0.5;

/// Samples of a freehand stroke, relative to the element origin.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FreedrawData {
    pub points: Vec<Point>,
    /// One pressure value per sample.
    #[serde(default)]
    pub pressures: Vec<f64>,
}

impl FreedrawData {
    /// Build from samples, padding or truncating pressures to match.
    pub fn new(points: Vec<Point>, mut pressures: Vec<f64>) -> Self {
        pressures.resize(points.len(), DEFAULT_PRESSURE);
        Self { points, pressures }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pressures_padded() {
        let data = FreedrawData::new(vec![Point::ZERO, Point::new(1.0, 1.0)], vec![0.9]);
        assert_eq!(data.pressures, vec![0.9, DEFAULT_PRESSURE]);
    }

    #[test]
    fn test_repeated_samples_are_kept() {
        let p = Point::new(4.0, 4.0);
        let data = FreedrawData::new(vec![p, p, p], vec![0.1, 0.4, 0.8]);
        assert_eq!(data.points.len(), 3);
        assert_eq!(data.pressures, vec![0.1, 0.4, 0.8]);
    }
}
