//! Feature engineering over raw trip feature rows.
//!
//! The input is a batch of one-or-more pre-engineering rows; the output is
//! the same batch augmented with interaction and derived columns, ready
//! for the trained model. Column names, category string forms, and the
//! categorical column set are part of the model contract and must not
//! drift.

use serde::Serialize;

use crate::annotations::RoadType;
use crate::temporal::{Lighting, TimeOfDay};
use crate::weather::Weather;

/// Guards the speed/curvature ratio against perfectly straight routes.
const CURVATURE_EPSILON: f64 = 1e-6;

/// Quantile breakpoints for curvature binning.
const CURVATURE_QUANTILES: [f64; 4] = [0.0, 0.25, 0.75, 1.0];

const CURVATURE_BIN_LABELS: [&str; 3] = ["low", "medium", "high"];

/// Fewer rows than this and quantile edges are too noisy to bin on.
const MIN_ROWS_FOR_BINNING: usize = 6;

/// Columns the model treats as categorical.
pub const CATEGORICAL_FEATURES: [&str; 8] = [
    "road_type",
    "lighting",
    "weather",
    "time_of_day",
    "holiday_x_lighting",
    "weather_lighting",
    "curvature_bin",
    "speed_x_curvature_bin",
];

/// Raw (pre-engineering) feature row, one per trip query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    pub road_type: RoadType,
    pub num_lanes: u32,
    pub curvature: f64,
    pub speed_limit: f64,
    pub lighting: Lighting,
    pub weather: Weather,
    pub road_signs_present: bool,
    pub public_road: bool,
    pub time_of_day: TimeOfDay,
    pub holiday: bool,
    pub school_season: bool,
    /// Known only for historical training rows; zeroed during engineering
    /// either way.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_reported_accidents: Option<f64>,
}

/// Fully engineered row. Boolean columns are already cast to 0/1 and every
/// categorical column is rendered to its final string form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineeredRow {
    pub road_type: String,
    pub num_lanes: u32,
    pub curvature: f64,
    pub speed_limit: f64,
    pub lighting: String,
    pub weather: String,
    pub road_signs_present: i64,
    pub public_road: i64,
    pub time_of_day: String,
    pub holiday: i64,
    pub school_season: i64,
    pub num_reported_accidents: f64,
    pub speed_curvature_ratio: f64,
    pub weather_lighting: String,
    pub curvature_bin: String,
    pub curvature_sq: f64,
    pub speed_limit_sq: f64,
    pub speed_x_curvature_bin: String,
    pub holiday_x_lighting: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineeredTable {
    pub rows: Vec<EngineeredRow>,
}

impl EngineeredTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Apply the engineering steps, in order, to a batch of raw rows.
///
/// `drop_duplicates` removes exact-duplicate rows first and is meant for
/// training-time batches; inference passes `false` so a single-row query
/// is never silently emptied.
pub fn engineer(rows: &[FeatureRow], drop_duplicates: bool) -> EngineeredTable {
    let mut working: Vec<&FeatureRow> = Vec::with_capacity(rows.len());
    for row in rows {
        if drop_duplicates && working.iter().any(|kept| *kept == row) {
            continue;
        }
        working.push(row);
    }

    let bins = curvature_bins(&working);

    let rows = working
        .into_iter()
        .zip(bins)
        .map(|(row, bin)| engineer_row(row, bin))
        .collect();

    EngineeredTable { rows }
}

fn engineer_row(row: &FeatureRow, curvature_bin: &'static str) -> EngineeredRow {
    let lighting = row.lighting.as_str();
    let weather = row.weather.as_str();
    // Capitalized boolean rendering matches the training pipeline's
    // string form for this category.
    let holiday = if row.holiday { "True" } else { "False" };

    EngineeredRow {
        road_type: row.road_type.as_str().to_string(),
        num_lanes: row.num_lanes,
        curvature: row.curvature,
        speed_limit: row.speed_limit,
        lighting: lighting.to_string(),
        weather: weather.to_string(),
        road_signs_present: row.road_signs_present as i64,
        public_road: row.public_road as i64,
        time_of_day: row.time_of_day.as_str().to_string(),
        holiday: row.holiday as i64,
        school_season: row.school_season as i64,
        // Not derivable at inference time; forced to zero so training and
        // serving agree.
        num_reported_accidents: 0.0,
        speed_curvature_ratio: row.speed_limit / (row.curvature + CURVATURE_EPSILON),
        weather_lighting: format!("{weather}_{lighting}"),
        curvature_bin: curvature_bin.to_string(),
        curvature_sq: row.curvature * row.curvature,
        speed_limit_sq: row.speed_limit * row.speed_limit,
        speed_x_curvature_bin: format!("{}_{curvature_bin}", row.speed_limit),
        holiday_x_lighting: format!("{holiday}_{lighting}"),
    }
}

/// Quantile-bin the batch's curvature values into low/medium/high.
///
/// Degenerate batches fall back to the middle label for every row: fewer
/// than six rows, fewer than two distinct values, or quantile edges that
/// collapse onto each other after deduplication.
fn curvature_bins(rows: &[&FeatureRow]) -> Vec<&'static str> {
    let mid = CURVATURE_BIN_LABELS[CURVATURE_BIN_LABELS.len() / 2];
    let values: Vec<f64> = rows.iter().map(|row| row.curvature).collect();

    let mut sorted = values.clone();
    sorted.sort_by(f64::total_cmp);
    let distinct = {
        let mut d = sorted.clone();
        d.dedup();
        d.len()
    };
    if values.len() < MIN_ROWS_FOR_BINNING || distinct < 2 {
        return vec![mid; values.len()];
    }

    let mut edges: Vec<f64> = CURVATURE_QUANTILES
        .iter()
        .map(|&q| quantile(&sorted, q))
        .collect();
    edges.dedup();
    if edges.len() != CURVATURE_QUANTILES.len() {
        return vec![mid; values.len()];
    }

    values
        .iter()
        .map(|&value| {
            if value <= edges[1] {
                CURVATURE_BIN_LABELS[0]
            } else if value <= edges[2] {
                CURVATURE_BIN_LABELS[1]
            } else {
                CURVATURE_BIN_LABELS[2]
            }
        })
        .collect()
}

/// Linear-interpolation quantile over pre-sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        sorted[lower] + (pos - pos.floor()) * (sorted[upper] - sorted[lower])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(curvature: f64, speed_limit: f64) -> FeatureRow {
        FeatureRow {
            road_type: RoadType::Urban,
            num_lanes: 2,
            curvature,
            speed_limit,
            lighting: Lighting::Daylight,
            weather: Weather::Clear,
            road_signs_present: true,
            public_road: true,
            time_of_day: TimeOfDay::Morning,
            holiday: false,
            school_season: true,
            num_reported_accidents: None,
        }
    }

    #[test]
    fn single_row_engineering_end_to_end() {
        let mut raw = row(0.25, 43.5);
        raw.holiday = true;
        let table = engineer(std::slice::from_ref(&raw), false);
        assert_eq!(table.len(), 1);

        let engineered = &table.rows[0];
        assert_eq!(engineered.num_reported_accidents, 0.0);
        assert!((engineered.speed_curvature_ratio - 43.5 / (0.25 + 1e-6)).abs() < 1e-9);
        assert_eq!(engineered.weather_lighting, "clear_daylight");
        assert_eq!(engineered.curvature_bin, "medium");
        assert_eq!(engineered.curvature_sq, 0.0625);
        assert_eq!(engineered.speed_limit_sq, 43.5 * 43.5);
        assert_eq!(engineered.speed_x_curvature_bin, "43.5_medium");
        assert_eq!(engineered.holiday_x_lighting, "True_daylight");
        assert_eq!(engineered.road_signs_present, 1);
        assert_eq!(engineered.public_road, 1);
        assert_eq!(engineered.holiday, 1);
        assert_eq!(engineered.school_season, 1);
    }

    #[test]
    fn zero_curvature_ratio_stays_finite() {
        let table = engineer(&[row(0.0, 60.0)], false);
        assert!(table.rows[0].speed_curvature_ratio.is_finite());
        assert!((table.rows[0].speed_curvature_ratio - 60.0 / 1e-6).abs() < 1.0);
    }

    #[test]
    fn identical_curvature_always_bins_medium() {
        let rows: Vec<FeatureRow> = (0..10).map(|_| row(0.4, 30.0)).collect();
        let table = engineer(&rows, false);
        assert!(table.rows.iter().all(|r| r.curvature_bin == "medium"));
    }

    #[test]
    fn small_batches_always_bin_medium() {
        let rows: Vec<FeatureRow> = (0..5).map(|i| row(i as f64 / 10.0, 30.0)).collect();
        let table = engineer(&rows, false);
        assert!(table.rows.iter().all(|r| r.curvature_bin == "medium"));
    }

    #[test]
    fn quantile_binning_splits_a_spread_batch() {
        let curvatures = [0.0, 0.1, 0.2, 0.5, 0.8, 0.9, 1.0];
        let rows: Vec<FeatureRow> = curvatures.iter().map(|&c| row(c, 30.0)).collect();
        let table = engineer(&rows, false);
        let bins: Vec<&str> = table.rows.iter().map(|r| r.curvature_bin.as_str()).collect();

        // Edges at the 25th and 75th percentiles of [0, 0.1, 0.2, 0.5,
        // 0.8, 0.9, 1.0] are 0.15 and 0.85.
        assert_eq!(bins, vec!["low", "low", "medium", "medium", "medium", "high", "high"]);
    }

    #[test]
    fn duplicate_rows_drop_only_when_asked() {
        let rows = vec![row(0.3, 30.0), row(0.3, 30.0), row(0.5, 40.0)];
        assert_eq!(engineer(&rows, true).len(), 2);
        assert_eq!(engineer(&rows, false).len(), 3);
    }

    #[test]
    fn engineering_is_deterministic() {
        let rows: Vec<FeatureRow> = (0..8).map(|i| row(i as f64 / 8.0, 25.0 + i as f64)).collect();
        let first = engineer(&rows, false);
        let second = engineer(&rows, false);
        assert_eq!(first, second);
    }

    #[test]
    fn categorical_set_is_fixed() {
        assert_eq!(
            CATEGORICAL_FEATURES,
            [
                "road_type",
                "lighting",
                "weather",
                "time_of_day",
                "holiday_x_lighting",
                "weather_lighting",
                "curvature_bin",
                "speed_x_curvature_bin",
            ]
        );
    }
}
