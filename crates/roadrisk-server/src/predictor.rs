//! Gradient-boosted-tree predictor backed by a gbdt model artifact.
//!
//! The model ships with a `meta.json` companion describing the feature
//! order and, for every categorical column, the category vocabulary the
//! model was trained with. Encoding fails loudly on any column or
//! category the meta does not know; a drifted schema must never produce a
//! silent score.

use std::collections::HashMap;
use std::fs;

use anyhow::Context;
use gbdt::decision_tree::{Data, DataVec, ValueType};
use gbdt::gradient_boost::GBDT;
use serde::Deserialize;

use roadrisk_core::{EngineeredRow, EngineeredTable, Predictor, RiskError, CATEGORICAL_FEATURES};

#[derive(Debug, Clone, Deserialize)]
pub struct ModelMeta {
    /// Column order the model was trained with.
    pub feature_order: Vec<String>,
    /// Category string -> code position, per categorical column.
    pub categories: HashMap<String, Vec<String>>,
}

/// Maps engineered rows onto the model's numeric feature layout.
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    meta: ModelMeta,
}

enum ColumnValue<'a> {
    Number(f64),
    Text(&'a str),
}

impl FeatureEncoder {
    pub fn new(meta: ModelMeta) -> anyhow::Result<Self> {
        for column in CATEGORICAL_FEATURES {
            if meta.feature_order.iter().any(|name| name == column)
                && !meta.categories.contains_key(column)
            {
                anyhow::bail!("model meta misses the vocabulary for categorical column {column}");
            }
        }
        Ok(Self { meta })
    }

    pub fn feature_count(&self) -> usize {
        self.meta.feature_order.len()
    }

    pub fn encode_row(&self, row: &EngineeredRow) -> Result<Vec<ValueType>, RiskError> {
        self.meta
            .feature_order
            .iter()
            .map(|name| self.encode_column(row, name))
            .collect()
    }

    fn encode_column(&self, row: &EngineeredRow, name: &str) -> Result<ValueType, RiskError> {
        match column_value(row, name) {
            Some(ColumnValue::Number(value)) => Ok(value as ValueType),
            Some(ColumnValue::Text(value)) => {
                let vocabulary = self.meta.categories.get(name).ok_or_else(|| {
                    RiskError::ModelSchema(format!("no vocabulary for categorical column {name}"))
                })?;
                vocabulary
                    .iter()
                    .position(|category| category == value)
                    .map(|code| code as ValueType)
                    .ok_or_else(|| {
                        RiskError::ModelSchema(format!(
                            "unknown category {value:?} for column {name}"
                        ))
                    })
            }
            None => Err(RiskError::ModelSchema(format!(
                "unknown feature column {name}"
            ))),
        }
    }
}

fn column_value<'a>(row: &'a EngineeredRow, name: &str) -> Option<ColumnValue<'a>> {
    match name {
        "road_type" => Some(ColumnValue::Text(&row.road_type)),
        "num_lanes" => Some(ColumnValue::Number(row.num_lanes as f64)),
        "curvature" => Some(ColumnValue::Number(row.curvature)),
        "speed_limit" => Some(ColumnValue::Number(row.speed_limit)),
        "lighting" => Some(ColumnValue::Text(&row.lighting)),
        "weather" => Some(ColumnValue::Text(&row.weather)),
        "road_signs_present" => Some(ColumnValue::Number(row.road_signs_present as f64)),
        "public_road" => Some(ColumnValue::Number(row.public_road as f64)),
        "time_of_day" => Some(ColumnValue::Text(&row.time_of_day)),
        "holiday" => Some(ColumnValue::Number(row.holiday as f64)),
        "school_season" => Some(ColumnValue::Number(row.school_season as f64)),
        "num_reported_accidents" => Some(ColumnValue::Number(row.num_reported_accidents)),
        "speed_curvature_ratio" => Some(ColumnValue::Number(row.speed_curvature_ratio)),
        "weather_lighting" => Some(ColumnValue::Text(&row.weather_lighting)),
        "curvature_bin" => Some(ColumnValue::Text(&row.curvature_bin)),
        "curvature_sq" => Some(ColumnValue::Number(row.curvature_sq)),
        "speed_limit_sq" => Some(ColumnValue::Number(row.speed_limit_sq)),
        "speed_x_curvature_bin" => Some(ColumnValue::Text(&row.speed_x_curvature_bin)),
        "holiday_x_lighting" => Some(ColumnValue::Text(&row.holiday_x_lighting)),
        _ => None,
    }
}

/// The trained risk model plus its feature layout.
pub struct GbdtPredictor {
    model: GBDT,
    encoder: FeatureEncoder,
}

impl GbdtPredictor {
    /// Load the model artifact and its meta file. Called once at startup,
    /// before the listener binds; the instance is shared read-only.
    pub fn load(model_path: &str, meta_path: &str) -> anyhow::Result<Self> {
        let meta_raw = fs::read_to_string(meta_path)
            .with_context(|| format!("failed to read model meta at {meta_path}"))?;
        let meta: ModelMeta = serde_json::from_str(&meta_raw)
            .with_context(|| format!("failed to parse model meta at {meta_path}"))?;
        let encoder = FeatureEncoder::new(meta)?;

        let model = GBDT::load_model(model_path)
            .map_err(|err| anyhow::anyhow!("failed to load model at {model_path}: {err}"))?;

        tracing::info!(
            model_path,
            meta_path,
            features = encoder.feature_count(),
            "risk model loaded"
        );
        Ok(Self { model, encoder })
    }
}

impl Predictor for GbdtPredictor {
    fn predict(&self, table: &EngineeredTable) -> Result<Vec<f64>, RiskError> {
        let data: DataVec = table
            .rows
            .iter()
            .map(|row| {
                self.encoder
                    .encode_row(row)
                    .map(|features| Data::new_test_data(features, None))
            })
            .collect::<Result<_, _>>()?;

        let scores = self.model.predict(&data);
        if scores.len() != table.len() {
            return Err(RiskError::ModelSchema(format!(
                "model returned {} scores for {} rows",
                scores.len(),
                table.len()
            )));
        }
        Ok(scores.into_iter().map(|score| score as f64).collect())
    }
}
