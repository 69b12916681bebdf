/*!
 * Schema definition for the stroke dataset file
 *
 * The column names are the contract between the data file and the query
 * service. Columns are located by name, so their order in the file does not
 * matter and extra columns are ignored.
 */

use std::collections::HashMap;

use crate::{Result, StrokeError};

pub const COL_ID: &str = "id";
pub const COL_GENDER: &str = "gender";
pub const COL_AGE: &str = "age";
pub const COL_HYPERTENSION: &str = "hypertension";
pub const COL_HEART_DISEASE: &str = "heart_disease";
pub const COL_AVG_GLUCOSE_LEVEL: &str = "avg_glucose_level";
pub const COL_BMI: &str = "bmi";
pub const COL_SMOKING_STATUS: &str = "smoking_status";
pub const COL_STROKE: &str = "stroke";

/// Stroke dataset schema
pub struct PatientSchema;

impl PatientSchema {
    /// Columns every dataset file must provide
    pub fn required_columns() -> Vec<&'static str> {
        vec![
            COL_ID,
            COL_GENDER,
            COL_AGE,
            COL_HYPERTENSION,
            COL_HEART_DISEASE,
            COL_AVG_GLUCOSE_LEVEL,
            COL_BMI,
            COL_SMOKING_STATUS,
            COL_STROKE,
        ]
    }

    /// Values that mark a missing cell in CSV exports of the dataset
    pub fn is_missing(value: &str) -> bool {
        matches!(value.trim(), "" | "N/A" | "NA" | "NaN" | "nan" | "null")
    }

    /// Validate headers and resolve the position of every required column
    pub fn validate_headers(headers: &[String]) -> Result<ColumnMap> {
        let positions: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.trim(), idx))
            .collect();

        let missing: Vec<String> = Self::required_columns()
            .into_iter()
            .filter(|column| !positions.contains_key(column))
            .map(str::to_string)
            .collect();

        if !missing.is_empty() {
            return Err(StrokeError::missing_columns(missing));
        }

        let extra: Vec<&str> = headers
            .iter()
            .map(|h| h.trim())
            .filter(|h| !Self::required_columns().iter().any(|c| c == h))
            .collect();
        if !extra.is_empty() {
            tracing::debug!(columns = ?extra, "ignoring columns outside the patient schema");
        }

        let index = |column: &str| positions[column];
        Ok(ColumnMap {
            id: index(COL_ID),
            gender: index(COL_GENDER),
            age: index(COL_AGE),
            hypertension: index(COL_HYPERTENSION),
            heart_disease: index(COL_HEART_DISEASE),
            avg_glucose_level: index(COL_AVG_GLUCOSE_LEVEL),
            bmi: index(COL_BMI),
            smoking_status: index(COL_SMOKING_STATUS),
            stroke: index(COL_STROKE),
        })
    }
}

/// Position of each required column in a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub id: usize,
    pub gender: usize,
    pub age: usize,
    pub hypertension: usize,
    pub heart_disease: usize,
    pub avg_glucose_level: usize,
    pub bmi: usize,
    pub smoking_status: usize,
    pub stroke: usize,
}
