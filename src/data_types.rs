/*!
 * Data type definitions for stroke dataset records
 *
 * Rows are validated once at load time into `PatientRecord`; every layer
 * above the reader works with these typed values instead of raw cells.
 */

use serde::{Deserialize, Serialize};

use crate::{Result, StrokeError};

/// Patient gender as recorded in the dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "Male" => Some(Gender::Male),
            "Female" => Some(Gender::Female),
            "Other" => Some(Gender::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Smoking history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SmokingStatus {
    #[serde(rename = "never smoked")]
    NeverSmoked,
    #[serde(rename = "formerly smoked")]
    FormerlySmoked,
    #[serde(rename = "smokes")]
    Smokes,
    Unknown,
}

impl SmokingStatus {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "never smoked" => Some(SmokingStatus::NeverSmoked),
            "formerly smoked" => Some(SmokingStatus::FormerlySmoked),
            "smokes" => Some(SmokingStatus::Smokes),
            "Unknown" => Some(SmokingStatus::Unknown),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SmokingStatus::NeverSmoked => "never smoked",
            SmokingStatus::FormerlySmoked => "formerly smoked",
            SmokingStatus::Smokes => "smokes",
            SmokingStatus::Unknown => "Unknown",
        }
    }

    /// Anything but "never smoked" counts as a smoker in the stroke breakdown,
    /// including an unknown history.
    pub fn is_smoker(&self) -> bool {
        !matches!(self, SmokingStatus::NeverSmoked)
    }
}

impl std::fmt::Display for SmokingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the stroke dataset
///
/// Field names match the dataset columns so the JSON served by the API has
/// the same shape as the source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: i64,
    pub gender: Gender,
    pub age: f64,
    pub hypertension: u8,
    pub heart_disease: u8,
    pub avg_glucose_level: f64,
    pub bmi: Option<f64>,
    pub smoking_status: SmokingStatus,
    pub stroke: u8,
}

impl PatientRecord {
    /// Check the value ranges the typed fields cannot express on their own
    pub fn validate(&self, line_number: Option<usize>) -> Result<()> {
        if !self.age.is_finite() || self.age < 0.0 {
            return Err(StrokeError::invalid_field(
                "age",
                &self.age.to_string(),
                "must be a finite number >= 0",
                line_number,
            ));
        }
        if !self.avg_glucose_level.is_finite() {
            return Err(StrokeError::invalid_field(
                "avg_glucose_level",
                &self.avg_glucose_level.to_string(),
                "must be a finite number",
                line_number,
            ));
        }
        if let Some(bmi) = self.bmi {
            if !bmi.is_finite() {
                return Err(StrokeError::invalid_field(
                    "bmi",
                    &bmi.to_string(),
                    "must be a finite number or missing",
                    line_number,
                ));
            }
        }
        for (field, value) in [
            ("hypertension", self.hypertension),
            ("heart_disease", self.heart_disease),
            ("stroke", self.stroke),
        ] {
            if value > 1 {
                return Err(StrokeError::invalid_field(
                    field,
                    &value.to_string(),
                    "must be 0 or 1",
                    line_number,
                ));
            }
        }
        Ok(())
    }

    pub fn had_stroke(&self) -> bool {
        self.stroke == 1
    }
}
