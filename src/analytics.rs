/*!
 * Filtering and statistics over the patient dataset
 *
 * Everything here is a pure function of an immutable record slice and the
 * caller's parameters, so results can be shared freely between threads.
 */

use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{Result, StrokeError};
use crate::data_types::*;

/// Number of decimal places kept for every averaged or float statistic
pub const STATS_PRECISION: i32 = 2;

/// Optional attribute predicates for patient filtering
///
/// A field left as `None` imposes no constraint. `Some(0.0)` for `max_age`
/// is a real bound and only keeps patients aged exactly 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientFilter {
    pub gender: Option<String>,
    pub stroke: Option<u8>,
    pub max_age: Option<f64>,
}

impl PatientFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject parameters no record could be compared against
    pub fn validate(&self) -> Result<()> {
        if let Some(max_age) = self.max_age {
            if max_age.is_nan() {
                return Err(StrokeError::Filter {
                    message: "max_age must be a number".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Whether a record satisfies every supplied predicate
    pub fn matches(&self, record: &PatientRecord) -> bool {
        self.gender.as_deref().map_or(true, |g| record.gender.as_str() == g)
            && self.stroke.map_or(true, |s| record.stroke == s)
            && self.max_age.map_or(true, |a| record.age <= a)
    }
}

/// Query builder for patient searches
///
/// ```
/// # use stroke_query::prelude::*;
/// # let dataset = PatientDataset::from_records(Vec::new()).unwrap();
/// let older_women_with_stroke = dataset
///     .query()
///     .gender("Female")
///     .stroke(1)
///     .max_age(90.0)
///     .execute();
/// # assert!(older_women_with_stroke.is_empty());
/// ```
pub struct PatientQuery<'a> {
    records: &'a [PatientRecord],
    filter: PatientFilter,
}

impl<'a> PatientQuery<'a> {
    /// Create a new query over a record slice
    pub fn new(records: &'a [PatientRecord]) -> Self {
        Self {
            records,
            filter: PatientFilter::default(),
        }
    }

    /// Start from a filter built elsewhere, e.g. from request parameters
    pub fn with_filter(mut self, filter: PatientFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Filter by exact gender value
    pub fn gender<S: Into<String>>(mut self, gender: S) -> Self {
        self.filter.gender = Some(gender.into());
        self
    }

    /// Filter by stroke outcome
    pub fn stroke(mut self, stroke: u8) -> Self {
        self.filter.stroke = Some(stroke);
        self
    }

    /// Keep patients at or below an age
    pub fn max_age(mut self, max_age: f64) -> Self {
        self.filter.max_age = Some(max_age);
        self
    }

    /// Execute the query and return matching records in dataset order
    pub fn execute(self) -> Vec<&'a PatientRecord> {
        let filter = &self.filter;

        #[cfg(feature = "parallel")]
        let matches: Vec<&'a PatientRecord> = self.records
            .par_iter()
            .filter(|record| filter.matches(record))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let matches: Vec<&'a PatientRecord> = self.records
            .iter()
            .filter(|record| filter.matches(record))
            .collect();

        matches
    }

    /// Execute the query and return count only
    pub fn count(self) -> usize {
        let filter = &self.filter;
        self.records.iter().filter(|record| filter.matches(record)).count()
    }
}

/// Descriptive statistics over the whole dataset
///
/// Serialized with the key names the dashboard reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSummary {
    #[serde(rename = "Total_patients")]
    pub total_patients: usize,
    #[serde(rename = "Average_age")]
    pub average_age: f64,
    #[serde(rename = "Average_stroke")]
    pub average_stroke: f64,
    #[serde(rename = "Average_hypertension")]
    pub average_hypertension: f64,
    #[serde(rename = "Average_heart_disease")]
    pub average_heart_disease: f64,
    #[serde(rename = "Average_glucose_level")]
    pub average_glucose_level: f64,
    #[serde(rename = "Minimum_glucose_level")]
    pub minimum_glucose_level: f64,
    #[serde(rename = "Maximum_glucose_level")]
    pub maximum_glucose_level: f64,
    /// Mean over patients with a recorded BMI; `None` if nobody has one
    #[serde(rename = "Average_bmi")]
    pub average_bmi: Option<f64>,
}

impl StatisticsSummary {
    /// Print formatted statistics
    pub fn print_summary(&self) {
        println!("=== Stroke Dataset Statistics ===");
        println!("Total Patients: {}", self.total_patients);
        println!("Average Age: {:.2}", self.average_age);
        println!("Stroke Rate: {:.1}%", self.average_stroke * 100.0);
        println!("Hypertension Rate: {:.1}%", self.average_hypertension * 100.0);
        println!("Heart Disease Rate: {:.1}%", self.average_heart_disease * 100.0);
        println!(
            "Glucose Level: avg {:.2}, min {:.2}, max {:.2}",
            self.average_glucose_level, self.minimum_glucose_level, self.maximum_glucose_level
        );
        match self.average_bmi {
            Some(bmi) => println!("Average BMI: {:.2}", bmi),
            None => println!("Average BMI: n/a"),
        }
    }
}

/// Stroke-centred counts behind the dashboard charts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeBreakdown {
    pub with_stroke: usize,
    pub without_stroke: usize,
    pub average_bmi_with_stroke: Option<f64>,
    pub average_bmi_without_stroke: Option<f64>,
    /// Stroke patients whose smoking status is anything but "never smoked"
    pub stroke_smokers: usize,
    pub stroke_non_smokers: usize,
}

/// Analytics engine for the patient dataset
pub struct PatientAnalytics<'a> {
    records: &'a [PatientRecord],
}

impl<'a> PatientAnalytics<'a> {
    pub fn new(records: &'a [PatientRecord]) -> Self {
        Self { records }
    }

    /// Compute the statistics summary over every record
    pub fn statistics(&self) -> Result<StatisticsSummary> {
        let total = self.records.len();
        if total == 0 {
            return Err(StrokeError::Compute {
                message: "cannot compute statistics over an empty dataset".to_string(),
            });
        }

        let mut age_sum = 0.0;
        let mut stroke_sum = 0u64;
        let mut hypertension_sum = 0u64;
        let mut heart_disease_sum = 0u64;
        let mut glucose_sum = 0.0;
        let mut glucose_min = f64::INFINITY;
        let mut glucose_max = f64::NEG_INFINITY;

        for record in self.records {
            age_sum += record.age;
            stroke_sum += u64::from(record.stroke);
            hypertension_sum += u64::from(record.hypertension);
            heart_disease_sum += u64::from(record.heart_disease);
            glucose_sum += record.avg_glucose_level;
            glucose_min = glucose_min.min(record.avg_glucose_level);
            glucose_max = glucose_max.max(record.avg_glucose_level);
        }

        let n = total as f64;
        let summary = StatisticsSummary {
            total_patients: total,
            average_age: round_to(age_sum / n, STATS_PRECISION),
            average_stroke: round_to(stroke_sum as f64 / n, STATS_PRECISION),
            average_hypertension: round_to(hypertension_sum as f64 / n, STATS_PRECISION),
            average_heart_disease: round_to(heart_disease_sum as f64 / n, STATS_PRECISION),
            average_glucose_level: round_to(glucose_sum / n, STATS_PRECISION),
            minimum_glucose_level: round_to(glucose_min, STATS_PRECISION),
            maximum_glucose_level: round_to(glucose_max, STATS_PRECISION),
            average_bmi: mean_bmi(self.records.iter()).map(|bmi| round_to(bmi, STATS_PRECISION)),
        };

        if !summary.average_age.is_finite() || !summary.average_glucose_level.is_finite() {
            return Err(StrokeError::Compute {
                message: "statistics produced a non-finite value".to_string(),
            });
        }

        Ok(summary)
    }

    /// Stroke distribution, BMI per stroke status and smoking among stroke patients
    pub fn stroke_breakdown(&self) -> Result<StrokeBreakdown> {
        if self.records.is_empty() {
            return Err(StrokeError::Compute {
                message: "cannot compute a stroke breakdown over an empty dataset".to_string(),
            });
        }

        let (with_stroke, without_stroke): (Vec<&PatientRecord>, Vec<&PatientRecord>) =
            self.records.iter().partition(|r| r.had_stroke());

        let stroke_smokers = with_stroke
            .iter()
            .filter(|r| r.smoking_status.is_smoker())
            .count();

        Ok(StrokeBreakdown {
            with_stroke: with_stroke.len(),
            without_stroke: without_stroke.len(),
            average_bmi_with_stroke: mean_bmi(with_stroke.iter().copied())
                .map(|bmi| round_to(bmi, STATS_PRECISION)),
            average_bmi_without_stroke: mean_bmi(without_stroke.iter().copied())
                .map(|bmi| round_to(bmi, STATS_PRECISION)),
            stroke_smokers,
            stroke_non_smokers: with_stroke.len() - stroke_smokers,
        })
    }

    /// Patient count per gender value
    pub fn count_by_gender(&self) -> Vec<(Gender, usize)> {
        [Gender::Male, Gender::Female, Gender::Other]
            .into_iter()
            .map(|g| (g, self.records.iter().filter(|r| r.gender == g).count()))
            .collect()
    }

    /// Patient count per smoking status
    pub fn count_by_smoking_status(&self) -> Vec<(SmokingStatus, usize)> {
        [
            SmokingStatus::NeverSmoked,
            SmokingStatus::FormerlySmoked,
            SmokingStatus::Smokes,
            SmokingStatus::Unknown,
        ]
        .into_iter()
        .map(|s| (s, self.records.iter().filter(|r| r.smoking_status == s).count()))
        .collect()
    }
}

/// Mean BMI over the records that have one
fn mean_bmi<'r, I>(records: I) -> Option<f64>
where
    I: Iterator<Item = &'r PatientRecord>,
{
    let (sum, count) = records
        .filter_map(|r| r.bmi)
        .fold((0.0, 0usize), |(sum, count), bmi| (sum + bmi, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Round half away from zero to a number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
