/*!
 * Query service over a shared, immutable dataset
 *
 * `PatientService` is cheap to clone and safe to call from any number of
 * concurrent requests: it only holds an `Arc` to the dataset and never
 * mutates it.
 */

use std::sync::Arc;

use crate::{Result, StrokeError};
use crate::data_types::PatientRecord;
use crate::dataset::PatientDataset;
use crate::analytics::{PatientFilter, StatisticsSummary, StrokeBreakdown};

#[derive(Debug, Clone)]
pub struct PatientService {
    dataset: Arc<PatientDataset>,
}

impl PatientService {
    pub fn new(dataset: Arc<PatientDataset>) -> Self {
        Self { dataset }
    }

    pub fn dataset(&self) -> &PatientDataset {
        &self.dataset
    }

    /// Records matching every supplied predicate, in dataset order
    ///
    /// No match is an empty vector, not an error.
    pub fn filter_patients(&self, filter: &PatientFilter) -> Result<Vec<PatientRecord>> {
        filter.validate()?;
        let matches: Vec<PatientRecord> = self.dataset
            .query()
            .with_filter(filter.clone())
            .execute()
            .into_iter()
            .cloned()
            .collect();
        tracing::debug!(?filter, matches = matches.len(), "filtered patients");
        Ok(matches)
    }

    /// Single record by id
    pub fn get_by_id(&self, id: i64) -> Result<PatientRecord> {
        self.dataset
            .get_by_id(id)
            .cloned()
            .ok_or(StrokeError::NotFound { id })
    }

    pub fn compute_statistics(&self) -> Result<StatisticsSummary> {
        self.dataset.statistics()
    }

    pub fn stroke_breakdown(&self) -> Result<StrokeBreakdown> {
        self.dataset.analytics().stroke_breakdown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::{Gender, SmokingStatus};

    fn patient(id: i64, gender: Gender, age: f64, stroke: u8) -> PatientRecord {
        PatientRecord {
            id,
            gender,
            age,
            hypertension: 0,
            heart_disease: 0,
            avg_glucose_level: 100.0,
            bmi: Some(25.0),
            smoking_status: SmokingStatus::NeverSmoked,
            stroke,
        }
    }

    fn service() -> PatientService {
        let dataset = PatientDataset::from_records(vec![
            patient(10, Gender::Male, 70.0, 1),
            patient(11, Gender::Female, 40.0, 0),
            patient(12, Gender::Female, 81.0, 1),
        ])
        .unwrap();
        PatientService::new(Arc::new(dataset))
    }

    #[test]
    fn test_filter_patients() {
        let service = service();
        let filter = PatientFilter {
            gender: Some("Female".into()),
            stroke: Some(1),
            ..Default::default()
        };
        let result = service.filter_patients(&filter).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 12);

        let none = PatientFilter {
            gender: Some("Unknown".into()),
            ..Default::default()
        };
        assert!(service.filter_patients(&none).unwrap().is_empty());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let service = service();
        let filter = PatientFilter {
            max_age: Some(75.0),
            ..Default::default()
        };
        assert_eq!(
            service.filter_patients(&filter).unwrap(),
            service.filter_patients(&filter).unwrap()
        );
    }

    #[test]
    fn test_invalid_filter() {
        let filter = PatientFilter {
            max_age: Some(f64::NAN),
            ..Default::default()
        };
        assert!(matches!(service().filter_patients(&filter), Err(StrokeError::Filter { .. })));
    }

    #[test]
    fn test_get_by_id() {
        let service = service();
        assert_eq!(service.get_by_id(11).unwrap().gender, Gender::Female);
        assert!(matches!(service.get_by_id(99), Err(StrokeError::NotFound { id: 99 })));
    }

    #[test]
    fn test_statistics_on_empty_dataset() {
        let service = PatientService::new(Arc::new(PatientDataset::from_records(Vec::new()).unwrap()));
        assert!(matches!(service.compute_statistics(), Err(StrokeError::Compute { .. })));
        assert!(matches!(service.stroke_breakdown(), Err(StrokeError::Compute { .. })));
    }
}
