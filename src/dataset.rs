/*!
 * Immutable, in-memory patient dataset
 *
 * The dataset is loaded once, validated (typed rows, unique ids) and then
 * only ever read. Share it between threads with `Arc<PatientDataset>`.
 */

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use chrono::{DateTime, Utc};

use crate::{Result, StrokeError, DataFormat};
use crate::data_types::*;
use crate::reader::PatientReader;
use crate::analytics::{PatientAnalytics, PatientQuery, StatisticsSummary};

/// Builder for loading the patient dataset
///
/// # Example
/// ```no_run
/// # use stroke_query::dataset::PatientDatasetBuilder;
/// let dataset = PatientDatasetBuilder::new()
///     .data_file("data/clean_health.parquet")
///     .skip_invalid_records(false)
///     .build()?;
/// # Ok::<(), stroke_query::StrokeError>(())
/// ```
pub struct PatientDatasetBuilder {
    data_path: Option<PathBuf>,
    format: Option<DataFormat>,
    skip_invalid_records: bool,
    #[cfg(feature = "progress")]
    show_progress: bool,
}

impl Default for PatientDatasetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PatientDatasetBuilder {
    /// Create a new dataset builder
    pub fn new() -> Self {
        Self {
            data_path: None,
            format: None,
            skip_invalid_records: false,
            #[cfg(feature = "progress")]
            show_progress: false,
        }
    }

    /// Set the path to the dataset file
    pub fn data_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Force a file format instead of detecting it from the extension
    pub fn format(mut self, format: DataFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Drop invalid rows instead of failing the load
    pub fn skip_invalid_records(mut self, skip: bool) -> Self {
        self.skip_invalid_records = skip;
        self
    }

    #[cfg(feature = "progress")]
    /// Enable or disable progress bars
    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Load and validate the dataset
    pub fn build(self) -> Result<PatientDataset> {
        let path = self.data_path
            .ok_or_else(|| StrokeError::Configuration {
                message: "Dataset file path not specified".to_string(),
                suggestion: Some("Use .data_file() or set STROKE_DATA_PATH".to_string()),
            })?;

        #[allow(unused_mut)]
        let mut reader = PatientReader::new()
            .with_skip_invalid_records(self.skip_invalid_records);

        #[cfg(feature = "progress")]
        {
            reader = reader.with_progress_bar(self.show_progress);
        }

        tracing::info!("loading patient dataset from {}", path.display());
        let records = reader.load(&path, self.format)?;

        let mut dataset = PatientDataset::from_records(records)?;
        dataset.source = Some(path);
        Ok(dataset)
    }
}

/// The patient records plus an id index, fixed after construction
#[derive(Debug)]
pub struct PatientDataset {
    records: Vec<PatientRecord>,
    id_index: HashMap<i64, usize>,
    source: Option<PathBuf>,
    loaded_at: DateTime<Utc>,
}

impl PatientDataset {
    /// Load a dataset file with default settings
    ///
    /// # Example
    /// ```no_run
    /// # use stroke_query::dataset::PatientDataset;
    /// let dataset = PatientDataset::load("data/clean_health.parquet")?;
    /// # Ok::<(), stroke_query::StrokeError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        PatientDatasetBuilder::new().data_file(path).build()
    }

    /// Build a dataset from records already in memory
    ///
    /// Fails if two records share an id.
    pub fn from_records(records: Vec<PatientRecord>) -> Result<Self> {
        let id_index = build_id_index(&records)?;
        Ok(Self {
            records,
            id_index,
            source: None,
            loaded_at: Utc::now(),
        })
    }

    /// Read-only view of every record in load order
    pub fn snapshot(&self) -> &[PatientRecord] {
        &self.records
    }

    /// Get the total number of patients
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the dataset is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get a patient by id
    pub fn get_by_id(&self, id: i64) -> Option<&PatientRecord> {
        self.id_index.get(&id).and_then(|&idx| self.records.get(idx))
    }

    /// Start a filtered query over the dataset
    pub fn query(&self) -> PatientQuery<'_> {
        PatientQuery::new(&self.records)
    }

    /// Analytics engine over the dataset
    pub fn analytics(&self) -> PatientAnalytics<'_> {
        PatientAnalytics::new(&self.records)
    }

    /// Summary statistics over every record
    pub fn statistics(&self) -> Result<StatisticsSummary> {
        self.analytics().statistics()
    }

    /// File the dataset was loaded from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

/// Map every id to its position, rejecting duplicates
fn build_id_index(records: &[PatientRecord]) -> Result<HashMap<i64, usize>> {
    let mut index = HashMap::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        if let Some(first) = index.insert(record.id, idx) {
            return Err(StrokeError::DuplicateId {
                id: record.id,
                first_row: first + 1,
                duplicate_row: idx + 1,
            });
        }
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn patient(id: i64, gender: Gender, age: f64, stroke: u8, bmi: Option<f64>) -> PatientRecord {
        PatientRecord {
            id,
            gender,
            age,
            hypertension: 0,
            heart_disease: 0,
            avg_glucose_level: 90.0,
            bmi,
            smoking_status: SmokingStatus::Unknown,
            stroke,
        }
    }

    #[test]
    fn test_lookup_returns_each_record() {
        let records = vec![
            patient(1, Gender::Male, 70.0, 1, Some(28.0)),
            patient(2, Gender::Female, 40.0, 0, Some(22.0)),
        ];
        let dataset = PatientDataset::from_records(records.clone()).unwrap();
        for record in &records {
            assert_eq!(dataset.get_by_id(record.id), Some(record));
        }
        assert_eq!(dataset.get_by_id(99), None);
        assert_eq!(dataset.snapshot(), records.as_slice());
        assert_eq!(dataset.len(), 2);
        assert!(dataset.source().is_none());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let records = vec![
            patient(5, Gender::Male, 70.0, 1, None),
            patient(6, Gender::Male, 71.0, 0, None),
            patient(5, Gender::Female, 40.0, 0, None),
        ];
        let err = PatientDataset::from_records(records).unwrap_err();
        match err {
            StrokeError::DuplicateId { id, first_row, duplicate_row } => {
                assert_eq!((id, first_row, duplicate_row), (5, 1, 3));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_builder_requires_path() {
        let err = PatientDatasetBuilder::new().build().unwrap_err();
        assert!(matches!(err, StrokeError::Configuration { .. }));
    }

    #[test]
    fn test_builder_loads_csv() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "id,gender,age,hypertension,heart_disease,avg_glucose_level,bmi,smoking_status,stroke").unwrap();
        writeln!(file, "1,Male,70,0,0,120.5,28,smokes,1").unwrap();
        writeln!(file, "2,Female,40,0,0,88.1,22,never smoked,0").unwrap();
        file.flush().unwrap();

        let dataset = PatientDataset::load(file.path()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.source(), Some(file.path()));
        assert_eq!(dataset.query().stroke(1).count(), 1);
    }

    #[test]
    fn test_duplicate_ids_in_file_fail_even_when_skipping() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "id,gender,age,hypertension,heart_disease,avg_glucose_level,bmi,smoking_status,stroke").unwrap();
        writeln!(file, "1,Male,70,0,0,120.5,28,smokes,1").unwrap();
        writeln!(file, "1,Female,40,0,0,88.1,22,never smoked,0").unwrap();
        file.flush().unwrap();

        let err = PatientDatasetBuilder::new()
            .data_file(file.path())
            .skip_invalid_records(true)
            .build()
            .unwrap_err();
        assert!(matches!(err, StrokeError::DuplicateId { id: 1, .. }));
    }
}
