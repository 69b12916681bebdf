/*!
 * Columnar file reader for the stroke dataset
 *
 * Reads CSV (always) and Parquet (feature `parquet`) files into validated
 * `PatientRecord`s, with optional progress reporting and a lenient mode that
 * drops invalid rows instead of failing the whole load.
 */

use std::fs::File;
use std::path::Path;
use std::time::Instant;
use csv::ReaderBuilder;

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    Result, StrokeError, ErrorContext, DataFormat,
    data_types::*,
    schema::*,
};

/// Maximum number of skipped rows reported individually
const MAX_REPORTED_INVALID: usize = 10;

/// Reader for stroke dataset files
pub struct PatientReader {
    /// Whether to skip invalid records (true) or fail on first error (false)
    skip_invalid_records: bool,
    /// Whether to show progress bar
    #[cfg(feature = "progress")]
    show_progress_bar: bool,
}

impl Default for PatientReader {
    fn default() -> Self {
        Self::new()
    }
}

impl PatientReader {
    /// Create a new reader with default settings
    pub fn new() -> Self {
        Self {
            skip_invalid_records: false,
            #[cfg(feature = "progress")]
            show_progress_bar: false,
        }
    }

    /// Enable or disable skipping invalid records
    pub fn with_skip_invalid_records(mut self, skip: bool) -> Self {
        self.skip_invalid_records = skip;
        self
    }

    #[cfg(feature = "progress")]
    /// Enable or disable the progress bar
    pub fn with_progress_bar(mut self, show: bool) -> Self {
        self.show_progress_bar = show;
        self
    }

    /// Work out the file format from its extension
    pub fn detect_format(path: &Path) -> Result<DataFormat> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("csv") => Ok(DataFormat::Csv),
            #[cfg(feature = "parquet")]
            Some("parquet") | Some("pq") => Ok(DataFormat::Parquet),
            _ => Err(Self::unsupported(path)),
        }
    }

    fn unsupported(path: &Path) -> StrokeError {
        let mut supported = vec!["csv".to_string()];
        if cfg!(feature = "parquet") {
            supported.push("parquet".to_string());
        }
        StrokeError::UnsupportedFormat {
            path: path.to_path_buf(),
            supported,
        }
    }

    /// Load every patient record from a dataset file
    pub fn load<P: AsRef<Path>>(&self, path: P, format: Option<DataFormat>) -> Result<Vec<PatientRecord>> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(StrokeError::file_not_found_with_suggestion(path.to_path_buf()));
        }

        let format = match format {
            Some(format) => format,
            None => Self::detect_format(path)?,
        };

        let start_time = Instant::now();
        let outcome = match format {
            DataFormat::Csv => self.load_csv(path),
            #[cfg(feature = "parquet")]
            DataFormat::Parquet => self.load_parquet(path),
            #[cfg(not(feature = "parquet"))]
            DataFormat::Parquet => Err(Self::unsupported(path)),
        };
        let LoadOutcome { records, invalid_count } = outcome.map_err(|e| e.with_file(path))?;

        let elapsed = start_time.elapsed();
        tracing::info!(
            records = records.len(),
            skipped = invalid_count,
            format = %format,
            elapsed_ms = elapsed.as_millis() as u64,
            "loaded patient records from {}",
            path.display()
        );

        Ok(records)
    }

    /// Load patient records from a CSV file
    fn load_csv(&self, path: &Path) -> Result<LoadOutcome> {
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(file);

        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
        let columns = PatientSchema::validate_headers(&headers)?;

        #[cfg(feature = "progress")]
        let progress_bar = self.progress_bar(file_size, "[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})");
        #[cfg(not(feature = "progress"))]
        let _ = file_size;

        let mut outcome = LoadOutcome::default();
        let mut csv_record = csv::StringRecord::new();

        loop {
            match reader.read_record(&mut csv_record) {
                Ok(true) => {
                    let line = csv_record.position().map(|p| p.line() as usize);
                    match parse_csv_record(&csv_record, &columns, line) {
                        Ok(record) => outcome.records.push(record),
                        Err(e) => self.handle_invalid(&mut outcome, e)?,
                    }
                }
                Ok(false) => break,
                Err(e) => {
                    let line = e.position().map(|p| p.line() as usize);
                    let error = StrokeError::CsvParse {
                        message: e.to_string(),
                        line,
                        context: ErrorContext {
                            file_path: Some(path.to_path_buf()),
                            line_number: line,
                            ..Default::default()
                        },
                    };
                    self.handle_invalid(&mut outcome, error)?;
                }
            }

            #[cfg(feature = "progress")]
            if let Some(ref pb) = progress_bar {
                pb.set_position(reader.position().byte());
            }
        }

        #[cfg(feature = "progress")]
        if let Some(pb) = progress_bar {
            pb.finish_with_message("Loading complete");
        }

        Ok(outcome)
    }

    /// Load patient records from a Parquet file
    #[cfg(feature = "parquet")]
    fn load_parquet(&self, path: &Path) -> Result<LoadOutcome> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        let file = File::open(path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

        let headers: Vec<String> = builder
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().to_string())
            .collect();
        PatientSchema::validate_headers(&headers)?;

        let total_rows = builder.metadata().file_metadata().num_rows().max(0) as u64;

        #[cfg(feature = "progress")]
        let progress_bar = self.progress_bar(total_rows, "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows ({eta})");
        #[cfg(not(feature = "progress"))]
        let _ = total_rows;

        let mut outcome = LoadOutcome::default();
        let mut row_offset = 0usize;

        for batch in builder.build()? {
            let batch = batch?;
            let columns = columnar::PatientColumns::from_batch(&batch)?;

            for row in 0..batch.num_rows() {
                // Parquet has no line numbers; report 1-based row positions instead.
                let row_number = row_offset + row + 1;
                match columns.record(row, row_number) {
                    Ok(record) => outcome.records.push(record),
                    Err(e) => self.handle_invalid(&mut outcome, e)?,
                }
            }
            row_offset += batch.num_rows();

            #[cfg(feature = "progress")]
            if let Some(ref pb) = progress_bar {
                pb.set_position(row_offset as u64);
            }
        }

        #[cfg(feature = "progress")]
        if let Some(pb) = progress_bar {
            pb.finish_with_message("Loading complete");
        }

        Ok(outcome)
    }

    #[cfg(feature = "progress")]
    fn progress_bar(&self, length: u64, template: &str) -> Option<ProgressBar> {
        if !self.show_progress_bar {
            return None;
        }
        let pb = ProgressBar::new(length);
        let style = ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        Some(pb)
    }

    /// Either record a skipped row or abort the load
    fn handle_invalid(&self, outcome: &mut LoadOutcome, error: StrokeError) -> Result<()> {
        if !self.skip_invalid_records {
            return Err(error);
        }
        outcome.invalid_count += 1;
        if outcome.invalid_count <= MAX_REPORTED_INVALID {
            tracing::warn!("skipping invalid record: {}", error.user_message());
        } else if outcome.invalid_count == MAX_REPORTED_INVALID + 1 {
            tracing::warn!("further invalid records will be skipped silently");
        }
        Ok(())
    }
}

#[derive(Default)]
struct LoadOutcome {
    records: Vec<PatientRecord>,
    invalid_count: usize,
}

/// Parse one CSV row into a validated patient record
fn parse_csv_record(record: &csv::StringRecord, columns: &ColumnMap, line: Option<usize>) -> Result<PatientRecord> {
    let get_field = |index: usize| {
        record.get(index)
            .map(str::trim)
            .filter(|s| !PatientSchema::is_missing(s))
    };

    let get_required_field = |index: usize, field_name: &str| {
        get_field(index).ok_or_else(|| StrokeError::missing_field(field_name, line))
    };

    let id = parse_integer(COL_ID, get_required_field(columns.id, COL_ID)?, line)?;

    let gender_str = get_required_field(columns.gender, COL_GENDER)?;
    let gender = Gender::from_code(gender_str).ok_or_else(|| {
        StrokeError::invalid_field(COL_GENDER, gender_str, "expected Male, Female or Other", line)
    })?;

    let smoking_str = get_required_field(columns.smoking_status, COL_SMOKING_STATUS)?;
    let smoking_status = SmokingStatus::from_code(smoking_str).ok_or_else(|| {
        StrokeError::invalid_field(
            COL_SMOKING_STATUS,
            smoking_str,
            "expected never smoked, formerly smoked, smokes or Unknown",
            line,
        )
    })?;

    let record = PatientRecord {
        id,
        gender,
        age: parse_float(COL_AGE, get_required_field(columns.age, COL_AGE)?, line)?,
        hypertension: parse_flag(COL_HYPERTENSION, get_required_field(columns.hypertension, COL_HYPERTENSION)?, line)?,
        heart_disease: parse_flag(COL_HEART_DISEASE, get_required_field(columns.heart_disease, COL_HEART_DISEASE)?, line)?,
        avg_glucose_level: parse_float(
            COL_AVG_GLUCOSE_LEVEL,
            get_required_field(columns.avg_glucose_level, COL_AVG_GLUCOSE_LEVEL)?,
            line,
        )?,
        bmi: get_field(columns.bmi)
            .map(|raw| parse_float(COL_BMI, raw, line))
            .transpose()?,
        smoking_status,
        stroke: parse_flag(COL_STROKE, get_required_field(columns.stroke, COL_STROKE)?, line)?,
    };

    record.validate(line)?;
    Ok(record)
}

fn parse_float(field: &str, raw: &str, line: Option<usize>) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|_| StrokeError::invalid_field(field, raw, "expected a number", line))
}

/// Integers exported through a float column ("42.0") are accepted
fn parse_integer(field: &str, raw: &str, line: Option<usize>) -> Result<i64> {
    if let Ok(value) = raw.parse::<i64>() {
        return Ok(value);
    }
    raw.parse::<f64>()
        .ok()
        .and_then(float_to_integer)
        .ok_or_else(|| StrokeError::invalid_field(field, raw, "expected an integer", line))
}

/// Whole, in-range floats convert exactly; anything else is rejected
fn float_to_integer(value: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.is_finite() && value.fract() == 0.0 && in_range).then_some(value as i64)
}

fn parse_flag(field: &str, raw: &str, line: Option<usize>) -> Result<u8> {
    match parse_integer(field, raw, line)? {
        0 => Ok(0),
        1 => Ok(1),
        _ => Err(StrokeError::invalid_field(field, raw, "must be 0 or 1", line)),
    }
}

#[cfg(feature = "parquet")]
mod columnar {
    use arrow::array::{Array, Float64Array, Int64Array, StringArray};
    use arrow::compute::cast;
    use arrow::datatypes::DataType;
    use arrow::record_batch::RecordBatch;

    use crate::{Result, StrokeError};
    use crate::data_types::*;
    use crate::schema::*;

    /// Required columns of one record batch, normalised to a single type each
    pub(super) struct PatientColumns {
        id: IntegerColumn,
        gender: StringArray,
        age: Float64Array,
        hypertension: IntegerColumn,
        heart_disease: IntegerColumn,
        avg_glucose_level: Float64Array,
        bmi: Float64Array,
        smoking_status: StringArray,
        stroke: IntegerColumn,
    }

    /// Integer column as stored: pandas often writes integer data as float64
    /// (e.g. after a NaN passed through), so float sources are kept as floats
    /// and checked per row instead of being truncated by a cast.
    enum IntegerColumn {
        Int(Int64Array),
        Float(Float64Array),
    }

    impl IntegerColumn {
        fn is_null(&self, row: usize) -> bool {
            match self {
                IntegerColumn::Int(array) => array.is_null(row),
                IntegerColumn::Float(array) => array.is_null(row),
            }
        }

        fn value(&self, row: usize, field: &str, line: Option<usize>) -> Result<i64> {
            if self.is_null(row) {
                return Err(StrokeError::missing_field(field, line));
            }
            match self {
                IntegerColumn::Int(array) => Ok(array.value(row)),
                IntegerColumn::Float(array) => {
                    let value = array.value(row);
                    super::float_to_integer(value).ok_or_else(|| {
                        StrokeError::invalid_field(field, &value.to_string(), "expected an integer", line)
                    })
                }
            }
        }
    }

    impl PatientColumns {
        pub(super) fn from_batch(batch: &RecordBatch) -> Result<Self> {
            Ok(Self {
                id: int_column(batch, COL_ID)?,
                gender: string_column(batch, COL_GENDER)?,
                age: float_column(batch, COL_AGE)?,
                hypertension: int_column(batch, COL_HYPERTENSION)?,
                heart_disease: int_column(batch, COL_HEART_DISEASE)?,
                avg_glucose_level: float_column(batch, COL_AVG_GLUCOSE_LEVEL)?,
                bmi: float_column(batch, COL_BMI)?,
                smoking_status: string_column(batch, COL_SMOKING_STATUS)?,
                stroke: int_column(batch, COL_STROKE)?,
            })
        }

        pub(super) fn record(&self, row: usize, row_number: usize) -> Result<PatientRecord> {
            let line = Some(row_number);

            let gender_str = required(&self.gender, row, COL_GENDER, line)
                .map(|_| self.gender.value(row))?;
            let gender = Gender::from_code(gender_str.trim()).ok_or_else(|| {
                StrokeError::invalid_field(COL_GENDER, gender_str, "expected Male, Female or Other", line)
            })?;

            let smoking_str = required(&self.smoking_status, row, COL_SMOKING_STATUS, line)
                .map(|_| self.smoking_status.value(row))?;
            let smoking_status = SmokingStatus::from_code(smoking_str.trim()).ok_or_else(|| {
                StrokeError::invalid_field(
                    COL_SMOKING_STATUS,
                    smoking_str,
                    "expected never smoked, formerly smoked, smokes or Unknown",
                    line,
                )
            })?;

            let id = self.id.value(row, COL_ID, line)?;
            required(&self.age, row, COL_AGE, line)?;
            required(&self.avg_glucose_level, row, COL_AVG_GLUCOSE_LEVEL, line)?;

            // pandas writes missing floats either as null or as NaN
            let bmi = if self.bmi.is_null(row) || self.bmi.value(row).is_nan() {
                None
            } else {
                Some(self.bmi.value(row))
            };

            let record = PatientRecord {
                id,
                gender,
                age: self.age.value(row),
                hypertension: flag(&self.hypertension, row, COL_HYPERTENSION, line)?,
                heart_disease: flag(&self.heart_disease, row, COL_HEART_DISEASE, line)?,
                avg_glucose_level: self.avg_glucose_level.value(row),
                bmi,
                smoking_status,
                stroke: flag(&self.stroke, row, COL_STROKE, line)?,
            };

            record.validate(line)?;
            Ok(record)
        }
    }

    fn required(array: &dyn Array, row: usize, field: &str, line: Option<usize>) -> Result<()> {
        if array.is_null(row) {
            Err(StrokeError::missing_field(field, line))
        } else {
            Ok(())
        }
    }

    fn flag(column: &IntegerColumn, row: usize, field: &str, line: Option<usize>) -> Result<u8> {
        let value = column.value(row, field, line)?;
        match value {
            0 | 1 => Ok(value as u8),
            _ => Err(StrokeError::invalid_field(field, &value.to_string(), "must be 0 or 1", line)),
        }
    }

    fn column_as(batch: &RecordBatch, name: &str, data_type: &DataType) -> Result<arrow::array::ArrayRef> {
        let column = batch
            .column_by_name(name)
            .ok_or_else(|| StrokeError::missing_columns(vec![name.to_string()]))?;
        Ok(cast(column, data_type)?)
    }

    fn int_column(batch: &RecordBatch, name: &str) -> Result<IntegerColumn> {
        let source_is_float = batch
            .column_by_name(name)
            .is_some_and(|column| column.data_type().is_floating());
        if source_is_float {
            return float_column(batch, name).map(IntegerColumn::Float);
        }

        let array = column_as(batch, name, &DataType::Int64)?;
        array
            .as_any()
            .downcast_ref::<Int64Array>()
            .cloned()
            .map(IntegerColumn::Int)
            .ok_or_else(|| type_mismatch(name, "integer"))
    }

    fn float_column(batch: &RecordBatch, name: &str) -> Result<Float64Array> {
        let array = column_as(batch, name, &DataType::Float64)?;
        array
            .as_any()
            .downcast_ref::<Float64Array>()
            .cloned()
            .ok_or_else(|| type_mismatch(name, "numeric"))
    }

    fn string_column(batch: &RecordBatch, name: &str) -> Result<StringArray> {
        let array = column_as(batch, name, &DataType::Utf8)?;
        array
            .as_any()
            .downcast_ref::<StringArray>()
            .cloned()
            .ok_or_else(|| type_mismatch(name, "string"))
    }

    fn type_mismatch(name: &str, expected: &str) -> StrokeError {
        StrokeError::SchemaMismatch {
            message: format!("column '{}' cannot be read as {}", name, expected),
            missing_columns: Vec::new(),
        }
    }
}
