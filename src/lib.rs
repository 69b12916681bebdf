/*!
 * # Stroke Query
 *
 * A read-only query service over the cleaned stroke prediction dataset.
 *
 * ## Features
 *
 * - **Validated Loading**: typed patient records, unique ids, missing BMI kept as missing
 * - **Columnar Input**: Parquet (feature `parquet`) and CSV files with the same columns
 * - **Filtering**: conjunctive gender / stroke / maximum age predicates, dataset order kept
 * - **Statistics**: dataset summary and stroke breakdown, rounded to 2 decimals
 * - **HTTP API**: axum JSON endpoints sharing one immutable dataset
 *
 * ## Quick Start
 *
 * ```no_run
 * use stroke_query::prelude::*;
 *
 * # fn main() -> Result<()> {
 * let dataset = PatientDataset::load("data/clean_health.parquet")?;
 *
 * let young_stroke_patients = dataset
 *     .query()
 *     .stroke(1)
 *     .max_age(40.0)
 *     .execute();
 * println!("Found {} stroke patients aged 40 or less", young_stroke_patients.len());
 *
 * dataset.statistics()?.print_summary();
 * # Ok(())
 * # }
 * ```
 *
 * ## Loading Data
 *
 * ```no_run
 * # use stroke_query::prelude::*;
 * # fn main() -> Result<()> {
 * let dataset = PatientDatasetBuilder::new()
 *     .data_file("data/stroke.csv")
 *     .skip_invalid_records(true)
 *     .build()?;
 *
 * if let Some(patient) = dataset.get_by_id(9046) {
 *     println!("{} aged {}", patient.gender, patient.age);
 * }
 * # Ok(())
 * # }
 * ```
 *
 * ## Serving
 *
 * ```no_run
 * # use std::sync::Arc;
 * # use stroke_query::prelude::*;
 * # async fn run() -> Result<()> {
 * let config = ConfigBuilder::new()
 *     .data_path("data/clean_health.parquet")
 *     .bind_addr("0.0.0.0:8000")
 *     .build();
 * let dataset = Arc::new(config.dataset_builder().build()?);
 * stroke_query::server::serve(&config, dataset).await?;
 * # Ok(())
 * # }
 * ```
 */

// Re-export error types from root
pub use error::{StrokeError, Result, ErrorContext, DataFormat};

// Public modules
pub mod data_types;
pub mod reader;
pub mod schema;
pub mod error;
pub mod analytics;
pub mod dataset;
pub mod service;
pub mod server;
pub mod config;

/// Prelude module for convenient imports
///
/// Import everything you need with:
/// ```
/// use stroke_query::prelude::*;
/// ```
pub mod prelude {
    pub use crate::data_types::*;
    pub use crate::reader::PatientReader;
    pub use crate::schema::PatientSchema;
    pub use crate::error::{StrokeError, Result};
    pub use crate::analytics::{PatientFilter, PatientQuery, PatientAnalytics, StatisticsSummary, StrokeBreakdown};
    pub use crate::dataset::{PatientDataset, PatientDatasetBuilder};
    pub use crate::service::PatientService;
    pub use crate::config::{ConfigBuilder, ServiceConfig};
    pub use crate::DataFormat;
}

/// Service constants
pub mod constants {
    /// Dataset location used when nothing else is configured
    pub const DEFAULT_DATA_PATH: &str = "data/clean_health.parquet";

    pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

    /// Body of `GET /`
    pub const WELCOME_MESSAGE: &str = "Bienvenue sur l'API Stroke Prediction !";
}
