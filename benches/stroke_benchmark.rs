use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::io::Write;
use std::sync::OnceLock;
use stroke_query::prelude::*;

// Synthetic dataset shared by every benchmark
static DATASET: OnceLock<PatientDataset> = OnceLock::new();

const DATASET_SIZE: usize = 50_000;

fn synthetic_record(i: usize) -> PatientRecord {
    let gender = match i % 3 {
        0 => Gender::Male,
        1 => Gender::Female,
        _ => Gender::Other,
    };
    let smoking_status = match i % 4 {
        0 => SmokingStatus::NeverSmoked,
        1 => SmokingStatus::FormerlySmoked,
        2 => SmokingStatus::Smokes,
        _ => SmokingStatus::Unknown,
    };
    PatientRecord {
        id: i as i64,
        gender,
        age: (i % 83) as f64,
        hypertension: (i % 7 == 0) as u8,
        heart_disease: (i % 11 == 0) as u8,
        avg_glucose_level: 55.0 + (i % 220) as f64 * 0.97,
        bmi: (i % 25 != 0).then(|| 18.0 + (i % 30) as f64 * 0.6),
        smoking_status,
        stroke: (i % 20 == 0) as u8,
    }
}

fn get_dataset() -> &'static PatientDataset {
    DATASET.get_or_init(|| {
        let records = (0..DATASET_SIZE).map(synthetic_record).collect();
        PatientDataset::from_records(records).expect("synthetic ids are unique")
    })
}

fn benchmark_filters(c: &mut Criterion) {
    let dataset = get_dataset();
    let mut group = c.benchmark_group("filter");

    group.bench_function("no_predicates", |b| {
        b.iter(|| black_box(dataset.query().execute().len()))
    });

    group.bench_function("gender_stroke_max_age", |b| {
        b.iter(|| {
            black_box(
                dataset
                    .query()
                    .gender(black_box("Female"))
                    .stroke(1)
                    .max_age(60.0)
                    .execute()
                    .len(),
            )
        })
    });

    for max_age in [0.0, 40.0, 82.0] {
        group.bench_with_input(BenchmarkId::new("max_age", max_age), &max_age, |b, &age| {
            b.iter(|| black_box(dataset.query().max_age(age).count()))
        });
    }

    group.finish();
}

fn benchmark_lookup(c: &mut Criterion) {
    let dataset = get_dataset();

    c.bench_function("get_by_id_hit", |b| {
        b.iter(|| black_box(dataset.get_by_id(black_box(31_337))))
    });

    c.bench_function("get_by_id_miss", |b| {
        b.iter(|| black_box(dataset.get_by_id(black_box(-1))))
    });
}

fn benchmark_statistics(c: &mut Criterion) {
    let dataset = get_dataset();
    let analytics = dataset.analytics();

    c.bench_function("statistics_summary", |b| {
        b.iter(|| black_box(analytics.statistics().unwrap()))
    });

    c.bench_function("stroke_breakdown", |b| {
        b.iter(|| black_box(analytics.stroke_breakdown().unwrap()))
    });
}

fn benchmark_csv_loading(c: &mut Criterion) {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(
        file,
        "id,gender,age,hypertension,heart_disease,avg_glucose_level,bmi,smoking_status,stroke"
    )
    .unwrap();
    for record in (0..5_000).map(synthetic_record) {
        writeln!(
            file,
            "{},{},{},{},{},{},{},{},{}",
            record.id,
            record.gender,
            record.age,
            record.hypertension,
            record.heart_disease,
            record.avg_glucose_level,
            record.bmi.map(|b| b.to_string()).unwrap_or_else(|| "N/A".to_string()),
            record.smoking_status,
            record.stroke
        )
        .unwrap();
    }
    file.flush().unwrap();

    let mut group = c.benchmark_group("loading");
    group.sample_size(20);
    group.bench_function("csv_5k_rows", |b| {
        b.iter(|| {
            let dataset = PatientDatasetBuilder::new()
                .data_file(file.path())
                .build()
                .unwrap();
            black_box(dataset.len())
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_filters,
    benchmark_lookup,
    benchmark_statistics,
    benchmark_csv_loading
);
criterion_main!(benches);
