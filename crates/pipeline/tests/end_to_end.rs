//! Full stage-chain test: CSV → impute → join → chunked lag transform →
//! year split → forest training → held-out scoring.

use lagpipe_engine::{LagSpec, LagTransformEngine, MemorySink, PipelineDriver};
use lagpipe_model::{evaluate, DatasetEncoder, ForestConfig, ForestTrainer};
use lagpipe_pipeline::impute::ImputeAccumulator;
use lagpipe_pipeline::{
    read_table, split_by_year, CsvReadConfig, CsvSink, CsvSource, ImputingSource, Joiner,
    JoiningSource,
};
use lagpipe_frame::Value;
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

fn write_file(path: &Path, contents: &str) {
    let mut file = std::fs::File::create(path).unwrap();
    write!(file, "{contents}").unwrap();
}

/// 14 days spanning a year boundary, with one missing temperature
fn main_csv() -> String {
    let mut csv = String::from("dteday,season,cnt\n");
    for day in 0..14 {
        let (year, month, date) = if day < 10 {
            (2011, 12, 22 + day)
        } else {
            (2012, 1, day - 9)
        };
        let season = if month == 12 { "winter" } else { "newyear" };
        csv.push_str(&format!(
            "{year}-{month:02}-{date:02},{season},{}\n",
            100 + day * 10
        ));
    }
    csv
}

fn lookup_csv() -> String {
    let mut csv = String::from("dteday,temp\n");
    for day in 0..14 {
        let (year, month, date) = if day < 10 {
            (2011, 12, 22 + day)
        } else {
            (2012, 1, day - 9)
        };
        // One hole exercises imputation downstream of the join.
        if day == 3 {
            csv.push_str(&format!("{year}-{month:02}-{date:02},NA\n"));
        } else {
            csv.push_str(&format!("{year}-{month:02}-{date:02},0.{:02}\n", 10 + day));
        }
    }
    csv
}

#[test]
fn test_pipeline_end_to_end() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("days.csv");
    let lookup_path = dir.path().join("weather.csv");
    let transformed_path = dir.path().join("transformed.csv");
    write_file(&input, &main_csv());
    write_file(&lookup_path, &lookup_csv());

    let spec = LagSpec::new("cnt", vec![1, 2]).unwrap();

    // Impute plan comes from the joined stream so the lookup's hole is
    // covered too.
    let joiner = Joiner::build(&read_table(&lookup_path).unwrap(), &["dteday".to_string()]).unwrap();
    let fit_source = JoiningSource::new(
        CsvSource::open(
            &input,
            CsvReadConfig {
                chunk_size: 4,
                probe_rows: 0,
            },
        )
        .unwrap(),
        joiner.clone(),
    );
    let plan = ImputeAccumulator::fit_source(fit_source).unwrap();

    // Probe protocol on, chunk size smaller than the dataset.
    let raw = CsvSource::open(
        &input,
        CsvReadConfig {
            chunk_size: 4,
            probe_rows: 3,
        },
    )
    .unwrap();
    let source = ImputingSource::new(JoiningSource::new(raw, joiner), plan);

    let sink = CsvSink::create(&transformed_path).unwrap();
    let mut driver = PipelineDriver::new(LagTransformEngine::new(spec.clone()), source, sink);
    let summary = driver.run().unwrap();
    driver.into_sink().finish().unwrap();

    assert_eq!(summary.probe_chunks, 1);
    assert_eq!(summary.rows_written, 14);

    let table = read_table(&transformed_path).unwrap();
    assert_eq!(table.row_count(), 14);
    assert_eq!(
        table.column_names(),
        vec!["dteday", "season", "cnt", "temp", "cnt_1", "cnt_2"]
    );

    // Lag columns match a by-hand pass: cnt = 100,110,...; bootstrap = 100.
    let lag1: Vec<f64> = table
        .column("cnt_1")
        .unwrap()
        .values
        .iter()
        .map(|v| v.as_number().unwrap())
        .collect();
    assert_eq!(lag1[0], 100.0);
    assert_eq!(lag1[1], 100.0);
    assert_eq!(lag1[13], 220.0);
    let lag2: Vec<f64> = table
        .column("cnt_2")
        .unwrap()
        .values
        .iter()
        .map(|v| v.as_number().unwrap())
        .collect();
    assert_eq!(&lag2[..3], &[100.0, 100.0, 100.0]);
    assert_eq!(lag2[13], 210.0);

    // The joined temperature hole was imputed with the stream mean.
    assert!(table
        .column("temp")
        .unwrap()
        .values
        .iter()
        .all(|v| !v.is_missing()));

    // Split, train on 2011, score 2012.
    let (train, test) = split_by_year(&table, "dteday", 2012).unwrap();
    assert_eq!(train.row_count(), 10);
    assert_eq!(test.row_count(), 4);

    let features = vec![
        "season".to_string(),
        "temp".to_string(),
        "cnt_1".to_string(),
        "cnt_2".to_string(),
    ];
    let encoder = DatasetEncoder::fit(&train, &features, "cnt").unwrap();
    let train_data = encoder.encode(&train).unwrap();
    let test_data = encoder.encode(&test).unwrap();

    let forest = ForestTrainer::new(ForestConfig {
        num_trees: 16,
        max_depth: 3,
        min_samples_leaf: 1,
        learning_rate: 0.3,
    })
    .train(&train_data)
    .unwrap();

    let predictions = forest.predict(&test_data.features);
    let report = evaluate(&predictions, &test_data.targets).unwrap();
    assert!(report.mae.is_finite());
    assert!(report.rmse >= report.mae);
}

#[test]
fn test_unmatched_join_keys_are_imputed_before_training() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("days.csv");
    let lookup_path = dir.path().join("weather.csv");
    write_file(&input, "dteday,cnt\n2011-01-01,10\n2011-01-02,20\n2011-01-03,30\n");
    // The lookup misses the last day entirely, so the join manufactures a
    // Missing cell that never appeared in the raw input.
    write_file(&lookup_path, "dteday,temp\n2011-01-01,0.2\n2011-01-02,0.6\n");

    let joiner =
        Joiner::build(&read_table(&lookup_path).unwrap(), &["dteday".to_string()]).unwrap();

    // Fit over the joined stream and impute downstream of the join.
    let fit_source = JoiningSource::new(
        CsvSource::open(
            &input,
            CsvReadConfig {
                chunk_size: 2,
                probe_rows: 0,
            },
        )
        .unwrap(),
        joiner.clone(),
    );
    let plan = ImputeAccumulator::fit_source(fit_source).unwrap();

    let raw = CsvSource::open(
        &input,
        CsvReadConfig {
            chunk_size: 2,
            probe_rows: 1,
        },
    )
    .unwrap();
    let source = ImputingSource::new(JoiningSource::new(raw, joiner), plan);
    let spec = LagSpec::new("cnt", vec![1]).unwrap();
    let mut driver = PipelineDriver::new(LagTransformEngine::new(spec), source, MemorySink::new());
    driver.run().unwrap();
    let table = driver.into_sink().into_table().unwrap();

    // The unmatched row carries the stream mean instead of a hole.
    let temp = &table.column("temp").unwrap().values;
    assert!(temp.iter().all(|v| !v.is_missing()));
    assert_eq!(temp[2], Value::Number(0.4));

    // Training no longer trips over the join's hole.
    let features = vec!["temp".to_string(), "cnt_1".to_string()];
    let encoder = DatasetEncoder::fit(&table, &features, "cnt").unwrap();
    assert!(encoder.encode(&table).is_ok());
}

#[test]
fn test_chunk_size_independence_through_the_full_stack() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("days.csv");
    write_file(&input, &main_csv());

    let reference = transform_lag_column(&input, 14, 0);
    for chunk_size in [1usize, 3, 5, 14] {
        for probe_rows in [0usize, 2] {
            assert_eq!(
                transform_lag_column(&input, chunk_size, probe_rows),
                reference,
                "chunk_size={chunk_size}, probe_rows={probe_rows}"
            );
        }
    }
}

fn transform_lag_column(input: &Path, chunk_size: usize, probe_rows: usize) -> Vec<Value> {
    let source = CsvSource::open(
        input,
        CsvReadConfig {
            chunk_size,
            probe_rows,
        },
    )
    .unwrap();
    let spec = LagSpec::new("cnt", vec![3]).unwrap();
    let mut driver = PipelineDriver::new(LagTransformEngine::new(spec), source, MemorySink::new());
    driver.run().unwrap();
    let table = driver.into_sink().into_table().unwrap();
    table.column("cnt_3").unwrap().values.clone()
}
