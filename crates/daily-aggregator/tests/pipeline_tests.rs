//! End-to-end daily pipeline and batch runs over in-memory collaborators.

use std::path::PathBuf;

use chrono::{Duration, NaiveDate};
use daily_aggregator::{
    output_grid, run_batch, AggregationError, DailyPipeline, DayRequest, PipelineConfig,
    VariableCatalog,
};
use grid_common::{Field, GridShape, IoError, SourceFile};
use test_utils::{
    assert_approx_eq, assert_grid_approx_eq, shapes, test_catalog_samples, test_date,
    MemoryGridSource, MemoryWriter, SampleBuilder, TEST_CATALOG_YAML,
};

fn catalog() -> VariableCatalog {
    VariableCatalog::from_yaml_str(TEST_CATALOG_YAML).unwrap()
}

const HOURS: [(f32, f32, f32, f32, f32, f32); 3] = [
    (290.0, 3.0, 4.0, 150.0, 101000.0, 0.5),
    (305.0, 3.0, 4.0, 250.0, 101650.0, 1.0),
    (297.0, 3.0, 4.0, 200.0, 101325.0, 1.5),
];

/// Source holding one day's hourly files under a date-specific prefix.
fn source_for(dates: &[NaiveDate]) -> (MemoryGridSource, Vec<DayRequest>) {
    let mut source = MemoryGridSource::new();
    let mut requests = Vec::new();
    for date in dates {
        let inputs = test_catalog_samples(&format!("/hourly/{}", date), shapes::SMALL, &HOURS)
            .into_iter()
            .map(|file| source.add(file))
            .collect();
        requests.push(DayRequest::new(*date, inputs, format!("/daily/{}.zarr", date)));
    }
    (source, requests)
}

#[test]
fn test_process_day_writes_all_outputs() {
    let (source, requests) = source_for(&[test_date()]);
    let pipeline =
        DailyPipeline::new(catalog(), PipelineConfig::default(), source, MemoryWriter::new())
            .unwrap();

    let report = pipeline.process_day(&requests[0]).unwrap();
    assert_eq!(report.samples_ingested, 3);
    assert!(report.skipped.is_empty());
    // 9 aggregated outputs + wind speed, mean temperature and ET
    assert_eq!(report.variables_written, 12);

    let set = pipeline.writer().get(&requests[0].output).unwrap();
    assert_eq!(set.dataset, "test");
    assert_eq!(set.date, test_date());
    assert_eq!(set.shape, shapes::SMALL);
    assert_eq!(set.samples, 3);

    assert_grid_approx_eq!(*output_grid(&set, "TMAX").unwrap(), 305.0, 1e-4);
    assert_grid_approx_eq!(*output_grid(&set, "TMIN").unwrap(), 290.0, 1e-4);
    assert_grid_approx_eq!(*output_grid(&set, "AVG_TEMP").unwrap(), 297.5, 1e-4);
    assert_grid_approx_eq!(*output_grid(&set, "WIND_SPEED").unwrap(), 5.0, 1e-4);
    assert_grid_approx_eq!(*output_grid(&set, "SW").unwrap(), 200.0, 1e-3);
    assert_grid_approx_eq!(*output_grid(&set, "APCP").unwrap(), 3.0, 1e-5);
    assert!(set.get("CAPE").is_none());
    assert!(matches!(set.field("lat"), Some(Field::Axis(_))));

    let et = output_grid(&set, "ET").unwrap();
    assert_eq!(et.fill_count(), 0);
    assert!(et.data().iter().all(|v| v.is_finite() && *v >= 0.0));
}

#[test]
fn test_output_attributes() {
    let (source, requests) = source_for(&[test_date()]);
    let pipeline =
        DailyPipeline::new(catalog(), PipelineConfig::default(), source, MemoryWriter::new())
            .unwrap();
    pipeline.process_day(&requests[0]).unwrap();
    let set = pipeline.writer().get(&requests[0].output).unwrap();

    let tmax = &set.get("TMAX").unwrap().attributes;
    assert_eq!(tmax["units"], "K");
    assert_eq!(tmax["long_name"], "Maximum Temperature");
    assert_eq!(tmax["forecast_time_units"], "daily");
    assert!(!tmax.contains_key("_FillValue"));

    let et = &set.get("ET").unwrap().attributes;
    assert_eq!(et["units"], "mm/day");
    let wind = &set.get("WIND_SPEED").unwrap().attributes;
    assert_eq!(wind["units"], "m/s");
}

#[test]
fn test_unreadable_hour_reduces_sample_count() {
    let (source, requests) = source_for(&[test_date()]);
    let broken = PathBuf::from("/hourly/2018-01-01/03.zarr");
    let source = source.corrupt(&broken);
    let mut request = requests[0].clone();
    request.inputs.push(broken.clone());
    request.inputs.push(PathBuf::from("/hourly/2018-01-01/missing.zarr"));

    let pipeline =
        DailyPipeline::new(catalog(), PipelineConfig::default(), source, MemoryWriter::new())
            .unwrap();
    let report = pipeline.process_day(&request).unwrap();

    assert_eq!(report.samples_ingested, 3);
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(report.skipped[0].path, broken);
    assert!(report.skipped[0].reason.contains("corrupt"));

    let set = pipeline.writer().get(&request.output).unwrap();
    // Still averaged over the three readable hours
    assert_grid_approx_eq!(*output_grid(&set, "SW").unwrap(), 200.0, 1e-3);
}

#[test]
fn test_short_day_is_partial_but_succeeds() {
    let (source, requests) = source_for(&[test_date()]);
    let catalog = VariableCatalog::from_yaml_str(
        &TEST_CATALOG_YAML.replace("samples_per_day: 3", "samples_per_day: 24"),
    )
    .unwrap();
    assert_eq!(catalog.samples_per_day, 24);

    let pipeline =
        DailyPipeline::new(catalog, PipelineConfig::default(), source, MemoryWriter::new())
            .unwrap();
    let day = pipeline
        .aggregate_day(requests[0].date, &requests[0].inputs)
        .unwrap();

    assert_eq!(day.samples_ingested, 3);
    assert_eq!(day.min_samples, 3);
    assert!(day.min_samples < 24);
    assert_grid_approx_eq!(*output_grid(&day.grids, "SW").unwrap(), 200.0, 1e-3);
}

#[test]
fn test_variable_missing_from_one_hour_makes_day_partial() {
    let mut files = test_catalog_samples("/hourly/2018-01-01", shapes::SMALL, &HOURS);
    let full = files.pop().unwrap();
    let mut thin = SourceFile::new(full.path());
    for name in full.names().into_iter().filter(|name| *name != "SW") {
        let variable = full.get(name).unwrap();
        thin.insert(name, variable.field.clone(), variable.attributes.clone());
    }
    files.push(thin);

    let mut source = MemoryGridSource::new();
    let inputs: Vec<PathBuf> = files.into_iter().map(|file| source.add(file)).collect();
    let pipeline =
        DailyPipeline::new(catalog(), PipelineConfig::default(), source, MemoryWriter::new())
            .unwrap();
    let day = pipeline.aggregate_day(test_date(), &inputs).unwrap();

    // Every file arrived, but SW was only seen twice
    assert_eq!(day.samples_ingested, 3);
    assert_eq!(day.min_samples, 2);
    assert_grid_approx_eq!(*output_grid(&day.grids, "SW").unwrap(), 200.0, 1e-3);
}

#[test]
fn test_no_readable_hour_is_empty_accumulation() {
    let source = MemoryGridSource::new().corrupt("/hourly/a.zarr");
    let pipeline =
        DailyPipeline::new(catalog(), PipelineConfig::default(), source, MemoryWriter::new())
            .unwrap();
    let request = DayRequest::new(
        test_date(),
        vec![PathBuf::from("/hourly/a.zarr"), PathBuf::from("/hourly/b.zarr")],
        "/daily/out.zarr",
    );

    let err = pipeline.process_day(&request).unwrap_err();
    assert!(matches!(err, AggregationError::EmptyAccumulation(_)));
    assert!(pipeline.writer().written().is_empty());
}

#[test]
fn test_write_error_is_propagated() {
    let (source, requests) = source_for(&[test_date()]);
    let writer = MemoryWriter::new().failing_on(&requests[0].output);
    let pipeline = DailyPipeline::new(catalog(), PipelineConfig::default(), source, writer).unwrap();

    let err = pipeline.process_day(&requests[0]).unwrap_err();
    assert!(matches!(err, AggregationError::Io(IoError::WriteError { .. })));
    assert_eq!(err.kind(), "write_error");
}

#[test]
fn test_latitude_length_must_match_rows() {
    let shape = GridShape::new(2, 2);
    let file = SampleBuilder::new("/h/00", shape)
        .uniform("T", 290.0)
        .uniform("U", 1.0)
        .uniform("V", 1.0)
        .uniform("SW", 100.0)
        .uniform("PRES", 100000.0)
        .uniform("APCP", 0.0)
        .axis("lat", vec![10.0, 20.0, 30.0])
        .axis("lon", vec![1.0, 2.0])
        .build();
    let mut source = MemoryGridSource::new();
    let path = source.add(file);

    let pipeline =
        DailyPipeline::new(catalog(), PipelineConfig::default(), source, MemoryWriter::new())
            .unwrap();
    let err = pipeline.aggregate_day(test_date(), &[path]).unwrap_err();
    assert!(matches!(err, AggregationError::ShapeMismatch { ref variable, .. } if variable == "lat"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = PipelineConfig::default();
    config.albedo = 1.5;
    let result = DailyPipeline::new(catalog(), config, MemoryGridSource::new(), MemoryWriter::new());
    assert!(matches!(result, Err(AggregationError::InvalidConfig(_))));
}

#[test]
fn test_albedo_reduces_et() {
    let (source, requests) = source_for(&[test_date()]);
    let bare = DailyPipeline::new(catalog(), PipelineConfig::default(), &source, MemoryWriter::new())
        .unwrap();
    let mut config = PipelineConfig::default();
    config.albedo = 0.23;
    let grass = DailyPipeline::new(catalog(), config, &source, MemoryWriter::new()).unwrap();

    let a = bare.aggregate_day(test_date(), &requests[0].inputs).unwrap();
    let b = grass.aggregate_day(test_date(), &requests[0].inputs).unwrap();
    let et_a = output_grid(&a.grids, "ET").unwrap().data()[0];
    let et_b = output_grid(&b.grids, "ET").unwrap().data()[0];
    assert!(et_b < et_a);
}

// ============================================================================
// Batch runs
// ============================================================================

#[test]
fn test_batch_isolates_failing_day() {
    let start = NaiveDate::from_ymd_opt(2018, 7, 1).unwrap();
    let dates: Vec<NaiveDate> = (0..4).map(|i| start + Duration::days(i)).collect();
    let (source, mut requests) = source_for(&dates);

    // Day 2 has no readable input at all
    requests[2].inputs = vec![PathBuf::from("/hourly/nowhere.zarr")];
    requests.reverse();

    let mut config = PipelineConfig::default();
    config.workers = 2;
    let pipeline = DailyPipeline::new(catalog(), config, source, MemoryWriter::new()).unwrap();

    let outcomes = run_batch(&pipeline, requests).unwrap();
    assert_eq!(outcomes.len(), 4);
    let returned: Vec<NaiveDate> = outcomes.iter().map(|o| o.date).collect();
    assert_eq!(returned, dates);

    assert!(outcomes[0].is_ok());
    assert!(outcomes[1].is_ok());
    assert!(matches!(
        outcomes[2].result,
        Err(AggregationError::EmptyAccumulation(_))
    ));
    assert!(outcomes[3].is_ok());
    assert_eq!(pipeline.writer().written().len(), 3);
}

#[test]
fn test_batch_days_share_no_state() {
    let dates = [test_date(), test_date() + Duration::days(1)];
    let (source, requests) = source_for(&dates);
    let pipeline =
        DailyPipeline::new(catalog(), PipelineConfig::default(), source, MemoryWriter::new())
            .unwrap();

    let outcomes = run_batch(&pipeline, requests.clone()).unwrap();
    for outcome in &outcomes {
        let report = outcome.result.as_ref().unwrap();
        assert_eq!(report.samples_ingested, 3);
    }
    let first = pipeline.writer().get(&requests[0].output).unwrap();
    let second = pipeline.writer().get(&requests[1].output).unwrap();
    let apcp_a = output_grid(&first, "APCP").unwrap().data()[0];
    let apcp_b = output_grid(&second, "APCP").unwrap().data()[0];
    assert_approx_eq!(apcp_a, 3.0, 1e-6);
    assert_eq!(apcp_a, apcp_b);
    // Different days, different solar geometry
    assert_ne!(
        output_grid(&first, "ET").unwrap().data()[0],
        output_grid(&second, "ET").unwrap().data()[0]
    );
}
