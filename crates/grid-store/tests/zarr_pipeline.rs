//! A full day through the pipeline with Zarr on both ends.

use daily_aggregator::{DailyPipeline, DayRequest, PipelineConfig, VariableCatalog};
use grid_common::{Field, GridSource};
use grid_store::{StoreConfig, ZarrDailyWriter, ZarrGridSource};
use tempfile::TempDir;
use test_utils::{assert_grid_approx_eq, shapes, test_catalog_samples, test_date, TEST_CATALOG_YAML};

#[test]
fn test_day_from_zarr_to_zarr() {
    let dir = TempDir::new().unwrap();
    let hourly = dir.path().join("hourly");
    let staging = ZarrDailyWriter::new(StoreConfig::uncompressed()).unwrap();

    let hours = [
        (290.0, 3.0, 4.0, 150.0, 101000.0, 0.5),
        (305.0, 3.0, 4.0, 250.0, 101650.0, 1.0),
        (297.0, 3.0, 4.0, 200.0, 101325.0, 1.5),
    ];
    let mut inputs = Vec::new();
    for file in test_catalog_samples(hourly.to_str().unwrap(), shapes::SMALL, &hours) {
        staging.write_source_file(file.path(), &file).unwrap();
        inputs.push(file.path().to_path_buf());
    }
    // One hour that never arrived
    inputs.push(hourly.join("03.zarr"));

    let catalog = VariableCatalog::from_yaml_str(TEST_CATALOG_YAML).unwrap();
    let source = ZarrGridSource::new(catalog.source_names());
    let pipeline = DailyPipeline::new(
        catalog,
        PipelineConfig::default(),
        source,
        ZarrDailyWriter::default(),
    )
    .unwrap();

    let output = dir.path().join("daily").join("2018-01-01.zarr");
    let report = pipeline
        .process_day(&DayRequest::new(test_date(), inputs, &output))
        .unwrap();
    assert_eq!(report.samples_ingested, 3);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.variables_written, 12);

    let reader = ZarrGridSource::all();
    let day = reader.open(&output).unwrap();
    assert!(!day.contains("CAPE"));
    let grid = |name: &str| day.field(name).and_then(Field::as_grid).unwrap().clone();
    assert_grid_approx_eq!(grid("TMAX"), 305.0, 1e-4);
    assert_grid_approx_eq!(grid("TMIN"), 290.0, 1e-4);
    assert_grid_approx_eq!(grid("WIND_SPEED"), 5.0, 1e-4);
    assert_grid_approx_eq!(grid("APCP"), 3.0, 1e-5);
    assert!(grid("ET").data().iter().all(|v| v.is_finite() && *v >= 0.0));
    assert_eq!(day.get("ET").unwrap().attributes["units"], "mm/day");
    assert_eq!(day.get("TMAX").unwrap().attributes["forecast_time_units"], "daily");

    let root = reader.root_attributes(&output).unwrap();
    assert_eq!(root["dataset"], "test");
    assert_eq!(root["samples"], 3);
}
