//! Catalog loading and validation.

use std::io::Write;

use daily_aggregator::{AggregationError, AggregationRole, Dataset, VariableCatalog};
use test_utils::TEST_CATALOG_YAML;

fn invalid(yaml: &str) -> String {
    match VariableCatalog::from_yaml_str(yaml) {
        Err(AggregationError::InvalidCatalog(msg)) => msg,
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("catalog should be rejected"),
    }
}

#[test]
fn test_fixture_catalog_loads() {
    let catalog = VariableCatalog::from_yaml_str(TEST_CATALOG_YAML).unwrap();
    assert_eq!(catalog.samples_per_day, 3);
    assert_eq!(catalog.active_specs().count(), 9);
    assert_eq!(
        catalog.source_names(),
        vec!["APCP", "PRES", "SW", "T", "U", "V", "lat", "lon"]
    );
}

#[test]
fn test_nldas_catalog_matches_hourly_product() {
    let catalog = Dataset::Nldas.catalog().unwrap();
    assert_eq!(catalog.samples_per_day, 24);
    let roles: Vec<_> = catalog
        .variables
        .iter()
        .filter(|s| s.name == "SPF_H_110_HTGL")
        .map(|s| s.role)
        .collect();
    assert_eq!(
        roles,
        vec![
            AggregationRole::SumThenAverage,
            AggregationRole::RunningMax,
            AggregationRole::RunningMin
        ]
    );
    assert_eq!(catalog.derived.pressure.as_deref(), Some("PRES_110_SFC"));
    assert_eq!(catalog.outputs.mean_temperature, "AVG_MAX_MIN_TMP_110_HTGL");
}

#[test]
fn test_gfs_catalog_uses_dew_point() {
    let catalog = Dataset::Gfs.catalog().unwrap();
    assert_eq!(catalog.derived.dew_point.as_deref(), Some("DPT_P0_L103_GLL0"));
    assert_eq!(catalog.shape.map(|s| (s.rows, s.cols)), Some((361, 720)));
}

#[test]
fn test_catalog_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(TEST_CATALOG_YAML.as_bytes()).unwrap();
    let catalog = VariableCatalog::from_yaml_file(file.path()).unwrap();
    assert_eq!(catalog.dataset, "test");

    let err = VariableCatalog::from_yaml_file("/nonexistent/catalog.yaml").unwrap_err();
    assert!(matches!(err, AggregationError::InvalidCatalog(_)));
}

#[test]
fn test_duplicate_output_rejected() {
    let yaml = TEST_CATALOG_YAML.replace("output: TMIN", "output: TMAX");
    assert!(invalid(&yaml).contains("TMAX"));
}

#[test]
fn test_derived_output_collision_rejected() {
    let yaml = TEST_CATALOG_YAML.replace("wind_speed: WIND_SPEED", "wind_speed: U");
    assert!(invalid(&yaml).contains("collides"));
}

#[test]
fn test_wrong_role_binding_rejected() {
    let yaml = TEST_CATALOG_YAML.replace("max_temperature: TMAX", "max_temperature: TMIN");
    assert!(invalid(&yaml).contains("max_temperature"));

    let yaml = TEST_CATALOG_YAML.replace("latitude: lat", "latitude: U");
    assert!(invalid(&yaml).contains("latitude"));
}

#[test]
fn test_binding_to_ignored_variable_rejected() {
    let yaml = TEST_CATALOG_YAML.replace("shortwave_radiation: SW", "shortwave_radiation: CAPE");
    assert!(invalid(&yaml).contains("unknown output"));
}

#[test]
fn test_zero_samples_per_day_rejected() {
    let yaml = TEST_CATALOG_YAML.replace("samples_per_day: 3", "samples_per_day: 0");
    assert!(invalid(&yaml).contains("samples_per_day"));
}

#[test]
fn test_unknown_role_rejected() {
    let yaml = TEST_CATALOG_YAML.replace("role: ignore", "role: median");
    invalid(&yaml);
}
