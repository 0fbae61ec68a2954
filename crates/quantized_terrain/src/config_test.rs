use super::*;

#[test]
fn test_defaults() {
  let config = ProviderConfig::default();
  assert_eq!(config.tile_size, 256);
  assert_eq!(config.max_zoom, 15);
  assert!(!config.skip_odd_levels);
  assert_eq!(config.detail_scalar, 4.0);
  assert_eq!(config.minimum_error, 0.1);
  assert_eq!(config.min_zoom_level, 3);
  assert_eq!(config.max_concurrent_tiles, 5);
  assert!(config.fill_poles);
  assert_eq!(
    config.encoding,
    HeightEncoding::TerrainRgb {
      interval: 10.0,
      offset: 10000.0
    }
  );
  assert_eq!(config.ellipsoid.to_ellipsoid(), Ellipsoid::wgs84());
  assert!(config.validate().is_ok());
}

#[test]
fn test_empty_toml_is_default() {
  assert_eq!(ProviderConfig::from_toml_str("").unwrap(), ProviderConfig::default());
}

#[test]
fn test_partial_toml() {
  let config = ProviderConfig::from_toml_str(
    r#"
      tile_size = 512
      skip_odd_levels = true
      worker_threads = 0

      [encoding]
      kind = "float32"

      [ellipsoid]
      radii = [1737400.0, 1737400.0, 1737400.0]
    "#,
  )
  .unwrap();
  assert_eq!(config.tile_size, 512);
  assert!(config.skip_odd_levels);
  assert_eq!(config.worker_threads, 0);
  assert_eq!(config.encoding, HeightEncoding::Float32);
  assert_eq!(config.ellipsoid.to_ellipsoid().maximum_radius(), 1737400.0);
  assert_eq!(config.max_zoom, 15);
}

#[test]
fn test_unknown_key_rejected() {
  let err = ProviderConfig::from_toml_str("tile_sise = 256").unwrap_err();
  assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_validation_rules() {
  let cases = [
    (ProviderConfig::default().with_tile_size(300), "tile_size"),
    (ProviderConfig::default().with_tile_size(8192), "tile_size"),
    (ProviderConfig::default().with_tile_size(65536), "tile_size"),
    (ProviderConfig::default().with_detail_scalar(0.0), "detail_scalar"),
    (ProviderConfig::default().with_minimum_error(-1.0), "minimum_error"),
    (ProviderConfig::default().with_max_concurrent_tiles(0), "max_concurrent_tiles"),
    (ProviderConfig::default().with_max_tile_width(0.0), "max_tile_width"),
    (
      ProviderConfig::default().with_encoding(HeightEncoding::TerrainRgb {
        interval: 0.0,
        offset: 0.0,
      }),
      "encoding.interval",
    ),
    (
      ProviderConfig::default().with_ellipsoid_radii([1.0, -1.0, 1.0]),
      "ellipsoid.radii",
    ),
  ];
  for (config, expected) in cases {
    match config.validate() {
      Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected),
      other => panic!("expected {expected} to be rejected, got {other:?}"),
    }
  }
}

#[test]
fn test_invalid_toml_value_rejected() {
  let err = ProviderConfig::from_toml_str("detail_scalar = -2.0").unwrap_err();
  assert!(matches!(err, ConfigError::Invalid { field: "detail_scalar", .. }));
}

#[test]
fn test_load_missing_file() {
  let err = ProviderConfig::load("/nonexistent/provider.toml").unwrap_err();
  assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn test_builders() {
  let config = ProviderConfig::default()
    .with_max_zoom(12)
    .with_min_zoom_level(1)
    .with_worker_threads(2)
    .with_fill_poles(false)
    .with_limit_edge_length(false)
    .with_skip_odd_levels(true);
  assert_eq!(config.max_zoom, 12);
  assert_eq!(config.min_zoom_level, 1);
  assert_eq!(config.worker_threads, 2);
  assert!(!config.fill_poles);
  assert!(!config.limit_edge_length);
  assert!(config.skip_odd_levels);
  assert!(config.validate().is_ok());
}

#[test]
fn test_largest_tile_size_accepted() {
  assert!(ProviderConfig::default().with_tile_size(4096).validate().is_ok());
}
