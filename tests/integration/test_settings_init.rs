use tempfile::TempDir;
use topica::Settings;

#[test]
fn init_writes_a_loadable_template() {
    let dir = TempDir::new().unwrap();

    let path = Settings::init_config_file(dir.path(), false).unwrap();
    assert_eq!(path, dir.path().join(".topica").join("settings.toml"));

    let settings = Settings::load_from(&path).unwrap();
    assert_eq!(settings.embedding.model, "AllMiniLML6V2");
    assert_eq!(settings.embedding.batch_size, 32);
    assert_eq!(settings.clustering.max_k, 10);
    assert!(settings.clustering.k.is_none());
    assert_eq!(settings.extraction.batch_delay_ms, 1500);
    assert_eq!(settings.logging.level, "warn");
}

#[test]
fn saved_settings_round_trip_through_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.toml");

    let mut settings = Settings::default();
    settings.clustering.k = Some(4);
    settings.search.vector_boost = 1.5;
    settings.save(&path).unwrap();

    let loaded = Settings::load_from(&path).unwrap();
    assert_eq!(loaded.clustering.k, Some(4));
    assert!((loaded.search.vector_boost - 1.5).abs() < f32::EPSILON);
}
