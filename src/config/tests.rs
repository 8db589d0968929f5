use super::*;

#[test]
fn defaults_cover_every_section() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr, "127.0.0.1:8000".parse().unwrap());
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert_eq!(settings.database.url, None);
    assert_eq!(settings.database.max_connections.get(), 8);
    assert_eq!(settings.cache.backend, CacheBackend::Memory);
    assert!(settings.sync.enabled);
    assert_eq!(settings.sync.source_path, PathBuf::from("admin/menu.csv"));
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["tavola"]);
    assert!(args.command.is_none());
}

#[test]
fn sync_command_overrides_source_path() {
    let args = CliArgs::parse_from(["tavola", "sync", "exports/today.csv"]);
    let Some(Command::Sync(sync)) = args.command else {
        panic!("expected sync command");
    };

    let mut raw = RawSettings::default();
    raw.apply_sync_overrides(&sync);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.sync.source_path, PathBuf::from("exports/today.csv"));
}

#[test]
fn zero_port_is_rejected() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero port");
    assert!(matches!(err, LoadError::Invalid { key: "server.port", .. }));
}

#[test]
fn unknown_cache_backend_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.backend = Some("memcached".to_string());

    let err = Settings::from_raw(raw).expect_err("unknown backend");
    assert!(matches!(err, LoadError::Invalid { key: "cache.backend", .. }));
}

#[test]
fn redis_backend_requires_url() {
    let mut raw = RawSettings::default();
    raw.cache.backend = Some("redis".to_string());

    let err = Settings::from_raw(raw.clone()).expect_err("missing url");
    assert!(matches!(err, LoadError::Invalid { key: "cache.redis_url", .. }));

    raw.cache.redis_url = Some("redis://127.0.0.1:6379".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.cache.backend, CacheBackend::Redis);
}

#[test]
fn malformed_schedule_is_rejected() {
    let mut raw = RawSettings::default();
    raw.sync.schedule = Some("every fifteen seconds".to_string());

    let err = Settings::from_raw(raw).expect_err("bad cron");
    assert!(matches!(err, LoadError::Invalid { key: "sync.schedule", .. }));
}

#[test]
fn sync_can_be_disabled_from_cli() {
    let args = CliArgs::parse_from(["tavola", "serve", "--sync-enabled", "false"]);
    let Some(Command::Serve(serve)) = args.command else {
        panic!("expected serve command");
    };

    let mut raw = RawSettings::default();
    raw.apply_serve_overrides(&serve.overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(!settings.sync.enabled);
}
