use super::*;

#[test]
fn defaults_match_documented_values() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.to_string(), "127.0.0.1:3000");
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert!(settings.database.url.is_none());
    assert_eq!(settings.database.max_connections.get(), 10);
    assert_eq!(settings.database.acquire_timeout, Duration::from_secs(5));
    assert_eq!(settings.cache.backend, CacheBackendKind::Memory);
    assert_eq!(settings.cache.ttl, Duration::from_secs(30));
    assert_eq!(settings.cache.key_prefix, "posts:all");
    assert_eq!(settings.cache.projection, ListProjection::Summary);
    assert_eq!(settings.cache.op_timeout, Duration::from_millis(250));
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());
    raw.cache.ttl_seconds = Some(60);

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        cache_ttl_seconds: Some(5),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.cache.ttl, Duration::from_secs(5));
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
fn blank_database_url_is_treated_as_missing() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn zero_port_is_rejected() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(0);

    match Settings::from_raw(raw) {
        Err(LoadError::Invalid { key, .. }) => assert_eq!(key, "server.port"),
        other => panic!("expected invalid port, got {other:?}"),
    }
}

#[test]
fn zero_ttl_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.ttl_seconds = Some(0);

    match Settings::from_raw(raw) {
        Err(LoadError::Invalid { key, .. }) => assert_eq!(key, "cache.ttl_seconds"),
        other => panic!("expected invalid ttl, got {other:?}"),
    }
}

#[test]
fn redis_backend_requires_url() {
    let mut raw = RawSettings::default();
    raw.cache.backend = Some("redis".to_string());

    match Settings::from_raw(raw.clone()) {
        Err(LoadError::Invalid { key, .. }) => assert_eq!(key, "cache.redis_url"),
        other => panic!("expected missing redis url, got {other:?}"),
    }

    raw.cache.redis_url = Some("redis://127.0.0.1:6379/".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.cache.backend, CacheBackendKind::Redis);
}

#[test]
fn unknown_backend_and_projection_are_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.backend = Some("memcached".to_string());
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "cache.backend",
            ..
        })
    ));

    let mut raw = RawSettings::default();
    raw.cache.projection = Some("everything".to_string());
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "cache.projection",
            ..
        })
    ));
}

#[test]
fn full_projection_from_file_value() {
    let mut raw = RawSettings::default();
    raw.cache.projection = Some("full".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.cache.projection, ListProjection::Full);
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["postcache"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "postcache",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--database-url",
        "postgres://override",
        "--cache-backend",
        "none",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(
                serve.overrides.database_url.as_deref(),
                Some("postgres://override")
            );
            assert_eq!(serve.overrides.cache_backend.as_deref(), Some("none"));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_migrate_arguments() {
    let args = CliArgs::parse_from([
        "postcache",
        "migrate",
        "--database-url",
        "postgres://example",
    ]);

    match args.command.expect("migrate command") {
        Command::Migrate(migrate) => {
            assert_eq!(migrate.database_url.as_deref(), Some("postgres://example"));
        }
        _ => panic!("wrong command parsed"),
    }
}
