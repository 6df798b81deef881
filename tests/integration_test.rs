use std::path::Path;

use amapi_bridge::abi::{ApiInitOptions, InitOptions, VersionRecord};
use amapi_bridge::config::{HarnessConfig, LogLevel, ReportFormat};
use amapi_bridge::{BindingError, BindingManager, Harness, DEFAULT_MODULE_PATH};

#[test]
fn test_unbound_calls_fail_fast() {
    let manager = BindingManager::new();
    assert!(!manager.is_bound());
    assert_eq!(manager.module_path(), Path::new(DEFAULT_MODULE_PATH));

    // 未加载时所有入口点都返回 NotBound
    assert!(matches!(manager.api_version(), Err(BindingError::NotBound { .. })));
    assert!(matches!(manager.is_ready(), Err(BindingError::NotBound { .. })));
    assert!(matches!(
        manager.post_command("showmap %lat %lon 1000", false),
        Err(BindingError::NotBound { .. })
    ));
    assert!(matches!(manager.meters_to_scale(100), Err(BindingError::NotBound { .. })));
    assert!(manager.end_session().unwrap_err().requires_module());
}

#[test]
fn test_bogus_module_is_rejected() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("tpcAmApi.dll");
    std::fs::write(&path, b"not a shared library")?;

    let harness = Harness::new();
    let result = harness.select_module(&path);
    assert!(!result.ok);
    assert!(!harness.is_bound());
    assert!(result.message.is_some());

    // 失败后路径仍被记录，方便报告
    assert_eq!(harness.manager().module_path(), path);
    assert!(harness.manager().last_error().is_some());

    let report = harness.run_sweep(&HarnessConfig::default());
    assert!(!report.bound);
    assert_eq!(report.failures(), 1);
    Ok(())
}

#[test]
fn test_missing_module_then_unload() {
    let manager = BindingManager::new();
    let err = manager.load("/nonexistent/dir/tpcAmApi.dll").unwrap_err();
    assert!(matches!(err, BindingError::Load { .. }));

    // 未绑定时卸载是空操作
    manager.unload();
    manager.unload();
    assert!(!manager.is_bound());
}

#[test]
fn test_config_round_trip() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;

    let mut config = HarnessConfig::default();
    config.module.path = "C:\\AutoMapa\\tpcAmApi.dll".into();
    config.module.receive_timeout_ms = Some(5000);
    config.session.language = "en".to_string();
    config.session.fast_start = true;
    config.probe.include_session = true;
    config.probe.report_format = ReportFormat::Json;
    config.logging.level = LogLevel::Debug;
    config.validate()?;

    let toml_path = dir.path().join("amapi.toml");
    config.save_toml(&toml_path)?;
    assert_eq!(HarnessConfig::from_toml_file(&toml_path)?, config);

    let json_path = dir.path().join("amapi.json");
    config.save_json(&json_path)?;
    assert_eq!(HarnessConfig::from_json_file(&json_path)?, config);
    Ok(())
}

#[test]
fn test_invalid_session_config() {
    let mut config = HarnessConfig::default();
    config.session.language = "x".repeat(16);
    assert!(config.validate().is_ok());

    config.session.language = "x".repeat(17);
    assert!(config.validate().is_err());

    config.session.language = "pl".to_string();
    config.session.profile = "Łódź".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_descriptor_sizes() {
    assert_eq!(VersionRecord::ENCODED_LEN, 10);
    assert_eq!(InitOptions::ENCODED_LEN, std::mem::size_of::<ApiInitOptions>());

    let image = InitOptions::default().encode().unwrap();
    assert_eq!(image.len(), InitOptions::ENCODED_LEN);
    assert_eq!(&image[0..4], &[1, 0, 0, 0]);
    assert_eq!(&image[4..8], &60_000u32.to_le_bytes());

    let record = VersionRecord::new(7, 0, 1, 2, 1);
    assert_eq!(VersionRecord::decode(&record.encode()).unwrap(), record);
}
