//! 通过 libloading 加载 tests/native 下编译出的替身模块
//!
//! 替身模块由 build.rs 编译；没有 C 编译器时这些测试跳过。
//! 替身模块有进程内静态状态，完整入口点的检查集中在一个测试里。

use amapi_bridge::abi::{InitOptions, VersionRecord};
use amapi_bridge::config::HarnessConfig;
use amapi_bridge::{BindingError, BindingManager, Harness};

fn fixture(path: Option<&'static str>) -> Option<&'static str> {
    if path.is_none() {
        eprintln!("Native fixture not built, skipping test");
    }
    path
}

#[test]
fn test_full_entry_point_set() -> anyhow::Result<()> {
    let Some(path) = fixture(option_env!("AMAPI_FIXTURE_FULL")) else {
        return Ok(());
    };

    let manager = BindingManager::new();
    manager.load(path)?;
    assert!(manager.is_bound());
    assert!(manager.last_error().is_none());

    assert_eq!(manager.api_version()?, VersionRecord::new(1, 2, 3, 4, 5));
    assert_eq!(manager.installed_version()?, VersionRecord::new(10, 1, 200, 3, 1));
    assert_eq!(manager.install_path()?, "C:\\AutoMapa");
    assert_eq!(manager.current_language()?, "pl");
    manager.set_receive_timeout(5000)?;

    // 输出槽经由指针写回
    let options = InitOptions {
        language: "en".to_string(),
        map_path: "C:\\AutoMapa\\Maps".to_string(),
        ..InitOptions::default()
    };
    let start = manager.init_session(&options)?;
    assert!(start.process_created);
    assert!(manager.is_ready()?);
    assert_eq!(manager.current_language()?, "en");

    let quiet = InitOptions {
        start_if_not_running: false,
        language: "pl".to_string(),
        ..InitOptions::default()
    };
    assert!(!manager.init_session(&quiet)?.process_created);

    // 命令按字节原样传递
    assert!(manager.post_command("showmap %lat %lon 1000", false)?);
    assert!(!manager.post_command("showmap 52.2 21.0 1000", true)?);

    assert_eq!(manager.meters_to_scale(2000)?, 20.0);
    assert!(manager.close_application(true)?);
    assert!(!manager.close_application(false)?);

    manager.end_session()?;
    assert!(!manager.is_ready()?);

    // 原生侧拒绝的初始化选项
    let bad_timeout = InitOptions {
        timeout_ms: 1,
        ..InitOptions::default()
    };
    assert_eq!(manager.init_session(&bad_timeout), Err(BindingError::InitFailed));

    manager.unload();
    assert!(matches!(manager.api_version(), Err(BindingError::NotBound { .. })));

    // 诊断扫描走同一条路径
    let harness = Harness::new();
    assert!(harness.select_module(path).ok);
    let mut config = HarnessConfig::default();
    config.probe.include_session = true;
    let report = harness.run_sweep(&config);
    assert_eq!(report.failures(), 0, "{}", report);
    assert_eq!(report.entry("postCommand").map(|e| e.detail.as_str()), Some("PostCommand: true"));
    Ok(())
}

#[test]
fn test_partial_entry_point_set_is_rejected() {
    let Some(path) = fixture(option_env!("AMAPI_FIXTURE_PARTIAL")) else {
        return;
    };

    let manager = BindingManager::new();
    let err = manager.load(path).unwrap_err();
    match &err {
        BindingError::Load { reason, .. } => {
            assert_eq!(reason, "missing entry points: AmMetersToScale")
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(!manager.is_bound());
    assert_eq!(
        manager.last_error().as_deref(),
        Some("missing entry points: AmMetersToScale")
    );
    assert!(matches!(manager.meters_to_scale(100), Err(BindingError::NotBound { .. })));
}

#[test]
fn test_failed_reload_leaves_manager_unbound() {
    let (Some(full), Some(partial)) = (
        fixture(option_env!("AMAPI_FIXTURE_FULL")),
        fixture(option_env!("AMAPI_FIXTURE_PARTIAL")),
    ) else {
        return;
    };

    let manager = BindingManager::new();
    manager.load(full).unwrap();
    assert!(manager.is_bound());

    assert!(manager.load(partial).is_err());
    assert!(!manager.is_bound());
    assert!(matches!(manager.is_ready(), Err(BindingError::NotBound { .. })));
}
