use super::*;

use crate::app::exec::runner::CommandOutput;

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::OnceLock<std::sync::Mutex<()>> = std::sync::OnceLock::new();
    LOCK.get_or_init(|| std::sync::Mutex::new(()))
        .lock()
        .expect("env lock")
}

fn ok_output(stdout: &str) -> CommandOutput {
    CommandOutput {
        stdout: stdout.to_string(),
        stderr: String::new(),
        exit_code: Some(0),
    }
}

#[test]
fn resolve_trace_id_passes_through_and_generates() {
    assert_eq!(
        resolve_trace_id(Some("trace-abc".to_string())),
        "trace-abc"
    );
    let generated = resolve_trace_id(Some("   ".to_string()));
    assert!(!generated.trim().is_empty());
    assert_ne!(resolve_trace_id(None), resolve_trace_id(None));
}

#[test]
fn ensure_non_empty_rejects_blank() {
    let err = ensure_non_empty("  ", "serial", "trace-1").expect_err("expected error");
    assert_eq!(err.code, "ERR_VALIDATION");
    assert_eq!(err.trace_id, "trace-1");
    assert!(err.error.contains("serial"));

    assert!(ensure_non_empty("value", "serial", "trace-1").is_ok());
}

#[test]
fn reboot_args_cover_all_modes() {
    assert_eq!(reboot_args(""), vec!["reboot"]);
    assert_eq!(reboot_args("  "), vec!["reboot"]);
    assert_eq!(reboot_args("recovery"), vec!["reboot", "recovery"]);
    assert_eq!(reboot_args("bootloader"), vec!["reboot", "bootloader"]);
}

#[test]
fn flash_inputs_must_be_non_empty() {
    let err = validate_flash_inputs("", "/tmp/boot.img", "trace-2").expect_err("empty partition");
    assert_eq!(err.code, "ERR_VALIDATION");
    assert!(err.error.contains("cannot be empty"));

    let err = validate_flash_inputs("boot", "  ", "trace-2").expect_err("empty path");
    assert_eq!(err.code, "ERR_VALIDATION");

    assert!(validate_flash_inputs("boot", "/tmp/boot.img", "trace-2").is_ok());
}

#[test]
fn install_inputs_require_existing_file() {
    let err = validate_install_inputs("", "trace-3").expect_err("empty path");
    assert_eq!(err.code, "ERR_VALIDATION");

    let err = validate_install_inputs("/this/path/does/not/exist/app.apk", "trace-3")
        .expect_err("missing file");
    assert_eq!(err.code, "ERR_VALIDATION");
    assert!(err.error.contains("not found"));

    let tmp = tempfile::NamedTempFile::new().expect("tmp file");
    assert!(validate_install_inputs(&tmp.path().to_string_lossy(), "trace-3").is_ok());
}

#[test]
fn load_device_info_reads_props_and_battery() {
    let info = load_device_info(
        |args, _timeout| {
            let joined = args.join(" ");
            if joined.contains("ro.product.model") {
                Ok(ok_output("Pixel 7\n"))
            } else if joined.contains("ro.build.version.release") {
                Ok(ok_output("14\n"))
            } else if joined.contains("ro.build.id") {
                Ok(ok_output("UQ1A.240105.004\n"))
            } else if joined.contains("dumpsys battery") {
                Ok(ok_output("  level: 77\n"))
            } else {
                panic!("unexpected command: {joined}")
            }
        },
        Duration::from_secs(5),
    );

    assert_eq!(info.model, "Pixel 7");
    assert_eq!(info.android_version, "14");
    assert_eq!(info.build_number, "UQ1A.240105.004");
    assert_eq!(info.battery_level, "77%");
}

#[test]
fn load_device_info_degrades_to_not_available() {
    let info = load_device_info(
        |args, _timeout| {
            let joined = args.join(" ");
            if joined.contains("dumpsys battery") {
                Ok(ok_output("no level line here"))
            } else {
                Err(AppError::system("device offline", "trace-4"))
            }
        },
        Duration::from_secs(5),
    );

    assert_eq!(info.model, "N/A");
    assert_eq!(info.android_version, "N/A");
    assert_eq!(info.build_number, "N/A");
    assert_eq!(info.battery_level, "N/A");
}

#[test]
fn load_device_info_treats_nonzero_exit_as_not_available() {
    let info = load_device_info(
        |_args, _timeout| {
            Ok(CommandOutput {
                stdout: "garbage".to_string(),
                stderr: "error: no devices/emulators found".to_string(),
                exit_code: Some(1),
            })
        },
        Duration::from_secs(5),
    );

    assert_eq!(info.model, "N/A");
    assert_eq!(info.battery_level, "N/A");
}

#[test]
fn check_tool_inner_reports_unrunnable_program() {
    // A bare override name skips the bundled-binary search, so the failure we
    // exercise is the spawn itself.
    let info = check_tool_inner(
        "adb",
        "adbkit-test-no-such-tool",
        &["version".to_string()],
        "trace-5",
    );
    assert!(!info.available);
    assert_eq!(info.command_path, "adbkit-test-no-such-tool");
    assert!(info.error.expect("error").contains("Failed to spawn"));
}

#[test]
fn check_tool_inner_reports_missing_bundled_binary() {
    let info = check_tool_inner("fastboot", "", &["--version".to_string()], "trace-6");
    assert!(!info.available);
    assert!(info
        .error
        .expect("error")
        .contains("binary 'fastboot' not found"));
}

#[test]
fn config_commands_round_trip() {
    let _guard = env_lock();
    let tmp = tempfile::TempDir::new().expect("tmp");
    let config_path = tmp.path().join("config.json");
    std::env::set_var("ADBKIT_CONFIG_PATH", &config_path);

    let response = get_config(Some("trace-7".to_string())).expect("defaults");
    assert_eq!(response.trace_id, "trace-7");
    assert_eq!(response.data, AppConfig::default());

    let mut config = response.data;
    config.tools.adb_path = "/opt/platform-tools/adb".to_string();
    save_app_config(config.clone(), Some("trace-7".to_string())).expect("save");

    let reloaded = get_config(Some("trace-7".to_string())).expect("reload");
    assert_eq!(reloaded.data.tools.adb_path, "/opt/platform-tools/adb");

    let reset = reset_config(Some("trace-7".to_string())).expect("reset");
    assert_eq!(reset.data, AppConfig::default());

    std::env::remove_var("ADBKIT_CONFIG_PATH");
}

#[test]
fn flash_partition_rejects_empty_inputs_before_spawning() {
    let _guard = env_lock();
    let tmp = tempfile::TempDir::new().expect("tmp");
    std::env::set_var("ADBKIT_CONFIG_PATH", tmp.path().join("config.json"));

    let err = flash_partition(
        String::new(),
        String::new(),
        Some("trace-8".to_string()),
    )
    .expect_err("expected validation error");
    assert_eq!(err.code, "ERR_VALIDATION");
    assert_eq!(err.trace_id, "trace-8");

    std::env::remove_var("ADBKIT_CONFIG_PATH");
}

#[test]
fn install_package_rejects_missing_file_before_spawning() {
    let _guard = env_lock();
    let tmp = tempfile::TempDir::new().expect("tmp");
    std::env::set_var("ADBKIT_CONFIG_PATH", tmp.path().join("config.json"));

    let err = install_package(
        tmp.path().join("missing.apk").to_string_lossy().to_string(),
        Some("trace-9".to_string()),
    )
    .expect_err("expected validation error");
    assert_eq!(err.code, "ERR_VALIDATION");
    assert!(err.error.contains("not found"));

    std::env::remove_var("ADBKIT_CONFIG_PATH");
}

#[test]
fn list_devices_fails_with_dependency_error_when_adb_is_absent() {
    let _guard = env_lock();
    let tmp = tempfile::TempDir::new().expect("tmp");
    std::env::set_var("ADBKIT_CONFIG_PATH", tmp.path().join("config.json"));

    let err = list_devices(Some("trace-10".to_string())).expect_err("expected missing adb");
    assert_eq!(err.code, "ERR_DEPENDENCY");
    assert!(err.error.contains("binary 'adb' not found"));

    std::env::remove_var("ADBKIT_CONFIG_PATH");
}
