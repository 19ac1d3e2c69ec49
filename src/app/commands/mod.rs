use std::path::Path;
use std::time::Duration;

use tauri::AppHandle;
use tauri_plugin_dialog::DialogExt;
use tracing::{info, warn};
use uuid::Uuid;

use crate::app::adb::parse::{parse_adb_devices, parse_battery_percent};
use crate::app::config::{load_config, save_config, AppConfig};
use crate::app::diagnostics;
use crate::app::error::AppError;
use crate::app::exec::locator::{locate_tool, normalize_tool_path, ADB, FASTBOOT};
use crate::app::exec::runner::{run_checked, run_tool_with_timeout, CommandOutput};
use crate::app::fastboot::parse::{parse_fastboot_devices, parse_getvar_value};
use crate::app::models::{CommandResponse, Device, DeviceInfo, ToolInfo};

#[cfg(test)]
mod tests;

const NOT_AVAILABLE: &str = "N/A";

fn resolve_trace_id(input: Option<String>) -> String {
    input
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn ensure_non_empty(value: &str, field: &str, trace_id: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(
            format!("{field} is required"),
            trace_id,
        ));
    }
    Ok(())
}

struct ToolContext {
    program: String,
    command_timeout: Duration,
    flash_timeout: Duration,
}

fn tool_context(name: &str, trace_id: &str) -> Result<ToolContext, AppError> {
    let config = load_config(trace_id)?;
    let override_path = if name == ADB {
        &config.tools.adb_path
    } else {
        &config.tools.fastboot_path
    };
    let program = locate_tool(name, override_path, trace_id)?;
    Ok(ToolContext {
        program,
        command_timeout: Duration::from_secs(config.tools.command_timeout_secs),
        flash_timeout: Duration::from_secs(config.tools.flash_timeout_secs),
    })
}

fn adb_context(trace_id: &str) -> Result<ToolContext, AppError> {
    tool_context(ADB, trace_id)
}

fn fastboot_context(trace_id: &str) -> Result<ToolContext, AppError> {
    tool_context(FASTBOOT, trace_id)
}

fn check_tool_inner(
    name: &str,
    override_path: &str,
    version_args: &[String],
    trace_id: &str,
) -> ToolInfo {
    let program = match locate_tool(name, override_path, trace_id) {
        Ok(program) => program,
        Err(err) => {
            return ToolInfo {
                available: false,
                version_output: String::new(),
                command_path: String::new(),
                error: Some(err.error),
            }
        }
    };

    match run_tool_with_timeout(&program, version_args, Duration::from_secs(5), trace_id) {
        Ok(output) => {
            let mut version_output = output.stdout.trim().to_string();
            let stderr = output.stderr.trim();
            if !stderr.is_empty() {
                if !version_output.is_empty() {
                    version_output.push('\n');
                }
                version_output.push_str(stderr);
            }
            let available = output.success();
            ToolInfo {
                available,
                version_output,
                command_path: program,
                error: if available {
                    None
                } else if stderr.is_empty() {
                    Some(format!("{name} returned a non-zero exit code"))
                } else {
                    Some(stderr.to_string())
                },
            }
        }
        Err(err) => ToolInfo {
            available: false,
            version_output: String::new(),
            command_path: program,
            error: Some(err.error),
        },
    }
}

/// Builds `DeviceInfo` from injected command results so tests can exercise the
/// fallback behavior without a device attached. A failing property read yields
/// `"N/A"` for that field, never an error.
fn load_device_info(
    mut run: impl FnMut(&[String], Duration) -> Result<CommandOutput, AppError>,
    timeout: Duration,
) -> DeviceInfo {
    let (model, android_version, build_number) = {
        let mut get_prop = |prop: &str| -> String {
            let args = vec![
                "shell".to_string(),
                "getprop".to_string(),
                prop.to_string(),
            ];
            match run(&args, timeout) {
                Ok(output) if output.success() => output.stdout.trim().to_string(),
                _ => NOT_AVAILABLE.to_string(),
            }
        };
        (
            get_prop("ro.product.model"),
            get_prop("ro.build.version.release"),
            get_prop("ro.build.id"),
        )
    };

    let battery_args = vec![
        "shell".to_string(),
        "dumpsys battery | grep level".to_string(),
    ];
    let battery_level = match run(&battery_args, timeout) {
        Ok(output) if output.success() => parse_battery_percent(&output.stdout)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        _ => NOT_AVAILABLE.to_string(),
    };

    DeviceInfo {
        model,
        android_version,
        build_number,
        battery_level,
    }
}

fn reboot_args(mode: &str) -> Vec<String> {
    let mut args = vec!["reboot".to_string()];
    let mode = mode.trim();
    if !mode.is_empty() {
        args.push(mode.to_string());
    }
    args
}

fn validate_install_inputs(file_path: &str, trace_id: &str) -> Result<(), AppError> {
    ensure_non_empty(file_path, "file_path", trace_id)?;
    if !Path::new(file_path.trim()).is_file() {
        return Err(AppError::validation(
            format!("package file not found: {}", file_path.trim()),
            trace_id,
        ));
    }
    Ok(())
}

fn validate_flash_inputs(partition: &str, file_path: &str, trace_id: &str) -> Result<(), AppError> {
    if partition.trim().is_empty() || file_path.trim().is_empty() {
        return Err(AppError::validation(
            "partition and file path cannot be empty",
            trace_id,
        ));
    }
    Ok(())
}

#[tauri::command(async)]
pub fn get_config(trace_id: Option<String>) -> Result<CommandResponse<AppConfig>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    let config = load_config(&trace_id)?;
    Ok(CommandResponse {
        trace_id,
        data: config,
    })
}

#[tauri::command(async)]
pub fn save_app_config(
    config: AppConfig,
    trace_id: Option<String>,
) -> Result<CommandResponse<AppConfig>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    save_config(&config, &trace_id)?;
    Ok(CommandResponse {
        trace_id,
        data: config,
    })
}

#[tauri::command(async)]
pub fn reset_config(trace_id: Option<String>) -> Result<CommandResponse<AppConfig>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    let config = AppConfig::default();
    save_config(&config, &trace_id)?;
    Ok(CommandResponse {
        trace_id,
        data: config,
    })
}

#[tauri::command(async)]
pub fn check_adb(
    command_path: Option<String>,
    trace_id: Option<String>,
) -> Result<CommandResponse<ToolInfo>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, "check_adb");

    let config = load_config(&trace_id)?;
    let override_path = command_path
        .as_deref()
        .map(normalize_tool_path)
        .filter(|value| !value.is_empty())
        .unwrap_or(config.tools.adb_path);

    let data = check_tool_inner(ADB, &override_path, &["version".to_string()], &trace_id);
    if let Some(error) = &data.error {
        warn!(trace_id = %trace_id, error = %error, "adb check failed");
    }
    Ok(CommandResponse { trace_id, data })
}

#[tauri::command(async)]
pub fn check_fastboot(
    command_path: Option<String>,
    trace_id: Option<String>,
) -> Result<CommandResponse<ToolInfo>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, "check_fastboot");

    let config = load_config(&trace_id)?;
    let override_path = command_path
        .as_deref()
        .map(normalize_tool_path)
        .filter(|value| !value.is_empty())
        .unwrap_or(config.tools.fastboot_path);

    let data = check_tool_inner(
        FASTBOOT,
        &override_path,
        &["--version".to_string()],
        &trace_id,
    );
    if let Some(error) = &data.error {
        warn!(trace_id = %trace_id, error = %error, "fastboot check failed");
    }
    Ok(CommandResponse { trace_id, data })
}

#[tauri::command(async)]
pub fn list_devices(trace_id: Option<String>) -> Result<CommandResponse<Vec<Device>>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, "list_devices");

    let ctx = adb_context(&trace_id)?;
    let args = vec!["devices".to_string()];
    let stdout = run_checked(&ctx.program, &args, ctx.command_timeout, &trace_id)?;
    Ok(CommandResponse {
        trace_id,
        data: parse_adb_devices(&stdout),
    })
}

#[tauri::command(async)]
pub fn get_device_info(trace_id: Option<String>) -> Result<CommandResponse<DeviceInfo>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, "get_device_info");

    let ctx = adb_context(&trace_id)?;
    let program = ctx.program.clone();
    let trace = trace_id.clone();
    let data = load_device_info(
        move |args, timeout| run_tool_with_timeout(&program, args, timeout, &trace),
        ctx.command_timeout,
    );
    Ok(CommandResponse { trace_id, data })
}

#[tauri::command(async)]
pub fn reboot_device(
    mode: Option<String>,
    trace_id: Option<String>,
) -> Result<CommandResponse<bool>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    let mode = mode.unwrap_or_default();
    info!(trace_id = %trace_id, mode = %mode, "reboot_device");

    let ctx = adb_context(&trace_id)?;
    let args = reboot_args(&mode);
    run_checked(&ctx.program, &args, ctx.command_timeout, &trace_id)?;
    Ok(CommandResponse {
        trace_id,
        data: true,
    })
}

#[tauri::command(async)]
pub fn install_package(
    file_path: String,
    trace_id: Option<String>,
) -> Result<CommandResponse<String>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, "install_package");

    validate_install_inputs(&file_path, &trace_id)?;
    let ctx = adb_context(&trace_id)?;
    let args = vec![
        "install".to_string(),
        "-r".to_string(),
        file_path.trim().to_string(),
    ];
    let output = run_tool_with_timeout(&ctx.program, &args, ctx.flash_timeout, &trace_id)?;
    if !output.success() {
        // adb reports install failures on stdout as often as on stderr.
        let detail = if output.stderr.trim().is_empty() {
            output.stdout.trim().to_string()
        } else {
            output.stderr.trim().to_string()
        };
        warn!(trace_id = %trace_id, error = %detail, "install failed");
        return Err(AppError::system(
            format!("Failed to install package: {detail}"),
            &trace_id,
        ));
    }
    Ok(CommandResponse {
        trace_id,
        data: output.stdout.trim().to_string(),
    })
}

#[tauri::command(async)]
pub fn uninstall_package(
    package_name: String,
    trace_id: Option<String>,
) -> Result<CommandResponse<String>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, package = %package_name, "uninstall_package");

    ensure_non_empty(&package_name, "package_name", &trace_id)?;
    let ctx = adb_context(&trace_id)?;
    let args = vec![
        "shell".to_string(),
        "pm".to_string(),
        "uninstall".to_string(),
        package_name.trim().to_string(),
    ];
    let stdout = run_checked(&ctx.program, &args, ctx.command_timeout, &trace_id)?;
    Ok(CommandResponse {
        trace_id,
        data: stdout,
    })
}

#[tauri::command(async)]
pub fn list_fastboot_devices(
    trace_id: Option<String>,
) -> Result<CommandResponse<Vec<Device>>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, "list_fastboot_devices");

    let ctx = fastboot_context(&trace_id)?;
    let args = vec!["devices".to_string()];
    let output = run_tool_with_timeout(&ctx.program, &args, ctx.command_timeout, &trace_id)?;
    if !output.success() {
        // No bootloader device attached can surface as a failing exit with no
        // output at all; treat that as an empty list rather than an error.
        if output.stdout.trim().is_empty() && output.stderr.trim().is_empty() {
            return Ok(CommandResponse {
                trace_id,
                data: Vec::new(),
            });
        }
        return Err(AppError::command_failed(
            FASTBOOT,
            &output.stderr,
            output.exit_code,
            &trace_id,
        ));
    }
    Ok(CommandResponse {
        trace_id,
        data: parse_fastboot_devices(&output.stdout),
    })
}

#[tauri::command(async)]
pub fn wipe_data(trace_id: Option<String>) -> Result<CommandResponse<bool>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, "wipe_data");

    let ctx = fastboot_context(&trace_id)?;
    let args = vec!["-w".to_string()];
    if let Err(err) = run_checked(&ctx.program, &args, ctx.flash_timeout, &trace_id) {
        warn!(trace_id = %trace_id, error = %err.error, "wipe failed");
        return Err(err);
    }
    Ok(CommandResponse {
        trace_id,
        data: true,
    })
}

#[tauri::command(async)]
pub fn flash_partition(
    partition: String,
    file_path: String,
    trace_id: Option<String>,
) -> Result<CommandResponse<bool>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, partition = %partition, "flash_partition");

    validate_flash_inputs(&partition, &file_path, &trace_id)?;
    let ctx = fastboot_context(&trace_id)?;
    let args = vec![
        "flash".to_string(),
        partition.trim().to_string(),
        file_path.trim().to_string(),
    ];
    if let Err(err) = run_checked(&ctx.program, &args, ctx.flash_timeout, &trace_id) {
        warn!(trace_id = %trace_id, partition = %partition, error = %err.error, "flash failed");
        return Err(err);
    }
    Ok(CommandResponse {
        trace_id,
        data: true,
    })
}

#[tauri::command(async)]
pub fn get_fastboot_product(
    trace_id: Option<String>,
) -> Result<CommandResponse<String>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, "get_fastboot_product");

    let ctx = fastboot_context(&trace_id)?;
    let args = vec!["getvar".to_string(), "product".to_string()];
    let output = run_tool_with_timeout(&ctx.program, &args, ctx.command_timeout, &trace_id)?;
    if !output.success() {
        return Err(AppError::command_failed(
            FASTBOOT,
            &output.stderr,
            output.exit_code,
            &trace_id,
        ));
    }
    // fastboot prints getvar results on stderr.
    let product = parse_getvar_value(&output.stderr, "product")
        .or_else(|| parse_getvar_value(&output.stdout, "product"))
        .ok_or_else(|| AppError::system("fastboot did not report a product", &trace_id))?;
    Ok(CommandResponse {
        trace_id,
        data: product,
    })
}

#[tauri::command(async)]
pub fn select_image_file(
    app: AppHandle,
    trace_id: Option<String>,
) -> Result<CommandResponse<String>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, "select_image_file");

    let selection = app
        .dialog()
        .file()
        .set_title("Select Image File")
        .add_filter("Image Files (*.img)", &["img"])
        .blocking_pick_file();

    // Cancelling the picker is not an error; the frontend checks for empty.
    let data = selection.map(|file| file.to_string()).unwrap_or_default();
    Ok(CommandResponse { trace_id, data })
}

#[tauri::command(async)]
pub fn export_diagnostics_bundle(
    output_dir: Option<String>,
    trace_id: Option<String>,
) -> Result<CommandResponse<String>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, "export_diagnostics_bundle");

    let bundle_path = diagnostics::export_diagnostics_bundle(output_dir, &trace_id)?;
    Ok(CommandResponse {
        trace_id,
        data: bundle_path.to_string_lossy().to_string(),
    })
}
