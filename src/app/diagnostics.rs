use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::warn;
use zip::write::FileOptions;

use crate::app::adb::parse::parse_adb_devices;
use crate::app::config::{load_config, AppConfig};
use crate::app::error::AppError;
use crate::app::exec::locator::{locate_tool, ADB, FASTBOOT};
use crate::app::exec::runner::{run_tool, run_tool_with_timeout};
use crate::app::models::Device;

#[derive(Debug, Serialize)]
struct DiagnosticsManifest {
    app_version: &'static str,
    os: &'static str,
    arch: &'static str,
    timestamp_utc: String,
    trace_id: String,
}

#[derive(Debug, Serialize)]
struct ToolReport {
    program: Option<String>,
    version_output: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct DevicesPayload {
    parsed: Vec<Device>,
    raw_stdout: String,
    raw_stderr: String,
    exit_code: Option<i32>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct DiagnosticsPayload {
    manifest: DiagnosticsManifest,
    adb: ToolReport,
    fastboot: ToolReport,
    devices: DevicesPayload,
}

fn sanitize_filename_component(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn resolve_output_dir(config: Option<&AppConfig>, output_dir: Option<String>) -> String {
    if let Some(dir) = output_dir
        .as_ref()
        .map(|value| value.trim())
        .filter(|v| !v.is_empty())
    {
        return dir.to_string();
    }
    if let Some(config) = config {
        if !config.output_path.trim().is_empty() {
            return config.output_path.clone();
        }
    }
    std::env::temp_dir()
        .join("adbkit_diagnostics")
        .to_string_lossy()
        .to_string()
}

fn probe_tool(name: &str, override_path: &str, version_args: &[String], trace_id: &str) -> ToolReport {
    let program = match locate_tool(name, override_path, trace_id) {
        Ok(program) => program,
        Err(err) => {
            return ToolReport {
                program: None,
                version_output: None,
                error: Some(err.error),
            }
        }
    };
    match run_tool_with_timeout(&program, version_args, Duration::from_secs(5), trace_id) {
        Ok(output) => {
            let combined = format!("{}\n{}", output.stdout.trim(), output.stderr.trim());
            ToolReport {
                program: Some(program),
                version_output: Some(combined.trim().to_string()),
                error: if output.success() {
                    None
                } else {
                    Some(format!("{name} returned a non-zero exit code"))
                },
            }
        }
        Err(err) => ToolReport {
            program: Some(program),
            version_output: None,
            error: Some(err.error),
        },
    }
}

/// Writes a zip bundle with a single `diagnostics.json` entry describing the
/// host, tool availability and the current `adb devices` view. Tool failures
/// are recorded in the payload, never fatal.
pub fn export_diagnostics_bundle(
    output_dir: Option<String>,
    trace_id: &str,
) -> Result<PathBuf, AppError> {
    let config = match load_config(trace_id) {
        Ok(config) => Some(config),
        Err(err) => {
            warn!(trace_id = %trace_id, error = %err, "Failed to load config for diagnostics");
            None
        }
    };

    let resolved_dir = resolve_output_dir(config.as_ref(), output_dir);
    fs::create_dir_all(&resolved_dir).map_err(|err| {
        AppError::system(format!("Failed to create output dir: {err}"), trace_id)
    })?;

    let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
    let safe_trace = sanitize_filename_component(trace_id);
    let trace_short = safe_trace.chars().take(8).collect::<String>();
    let filename = format!("diagnostics_{}_{}.zip", timestamp, trace_short);
    let bundle_path = PathBuf::from(&resolved_dir).join(filename);

    let manifest = DiagnosticsManifest {
        app_version: env!("CARGO_PKG_VERSION"),
        os: std::env::consts::OS,
        arch: std::env::consts::ARCH,
        timestamp_utc: Utc::now().to_rfc3339(),
        trace_id: trace_id.to_string(),
    };

    let adb_override = config
        .as_ref()
        .map(|cfg| cfg.tools.adb_path.clone())
        .unwrap_or_default();
    let fastboot_override = config
        .as_ref()
        .map(|cfg| cfg.tools.fastboot_path.clone())
        .unwrap_or_default();

    let adb_report = probe_tool(ADB, &adb_override, &["version".to_string()], trace_id);
    let fastboot_report = probe_tool(
        FASTBOOT,
        &fastboot_override,
        &["--version".to_string()],
        trace_id,
    );

    let mut devices_payload = DevicesPayload {
        parsed: Vec::new(),
        raw_stdout: String::new(),
        raw_stderr: String::new(),
        exit_code: None,
        error: None,
    };
    match &adb_report.program {
        Some(program) => {
            let args = vec!["devices".to_string()];
            match run_tool(program, &args, trace_id) {
                Ok(output) => {
                    devices_payload.exit_code = output.exit_code;
                    devices_payload.parsed = parse_adb_devices(&output.stdout);
                    devices_payload.raw_stdout = output.stdout;
                    devices_payload.raw_stderr = output.stderr;
                }
                Err(err) => {
                    warn!(
                        trace_id = %trace_id,
                        error = %err.error,
                        "Failed to run adb devices for diagnostics"
                    );
                    devices_payload.error = Some(err.error);
                }
            }
        }
        None => {
            devices_payload.error = adb_report.error.clone();
        }
    }

    let payload = DiagnosticsPayload {
        manifest,
        adb: adb_report,
        fastboot: fastboot_report,
        devices: devices_payload,
    };

    let json = serde_json::to_vec_pretty(&payload).map_err(|err| {
        AppError::system(
            format!("Failed to serialize diagnostics payload: {err}"),
            trace_id,
        )
    })?;

    let file = fs::File::create(&bundle_path)
        .map_err(|err| AppError::system(format!("Failed to create bundle: {err}"), trace_id))?;
    let mut zip = zip::ZipWriter::new(file);
    zip.start_file("diagnostics.json", FileOptions::<()>::default())
        .map_err(|err| AppError::system(format!("Failed to write bundle: {err}"), trace_id))?;
    zip.write_all(&json)
        .map_err(|err| AppError::system(format!("Failed to write bundle: {err}"), trace_id))?;
    zip.finish()
        .map_err(|err| AppError::system(format!("Failed to finalize bundle: {err}"), trace_id))?;

    Ok(bundle_path)
}
