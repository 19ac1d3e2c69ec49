use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use adbkit_lib::app::commands::{
    check_adb, check_fastboot, export_diagnostics_bundle, get_device_info, list_devices,
    list_fastboot_devices,
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Args {
    out_dir: Option<PathBuf>,
    json: bool,
    with_device_info: bool,
}

#[derive(Serialize)]
struct SmokeSummary {
    tool: &'static str,
    status: &'static str,
    trace_id: String,
    out_dir: String,
    artifacts: HashMap<String, String>,
    checks: Vec<SmokeCheck>,
}

#[derive(Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: &'static str, // pass|fail|warn|skip
    duration_ms: u128,
    artifacts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn parse_args() -> Result<Args, String> {
    let mut out_dir: Option<PathBuf> = None;
    let mut json = false;
    let mut with_device_info = false;

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--out" => {
                let value = it
                    .next()
                    .ok_or_else(|| "--out requires a value".to_string())?;
                out_dir = Some(PathBuf::from(value));
            }
            "--json" => {
                json = true;
            }
            "--with-device-info" => {
                with_device_info = true;
            }
            "-h" | "--help" => {
                return Err(
                    "Usage: cargo run --bin smoke -- [--out DIR] [--json] [--with-device-info]\n"
                        .to_string(),
                );
            }
            other => return Err(format!("Unknown arg: {other}")),
        }
    }

    Ok(Args {
        out_dir,
        json,
        with_device_info,
    })
}

fn ensure_dir(path: &Path) -> Result<(), String> {
    fs::create_dir_all(path)
        .map_err(|err| format!("Failed to create dir {}: {err}", path.display()))
}

fn run_check<F>(checks: &mut Vec<SmokeCheck>, name: &'static str, f: F) -> Result<(), ()>
where
    F: FnOnce() -> Result<Vec<String>, (&'static str, String)>,
{
    let start = Instant::now();
    match f() {
        Ok(artifacts) => {
            checks.push(SmokeCheck {
                name,
                status: "pass",
                duration_ms: start.elapsed().as_millis(),
                artifacts,
                error_code: None,
                error: None,
            });
            Ok(())
        }
        Err((code, err)) => {
            checks.push(SmokeCheck {
                name,
                status: "fail",
                duration_ms: start.elapsed().as_millis(),
                artifacts: vec![],
                error_code: Some(code),
                error: Some(err),
            });
            Err(())
        }
    }
}

fn run_warn<F>(checks: &mut Vec<SmokeCheck>, name: &'static str, f: F)
where
    F: FnOnce() -> Result<(Vec<String>, Option<String>), (&'static str, String)>,
{
    let start = Instant::now();
    match f() {
        Ok((artifacts, warning)) => {
            checks.push(SmokeCheck {
                name,
                status: if warning.is_some() { "warn" } else { "pass" },
                duration_ms: start.elapsed().as_millis(),
                artifacts,
                error_code: warning.as_ref().map(|_| "WARN"),
                error: warning,
            });
        }
        Err((code, err)) => {
            checks.push(SmokeCheck {
                name,
                status: "warn",
                duration_ms: start.elapsed().as_millis(),
                artifacts: vec![],
                error_code: Some(code),
                error: Some(err),
            });
        }
    }
}

fn main() {
    let args = match parse_args() {
        Ok(v) => v,
        Err(msg) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
    };

    let trace_id = Uuid::new_v4().to_string();

    let out_dir = args.out_dir.unwrap_or_else(|| {
        let mut p = std::env::temp_dir();
        p.push(format!("adbkit_smoke_{trace_id}"));
        p
    });
    if let Err(err) = ensure_dir(&out_dir) {
        eprintln!("{err}");
        std::process::exit(1);
    }

    let mut artifacts: HashMap<String, String> = HashMap::new();
    let mut checks: Vec<SmokeCheck> = Vec::new();
    let mut status = "pass";

    // check_adb (real command)
    if run_check(&mut checks, "check_adb", || {
        let resp = check_adb(None, Some(trace_id.clone()))
            .map_err(|err| ("ERR_CHECK_ADB", err.to_string()))?;
        if !resp.data.available {
            return Err((
                "ERR_ADB_UNAVAILABLE",
                resp.data.error.unwrap_or_else(|| "adb unavailable".to_string()),
            ));
        }
        let path = out_dir.join("check_adb.txt");
        fs::write(&path, &resp.data.version_output)
            .map_err(|err| ("ERR_IO", format!("Failed to write check_adb output: {err}")))?;
        artifacts.insert("check_adb".to_string(), path.to_string_lossy().to_string());
        Ok(vec![path.to_string_lossy().to_string()])
    })
    .is_err()
    {
        status = "fail";
    }

    // check_fastboot (warn if not available; listing and flashing need it, adb does not)
    run_warn(&mut checks, "check_fastboot", || {
        let resp = check_fastboot(None, Some(trace_id.clone()))
            .map_err(|err| ("WARN_FASTBOOT", err.to_string()))?;
        let path = out_dir.join("check_fastboot.json");
        let body = serde_json::to_string_pretty(&resp.data)
            .map_err(|err| ("WARN_FASTBOOT", format!("Failed to serialize fastboot info: {err}")))?;
        fs::write(&path, body)
            .map_err(|err| ("WARN_FASTBOOT", format!("Failed to write fastboot info: {err}")))?;
        artifacts.insert(
            "check_fastboot".to_string(),
            path.to_string_lossy().to_string(),
        );
        if resp.data.available {
            Ok((vec![path.to_string_lossy().to_string()], None))
        } else {
            Ok((
                vec![path.to_string_lossy().to_string()],
                Some("fastboot not available (optional).".to_string()),
            ))
        }
    });

    // list_devices (real command)
    if run_check(&mut checks, "list_devices", || {
        let resp = list_devices(Some(trace_id.clone()))
            .map_err(|err| ("ERR_LIST_DEVICES", err.to_string()))?;
        let path = out_dir.join("devices.json");
        let body = serde_json::to_string_pretty(&resp.data)
            .map_err(|err| ("ERR_IO", format!("Failed to serialize device list: {err}")))?;
        fs::write(&path, body)
            .map_err(|err| ("ERR_IO", format!("Failed to write device list: {err}")))?;
        artifacts.insert("devices".to_string(), path.to_string_lossy().to_string());
        Ok(vec![path.to_string_lossy().to_string()])
    })
    .is_err()
    {
        status = "fail";
    }

    // fastboot devices (warn; most hosts have no bootloader device attached)
    run_warn(&mut checks, "list_fastboot_devices", || {
        let resp = list_fastboot_devices(Some(trace_id.clone()))
            .map_err(|err| ("WARN_FASTBOOT_DEVICES", err.to_string()))?;
        let path = out_dir.join("fastboot_devices.json");
        let body = serde_json::to_string_pretty(&resp.data).map_err(|err| {
            (
                "WARN_FASTBOOT_DEVICES",
                format!("Failed to serialize fastboot devices: {err}"),
            )
        })?;
        fs::write(&path, body).map_err(|err| {
            (
                "WARN_FASTBOOT_DEVICES",
                format!("Failed to write fastboot devices: {err}"),
            )
        })?;
        artifacts.insert(
            "fastboot_devices".to_string(),
            path.to_string_lossy().to_string(),
        );
        Ok((vec![path.to_string_lossy().to_string()], None))
    });

    if args.with_device_info {
        if run_check(&mut checks, "get_device_info", || {
            let resp = get_device_info(Some(trace_id.clone()))
                .map_err(|err| ("ERR_DEVICE_INFO", err.to_string()))?;
            let path = out_dir.join("device_info.json");
            let body = serde_json::to_string_pretty(&resp.data)
                .map_err(|err| ("ERR_IO", format!("Failed to serialize device info: {err}")))?;
            fs::write(&path, body)
                .map_err(|err| ("ERR_IO", format!("Failed to write device info: {err}")))?;
            artifacts.insert(
                "device_info".to_string(),
                path.to_string_lossy().to_string(),
            );
            Ok(vec![path.to_string_lossy().to_string()])
        })
        .is_err()
        {
            status = "fail";
        }
    } else {
        checks.push(SmokeCheck {
            name: "get_device_info",
            status: "skip",
            duration_ms: 0,
            artifacts: vec![],
            error_code: None,
            error: None,
        });
    }

    // Diagnostics bundle always works, even on a host without the tools.
    if run_check(&mut checks, "export_diagnostics_bundle", || {
        let resp = export_diagnostics_bundle(
            Some(out_dir.to_string_lossy().to_string()),
            Some(trace_id.clone()),
        )
        .map_err(|err| ("ERR_DIAGNOSTICS", err.to_string()))?;
        artifacts.insert("diagnostics".to_string(), resp.data.clone());
        Ok(vec![resp.data])
    })
    .is_err()
    {
        status = "fail";
    }

    let summary = SmokeSummary {
        tool: "adbkit_backend_smoke",
        status,
        trace_id: trace_id.clone(),
        out_dir: out_dir.to_string_lossy().to_string(),
        artifacts,
        checks,
    };

    let output = if args.json {
        serde_json::to_string_pretty(&summary).unwrap_or_else(|_| "{}".to_string())
    } else {
        format!(
            "status: {}\ntrace_id: {}\nout: {}\n",
            summary.status, summary.trace_id, summary.out_dir
        )
    };

    println!("{output}");
    if summary.status != "pass" {
        std::process::exit(1);
    }
}
