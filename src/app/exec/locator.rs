use std::path::{Path, PathBuf};

use crate::app::error::AppError;

pub const ADB: &str = "adb";
pub const FASTBOOT: &str = "fastboot";

/// Strips surrounding whitespace and one layer of wrapping quotes from a
/// user-configured tool path.
pub fn normalize_tool_path(value: &str) -> String {
    let trimmed = value.trim();
    if let Some(inner) = trimmed
        .strip_prefix('"')
        .and_then(|candidate| candidate.strip_suffix('"'))
    {
        return inner.trim().to_string();
    }
    if let Some(inner) = trimmed
        .strip_prefix('\'')
        .and_then(|candidate| candidate.strip_suffix('\''))
    {
        return inner.trim().to_string();
    }
    trimmed.to_string()
}

fn tool_file_name(name: &str) -> String {
    if cfg!(windows) {
        format!("{name}.exe")
    } else {
        name.to_string()
    }
}

/// Candidate locations for a bundled tool, in resolution order: the per-OS
/// layout next to the working directory, the same layout next to the installed
/// executable, then the legacy flat `bin/` layout so older installs still run.
pub fn candidate_paths(name: &str) -> Vec<PathBuf> {
    let file_name = tool_file_name(name);
    let install_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));

    let mut candidates = Vec::with_capacity(4);
    candidates.push(
        Path::new(".")
            .join("bin")
            .join(std::env::consts::OS)
            .join(&file_name),
    );
    if let Some(dir) = &install_dir {
        candidates.push(dir.join("bin").join(std::env::consts::OS).join(&file_name));
    }
    candidates.push(Path::new(".").join("bin").join(&file_name));
    if let Some(dir) = &install_dir {
        candidates.push(dir.join("bin").join(&file_name));
    }
    candidates
}

pub fn find_first_file(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates
        .iter()
        .find(|candidate| candidate.is_file())
        .cloned()
}

/// Resolves a tool name to a runnable program path.
///
/// A non-empty `override_path` from config wins: a bare command name is handed
/// to the OS PATH lookup as-is, anything that looks like a path must exist.
/// Otherwise the bundled candidate locations are searched in order and the
/// first existing file is returned as an absolute path.
pub fn locate_tool(name: &str, override_path: &str, trace_id: &str) -> Result<String, AppError> {
    let normalized = normalize_tool_path(override_path);
    if !normalized.is_empty() {
        let is_bare_name = !normalized.contains('/') && !normalized.contains('\\');
        if is_bare_name {
            return Ok(normalized);
        }
        let path = Path::new(&normalized);
        if path.is_file() {
            return Ok(normalized);
        }
        return Err(AppError::dependency(
            format!("configured {name} path does not exist: {normalized}"),
            trace_id,
        ));
    }

    match find_first_file(&candidate_paths(name)) {
        Some(path) => {
            let absolute = std::path::absolute(&path).unwrap_or(path);
            Ok(absolute.to_string_lossy().to_string())
        }
        None => Err(AppError::dependency(
            format!(
                "binary '{name}' not found for platform '{}'",
                std::env::consts::OS
            ),
            trace_id,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn strips_wrapping_double_quotes() {
        assert_eq!(
            normalize_tool_path("  \"/opt/android/platform-tools/adb\"  "),
            "/opt/android/platform-tools/adb"
        );
    }

    #[test]
    fn strips_wrapping_single_quotes() {
        assert_eq!(
            normalize_tool_path("  '/opt/android/platform-tools/fastboot'  "),
            "/opt/android/platform-tools/fastboot"
        );
    }

    #[test]
    fn candidate_order_prefers_per_os_layout() {
        let candidates = candidate_paths("adb");
        assert!(candidates.len() >= 3);
        assert!(candidates[0]
            .to_string_lossy()
            .contains(std::env::consts::OS));
        // The flat legacy layout comes after every per-OS candidate.
        let relative_flat = Path::new(".").join("bin").join(tool_file_name("adb"));
        let flat_index = candidates
            .iter()
            .position(|c| c == &relative_flat)
            .expect("flat candidate");
        assert!(flat_index >= candidates.len() / 2);
    }

    #[test]
    fn find_first_file_honors_order() {
        let dir = TempDir::new().expect("tmp");
        let missing = dir.path().join("missing").join("adb");
        let flat = dir.path().join("adb");
        fs::write(&flat, b"#!/bin/sh\n").expect("write tool");

        let found = find_first_file(&[missing, flat.clone()]).expect("found");
        assert_eq!(found, flat);
    }

    #[test]
    fn locate_tool_reports_missing_binary() {
        let err = locate_tool("fastboot", "", "trace-loc").expect_err("expected missing");
        assert_eq!(err.code, "ERR_DEPENDENCY");
        assert!(err.error.contains("binary 'fastboot' not found"));
        assert_eq!(err.trace_id, "trace-loc");
    }

    #[test]
    fn locate_tool_rejects_nonexistent_override_path() {
        let err = locate_tool("adb", "/this/path/should/not/exist/adb", "trace-ovr")
            .expect_err("expected missing override");
        assert_eq!(err.code, "ERR_DEPENDENCY");
        assert!(err.error.contains("does not exist"));
    }

    #[test]
    fn locate_tool_accepts_bare_command_override() {
        let program = locate_tool("adb", "adb", "trace-bare").expect("bare name");
        assert_eq!(program, "adb");
    }

    #[test]
    fn locate_tool_accepts_existing_override_file() {
        let dir = TempDir::new().expect("tmp");
        let tool = dir.path().join("adb");
        fs::write(&tool, b"#!/bin/sh\n").expect("write tool");
        let program = locate_tool("adb", &tool.to_string_lossy(), "trace-file").expect("override");
        assert_eq!(program, tool.to_string_lossy().to_string());
    }
}
