use regex::Regex;

use crate::app::models::Device;

/// Parses `adb devices` output. The header line and daemon-startup banners are
/// skipped; every remaining line with exactly two whitespace-separated fields
/// contributes one device.
pub fn parse_adb_devices(output: &str) -> Vec<Device> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !line.trim_start().starts_with('*'))
        .filter(|line| !line.to_lowercase().contains("list of devices"))
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() != 2 {
                return None;
            }
            Some(Device {
                serial: tokens[0].to_string(),
                status: tokens[1].to_string(),
            })
        })
        .collect()
}

/// Extracts the battery percentage from `dumpsys battery` output filtered to
/// the level line (e.g. `"  level: 77"` becomes `"77%"`).
pub fn parse_battery_percent(output: &str) -> Option<String> {
    let re = Regex::new(r":\s*(\d+)").ok()?;
    let caps = re.captures(output)?;
    Some(format!("{}%", &caps[1]))
}
