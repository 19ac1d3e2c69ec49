use crate::app::models::Device;

/// Parses `fastboot devices` output. There is no header; each line reads
/// `SERIAL    fastboot` and only lines whose second field is the literal
/// `fastboot` status count.
pub fn parse_fastboot_devices(output: &str) -> Vec<Device> {
    output
        .lines()
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 2 || tokens[1] != "fastboot" {
                return None;
            }
            Some(Device {
                serial: tokens[0].to_string(),
                status: tokens[1].to_string(),
            })
        })
        .collect()
}

/// Extracts a `getvar` value. fastboot writes getvar results to stderr as
/// `<name>: <value>` followed by a `Finished.` trailer line.
pub fn parse_getvar_value(output: &str, variable: &str) -> Option<String> {
    let prefix = format!("{variable}:");
    for line in output.lines() {
        let trimmed = line.trim();
        if let Some(value) = trimmed.strip_prefix(&prefix) {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fastboot_devices_output() {
        let output = "0123456789ABCDEF\tfastboot\nFEDCBA9876543210\tfastboot\n";
        let parsed = parse_fastboot_devices(output);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].serial, "0123456789ABCDEF");
        assert_eq!(parsed[0].status, "fastboot");
    }

    #[test]
    fn skips_lines_without_fastboot_status() {
        let output = "????????\tno permissions\nABC\tfastboot\n";
        let parsed = parse_fastboot_devices(output);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].serial, "ABC");
    }

    #[test]
    fn empty_output_yields_no_devices() {
        assert!(parse_fastboot_devices("").is_empty());
        assert!(parse_fastboot_devices("\n\n").is_empty());
    }

    #[test]
    fn parses_getvar_product() {
        let output = "product: blueline\nFinished. Total time: 0.001s\n";
        assert_eq!(
            parse_getvar_value(output, "product").as_deref(),
            Some("blueline")
        );
    }

    #[test]
    fn getvar_missing_variable_yields_none() {
        let output = "Finished. Total time: 0.001s\n";
        assert_eq!(parse_getvar_value(output, "product"), None);
    }
}
