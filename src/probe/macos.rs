use std::{process::Command, time::Duration};

use anyhow::{anyhow, bail, Context, Result};

use super::ActivityProbe;

const IOREG: &str = "/usr/sbin/ioreg";

/// Asks `ioreg` for the HID system's idle counter.
pub struct IoregProbe;

impl ActivityProbe for IoregProbe {
    fn idle_time(&mut self) -> Result<Duration> {
        let output = Command::new(IOREG)
            .args(["-c", "IOHIDSystem"])
            .output()
            .with_context(|| format!("Failed to run {IOREG}"))?;
        if !output.status.success() {
            bail!("{IOREG} exited with {}", output.status);
        }
        parse_hid_idle_time(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Extracts `"HIDIdleTime" = <nanoseconds>` from ioreg output.
pub fn parse_hid_idle_time(output: &str) -> Result<Duration> {
    output
        .lines()
        .filter(|v| v.contains("\"HIDIdleTime\""))
        .find_map(|line| {
            let (_, value) = line.split_once('=')?;
            value.trim().parse::<u64>().ok()
        })
        .map(Duration::from_nanos)
        .ok_or_else(|| anyhow!("HIDIdleTime not found"))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::parse_hid_idle_time;

    #[test]
    fn test_parse_hid_idle_time() -> anyhow::Result<()> {
        let output = r#"
    | |   {
    | |     "IOClass" = "IOHIDSystem"
    | |     "HIDIdleTime" = 2500000000
    | |     "HIDParameters" = {"HIDIdleTimeBase"=1}
    | |   }
"#;
        assert_eq!(parse_hid_idle_time(output)?, Duration::from_millis(2500));
        Ok(())
    }

    #[test]
    fn test_missing_counter_is_an_error() {
        assert!(parse_hid_idle_time("\"IOClass\" = \"IOHIDSystem\"").is_err());
        assert!(parse_hid_idle_time("\"HIDIdleTime\" = nope").is_err());
    }
}
