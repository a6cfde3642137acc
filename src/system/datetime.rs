//! Clock, NTP and timezone management through timedatectl.

use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use crate::error::{ControlError, Result};
use crate::exec::{run_checked, CommandSpec};

pub const SYNC_FIRST_CHECK: Duration = Duration::from_secs(3);
pub const SYNC_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const SYNC_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeSyncStatus {
    pub ntp_enabled: bool,
    pub synchronized: bool,
    pub timezone: Option<String>,
}

pub fn parse_timedatectl_show(output: &str) -> TimeSyncStatus {
    let mut status = TimeSyncStatus::default();
    for line in output.lines() {
        match line.trim().split_once('=') {
            Some(("NTP", value)) => status.ntp_enabled = value == "yes",
            Some(("NTPSynchronized", value)) => status.synchronized = value == "yes",
            Some(("Timezone", value)) if !value.is_empty() => status.timezone = Some(value.to_string()),
            _ => {}
        }
    }
    status
}

pub async fn status() -> Result<TimeSyncStatus> {
    let spec = CommandSpec::new("timedatectl").args([
        "show",
        "--property=NTP",
        "--property=NTPSynchronized",
        "--property=Timezone",
    ]);
    Ok(parse_timedatectl_show(&run_checked(&spec).await?))
}

pub async fn set_ntp(enabled: bool) -> Result<()> {
    info!(enabled, "changing automatic time synchronization");
    let value = if enabled { "true" } else { "false" };
    run_checked(&CommandSpec::new("timedatectl").args(["set-ntp", value]).privileged()).await?;
    if enabled {
        run_checked(
            &CommandSpec::new("systemctl")
                .args(["restart", "systemd-timesyncd"])
                .privileged(),
        )
        .await?;
    }
    Ok(())
}

/// Polls until the clock reports synchronized. Returns whether it did.
pub async fn wait_for_sync() -> bool {
    tokio::time::sleep(SYNC_FIRST_CHECK).await;
    for attempt in 1..=SYNC_ATTEMPTS {
        match status().await {
            Ok(status) if status.synchronized => return true,
            Ok(_) => {}
            Err(e) => warn!(attempt, error = %e, "could not read synchronization state"),
        }
        tokio::time::sleep(SYNC_POLL_INTERVAL).await;
    }
    false
}

pub fn validate_datetime(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> Result<NaiveDateTime> {
    if !(1970..=2100).contains(&year) {
        return Err(ControlError::validation("Year must be between 1970 and 2100"));
    }
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ControlError::validation(format!("{:04}-{:02}-{:02} is not a valid date", year, month, day)))?
        .and_hms_opt(hour, minute, second)
        .ok_or_else(|| ControlError::validation("Time of day is out of range"))
}

/// Sets the clock by hand. Refused while NTP owns the clock.
pub async fn set_time(datetime: NaiveDateTime) -> Result<()> {
    if status().await?.ntp_enabled {
        return Err(ControlError::validation(
            "Disable automatic time synchronization before setting the time manually",
        ));
    }
    let stamp = datetime.format("%Y-%m-%d %H:%M:%S").to_string();
    info!(%stamp, "setting system time");
    run_checked(&CommandSpec::new("timedatectl").args(["set-time", stamp.as_str()]).privileged()).await?;
    Ok(())
}

pub async fn list_timezones() -> Result<Vec<String>> {
    let output = run_checked(&CommandSpec::new("timedatectl").arg("list-timezones")).await?;
    Ok(output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

pub async fn set_timezone(timezone: &str) -> Result<()> {
    info!(timezone, "setting timezone");
    run_checked(
        &CommandSpec::new("timedatectl")
            .args(["set-timezone", timezone])
            .privileged(),
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_show_properties() {
        let status = parse_timedatectl_show("NTP=yes\nNTPSynchronized=no\nTimezone=Europe/Warsaw\n");
        assert_eq!(
            status,
            TimeSyncStatus {
                ntp_enabled: true,
                synchronized: false,
                timezone: Some("Europe/Warsaw".into()),
            }
        );
    }

    #[test]
    fn missing_properties_default_to_off() {
        assert_eq!(parse_timedatectl_show(""), TimeSyncStatus::default());
    }

    #[test]
    fn validates_calendar_dates() {
        assert!(validate_datetime(2024, 2, 29, 12, 0, 0).is_ok());
        assert!(validate_datetime(2025, 2, 29, 12, 0, 0).is_err());
        assert!(validate_datetime(1969, 12, 31, 0, 0, 0).is_err());
        assert!(validate_datetime(2025, 1, 5, 24, 0, 0).is_err());
        let parsed = validate_datetime(2025, 1, 5, 9, 8, 7).unwrap();
        assert_eq!(parsed.format("%Y-%m-%d %H:%M:%S").to_string(), "2025-01-05 09:08:07");
    }
}
