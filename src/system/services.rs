//! systemd service listing and control.

use std::fmt;

use tracing::{debug, info};

use crate::error::{ControlError, Result};
use crate::exec::{run_checked, CommandSpec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    pub name: String,
    pub load: String,
    pub active_state: String,
    pub sub_state: String,
    pub description: String,
}

impl ServiceInfo {
    pub fn is_active(&self) -> bool {
        self.active_state == "active"
    }

    pub fn available_actions(&self) -> &'static [ServiceAction] {
        if self.is_active() {
            &[ServiceAction::Stop, ServiceAction::Restart]
        } else {
            &[ServiceAction::Start]
        }
    }
}

pub fn parse_units(output: &str) -> Vec<ServiceInfo> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim_start().trim_start_matches('●').trim_start();
            let mut parts = line.split_whitespace();
            let name = parts.next()?.strip_suffix(".service")?;
            let load = parts.next()?;
            let active_state = parts.next()?;
            let sub_state = parts.next()?;
            Some(ServiceInfo {
                name: name.to_string(),
                load: load.to_string(),
                active_state: active_state.to_string(),
                sub_state: sub_state.to_string(),
                description: parts.collect::<Vec<_>>().join(" "),
            })
        })
        .collect()
}

pub async fn list() -> Result<Vec<ServiceInfo>> {
    let output = run_checked(&CommandSpec::new("systemctl").args([
        "list-units",
        "--type=service",
        "--all",
        "--no-pager",
        "--no-legend",
        "--plain",
    ]))
    .await?;
    let services = parse_units(&output);
    debug!(count = services.len(), "listed services");
    Ok(services)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 3] = [Self::All, Self::Active, Self::Inactive];

    pub fn from_index(index: u32) -> Self {
        Self::ALL.get(index as usize).copied().unwrap_or_default()
    }

    fn accepts(&self, service: &ServiceInfo) -> bool {
        match self {
            Self::All => true,
            Self::Active => service.is_active(),
            Self::Inactive => !service.is_active(),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "All",
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        })
    }
}

pub fn filter<'a>(services: &'a [ServiceInfo], search: &str, status: StatusFilter) -> Vec<&'a ServiceInfo> {
    let needle = search.trim().to_lowercase();
    services
        .iter()
        .filter(|s| status.accepts(s))
        .filter(|s| needle.is_empty() || s.name.to_lowercase().contains(&needle))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Start,
    Stop,
    Restart,
}

impl ServiceAction {
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            Self::Start => "started",
            Self::Stop => "stopped",
            Self::Restart => "restarted",
        }
    }
}

impl fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "Start",
            Self::Stop => "Stop",
            Self::Restart => "Restart",
        })
    }
}

pub fn action_spec(action: ServiceAction, name: &str) -> Result<CommandSpec> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@' | ':' | '\\'));
    if !valid {
        return Err(ControlError::validation(format!("Invalid service name: {}", name)));
    }
    Ok(CommandSpec::new("systemctl")
        .args([action.verb().to_string(), format!("{}.service", name)])
        .privileged())
}

pub async fn perform(action: ServiceAction, name: &str) -> Result<()> {
    info!(service = name, action = action.verb(), "changing service state");
    run_checked(&action_spec(action, name)?).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNITS: &str = "\
accounts-daemon.service      loaded    active   running Accounts Service
● auditd.service             not-found inactive dead    auditd.service
cups.service                 loaded    inactive dead    CUPS Scheduler
systemd-journald.socket      loaded    active   running Journal Socket
";

    #[test]
    fn parses_plain_list_units() {
        let services = parse_units(UNITS);
        assert_eq!(services.len(), 3);
        assert_eq!(services[0].name, "accounts-daemon");
        assert_eq!(services[0].description, "Accounts Service");
        assert!(services[0].is_active());
        assert_eq!(services[1].name, "auditd");
        assert_eq!(services[1].load, "not-found");
        assert_eq!(services[2].available_actions(), &[ServiceAction::Start]);
    }

    #[test]
    fn filters_by_search_and_state() {
        let services = parse_units(UNITS);
        let names = |list: Vec<&ServiceInfo>| list.iter().map(|s| s.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(filter(&services, "", StatusFilter::Active)), vec!["accounts-daemon"]);
        assert_eq!(names(filter(&services, "CUP", StatusFilter::All)), vec!["cups"]);
        assert!(filter(&services, "cups", StatusFilter::Active).is_empty());
        assert_eq!(StatusFilter::from_index(2), StatusFilter::Inactive);
    }

    #[test]
    fn action_command_targets_unit() {
        let spec = action_spec(ServiceAction::Restart, "cups").unwrap();
        assert_eq!(spec.display(), "systemctl restart cups.service");
        assert!(spec.is_privileged());
        assert!(action_spec(ServiceAction::Stop, "cups; reboot").is_err());
    }
}
