//! firewalld status and basic control.

use tracing::info;

use crate::error::{ControlError, Result};
use crate::exec::{probe, run, run_checked, spawn_detached, which, CommandSpec};
use crate::system::packages;

pub const FIREWALLD_PACKAGE: &str = "firewalld";
pub const FIREWALL_CONFIG: &str = "firewall-config";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirewallStatus {
    pub installed: bool,
    pub running: bool,
    pub enabled: bool,
    pub default_zone: Option<String>,
    pub services: Vec<String>,
}

impl FirewallStatus {
    pub fn summary(&self) -> String {
        if !self.installed {
            return "Firewalld is not installed".to_string();
        }
        let running = if self.running { "running" } else { "not running" };
        let enabled = if self.enabled { "enabled at boot" } else { "disabled at boot" };
        format!("Firewall is {}, {}", running, enabled)
    }
}

pub async fn status() -> FirewallStatus {
    let installed = packages::is_installed(FIREWALLD_PACKAGE).await;
    if !installed {
        return FirewallStatus::default();
    }
    let running = probe("firewall-cmd", &["--state"]).await.as_deref() == Some("running");
    let enabled = probe("systemctl", &["is-enabled", "firewalld"]).await.as_deref() == Some("enabled");
    let (default_zone, services) = if running {
        (
            probe("firewall-cmd", &["--get-default-zone"]).await,
            probe("firewall-cmd", &["--list-services"])
                .await
                .map(|out| parse_service_list(&out))
                .unwrap_or_default(),
        )
    } else {
        (None, Vec::new())
    };
    FirewallStatus {
        installed,
        running,
        enabled,
        default_zone,
        services,
    }
}

pub fn parse_service_list(output: &str) -> Vec<String> {
    output.split_whitespace().map(String::from).collect()
}

pub fn install_spec() -> CommandSpec {
    packages::install_spec(&[FIREWALLD_PACKAGE], &[])
}

pub fn toggle_spec(enable: bool) -> CommandSpec {
    let verb = if enable { "enable" } else { "disable" };
    CommandSpec::new("systemctl")
        .args([verb, "--now", "firewalld"])
        .privileged()
}

pub async fn set_enabled(enable: bool) -> Result<()> {
    info!(enable, "changing firewall state");
    run_checked(&toggle_spec(enable)).await?;
    Ok(())
}

fn validate_service(service: &str) -> Result<()> {
    let valid = !service.is_empty()
        && service
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(ControlError::validation(format!("Invalid firewall service name: {}", service)))
    }
}

pub fn service_spec(service: &str, allow: bool) -> Result<CommandSpec> {
    validate_service(service)?;
    let flag = if allow { "--add-service" } else { "--remove-service" };
    Ok(CommandSpec::new("firewall-cmd")
        .args(["--permanent".to_string(), format!("{}={}", flag, service)])
        .privileged())
}

/// Changes the permanent configuration of the default zone and reloads it.
pub async fn set_service(service: &str, allow: bool) -> Result<()> {
    info!(service, allow, "changing firewall service");
    run_checked(&service_spec(service, allow)?).await?;
    run_checked(&CommandSpec::new("firewall-cmd").arg("--reload").privileged()).await?;
    Ok(())
}

/// Services firewalld knows about, for the add dialog.
pub async fn available_services() -> Result<Vec<String>> {
    let output = run(&CommandSpec::new("firewall-cmd").arg("--get-services")).await?;
    Ok(parse_service_list(&output.stdout))
}

pub fn open_firewall_config() -> Result<()> {
    if which(FIREWALL_CONFIG).is_none() {
        return Err(ControlError::ToolMissing {
            program: FIREWALL_CONFIG.to_string(),
        });
    }
    spawn_detached(FIREWALL_CONFIG, &[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_commands() {
        let add = service_spec("ssh", true).unwrap();
        assert_eq!(add.display(), "firewall-cmd --permanent --add-service=ssh");
        let remove = service_spec("samba-client", false).unwrap();
        assert_eq!(remove.display(), "firewall-cmd --permanent --remove-service=samba-client");
        assert!(service_spec("ssh --panic-on", true).is_err());
    }

    #[test]
    fn toggle_uses_now() {
        assert_eq!(toggle_spec(true).display(), "systemctl enable --now firewalld");
        assert_eq!(toggle_spec(false).display(), "systemctl disable --now firewalld");
    }

    #[test]
    fn status_summary() {
        assert_eq!(FirewallStatus::default().summary(), "Firewalld is not installed");
        let status = FirewallStatus {
            installed: true,
            running: true,
            enabled: false,
            default_zone: Some("public".into()),
            services: parse_service_list("dhcpv6-client mdns ssh\n"),
        };
        assert_eq!(status.summary(), "Firewall is running, disabled at boot");
        assert_eq!(status.services, vec!["dhcpv6-client", "mdns", "ssh"]);
    }
}
