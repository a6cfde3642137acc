//! System updates through dnf5 and the dnf-automatic policy.

use std::fmt;
use std::path::Path;

use tracing::{info, warn};

use crate::config::AUTOMATIC_CONF;
use crate::error::{ControlError, Result};
use crate::exec::{run, CommandSpec};
use crate::system::packages::write_root_file_spec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateAction {
    Install,
    Upgrade,
    Downgrade,
    Reinstall,
    Remove,
}

impl UpdateAction {
    fn from_header(line: &str) -> Option<Self> {
        let header = line.strip_suffix(':')?;
        match header {
            "Installing" => Some(Self::Install),
            "Upgrading" => Some(Self::Upgrade),
            "Downgrading" => Some(Self::Downgrade),
            "Reinstalling" => Some(Self::Reinstall),
            "Removing" => Some(Self::Remove),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Upgrade => "upgrade",
            Self::Downgrade => "downgrade",
            Self::Reinstall => "reinstall",
            Self::Remove => "remove",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpdate {
    pub name: String,
    pub arch: String,
    pub version: String,
    pub repo: Option<String>,
    pub action: UpdateAction,
    pub size: Option<String>,
}

/// Packages listed in a `dnf5 distro-sync --assumeno` transaction table.
pub fn parse_transaction(output: &str) -> Vec<PendingUpdate> {
    let mut updates = Vec::new();
    let mut section = None;

    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.starts_with("Transaction Summary") {
            break;
        }
        if let Some(action) = UpdateAction::from_header(line) {
            section = Some(action);
            continue;
        }
        let Some(action) = section else {
            continue;
        };
        if line.starts_with("replacing") {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 {
            continue;
        }
        let size = match parts.as_slice() {
            [.., value, unit] if parts.len() >= 6 && unit.chars().all(char::is_alphabetic) => {
                Some(format!("{} {}", value, unit))
            }
            _ => None,
        };
        updates.push(PendingUpdate {
            name: parts[0].to_string(),
            arch: parts[1].to_string(),
            version: parts[2].to_string(),
            repo: parts.get(3).map(|repo| repo.to_string()),
            action,
            size,
        });
    }
    updates
}

pub fn check_spec() -> CommandSpec {
    CommandSpec::new("sh")
        .args(["-c", "dnf5 clean all && dnf5 distro-sync --assumeno"])
        .privileged()
}

/// `--assumeno` makes dnf exit non-zero when there is something to do, so only
/// an empty transcript counts as failure.
pub async fn check() -> Result<Vec<PendingUpdate>> {
    let spec = check_spec();
    let output = run(&spec).await?;
    if matches!(output.status_code, Some(126) | Some(127)) {
        return Err(ControlError::AuthorizationDenied);
    }
    if output.stdout.trim().is_empty() && !output.success() {
        return Err(ControlError::CommandFailed {
            command: spec.display(),
            code: output.status_code.unwrap_or(-1),
            stderr: output.stderr,
        });
    }
    let updates = parse_transaction(&output.stdout);
    info!(pending = updates.len(), "update check finished");
    Ok(updates)
}

pub fn apply_spec() -> CommandSpec {
    CommandSpec::new("dnf5").args(["distro-sync", "-y"]).privileged()
}

pub fn summary(updates: &[PendingUpdate]) -> String {
    match updates.len() {
        0 => "System is up to date".to_string(),
        1 => "1 package to update".to_string(),
        n => format!("{} packages to update", n),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoUpdatePolicy {
    DownloadOnly,
    #[default]
    DownloadAndApply,
    Disabled,
}

impl AutoUpdatePolicy {
    pub const ALL: [AutoUpdatePolicy; 3] = [Self::DownloadOnly, Self::DownloadAndApply, Self::Disabled];

    fn flags(&self) -> (&'static str, &'static str) {
        match self {
            Self::DownloadOnly => ("yes", "no"),
            Self::DownloadAndApply => ("yes", "yes"),
            Self::Disabled => ("no", "no"),
        }
    }
}

impl fmt::Display for AutoUpdatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::DownloadOnly => "Download updates automatically but let me choose when to install them",
            Self::DownloadAndApply => "Download and install updates automatically",
            Self::Disabled => "Never download or install updates automatically",
        };
        f.write_str(text)
    }
}

const DEFAULT_AUTOMATIC_CONF: &str = "\
[commands]
download_updates = yes
apply_updates = yes

[emitters]
system_name = None
emit_via = None

[base]
debuglevel = 1
";

fn setting<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let (name, value) = line.split_once('=')?;
    (name.trim() == key).then(|| value.trim())
}

pub fn parse_policy(content: &str) -> AutoUpdatePolicy {
    let mut download = "yes";
    let mut apply = "yes";
    for line in content.lines() {
        if let Some(value) = setting(line, "download_updates") {
            download = value;
        } else if let Some(value) = setting(line, "apply_updates") {
            apply = value;
        }
    }
    match (download, apply) {
        ("yes", "yes") => AutoUpdatePolicy::DownloadAndApply,
        ("yes", _) => AutoUpdatePolicy::DownloadOnly,
        _ => AutoUpdatePolicy::Disabled,
    }
}

/// Rewrites both keys in place. Missing keys go right after the first line.
pub fn render_policy(existing: &str, policy: AutoUpdatePolicy) -> String {
    let source = if existing.trim().is_empty() { DEFAULT_AUTOMATIC_CONF } else { existing };
    let (download, apply) = policy.flags();

    let mut lines: Vec<String> = Vec::new();
    let (mut saw_download, mut saw_apply) = (false, false);
    for line in source.lines() {
        if setting(line, "download_updates").is_some() {
            lines.push(format!("download_updates = {}", download));
            saw_download = true;
        } else if setting(line, "apply_updates").is_some() {
            lines.push(format!("apply_updates = {}", apply));
            saw_apply = true;
        } else {
            lines.push(line.to_string());
        }
    }
    if !saw_download {
        lines.insert(1.min(lines.len()), format!("download_updates = {}", download));
    }
    if !saw_apply {
        lines.insert(2.min(lines.len()), format!("apply_updates = {}", apply));
    }

    let mut rendered = lines.join("\n");
    rendered.push('\n');
    rendered
}

pub async fn read_policy(path: &Path) -> AutoUpdatePolicy {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => parse_policy(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => AutoUpdatePolicy::default(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read dnf-automatic config");
            AutoUpdatePolicy::default()
        }
    }
}

pub async fn write_policy(policy: AutoUpdatePolicy) -> Result<()> {
    let existing = tokio::fs::read_to_string(AUTOMATIC_CONF).await.unwrap_or_default();
    let content = render_policy(&existing, policy);
    info!(?policy, "writing dnf-automatic policy");
    crate::exec::run_checked(&write_root_file_spec(AUTOMATIC_CONF, &content)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASSUMENO: &str = "\
Updating and loading repositories:
Repositories loaded.
Package                 Arch    Version              Repository         Size
Upgrading:
 bash                   x86_64  5.2.37-1-omv2590     cooker-x86_64   8.1 MiB
   replacing bash       x86_64  5.2.32-2-omv2590     cooker-x86_64   8.0 MiB
 mesa                   x86_64  24.3.3-1-omv2590     cooker-x86_64  12.4 MiB
Installing:
 kernel-desktop         x86_64  6.12.9-1-omv2590     cooker-x86_64 150.0 MiB
Removing:
 old-lib                noarch  1.0-1                @System
Transaction Summary:
 Installing:   1 package
 Upgrading:    2 packages
";

    #[test]
    fn parses_dnf5_transaction_table() {
        let updates = parse_transaction(ASSUMENO);
        let names: Vec<_> = updates.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["bash", "mesa", "kernel-desktop", "old-lib"]);
        assert_eq!(updates[0].action, UpdateAction::Upgrade);
        assert_eq!(updates[0].size.as_deref(), Some("8.1 MiB"));
        assert_eq!(updates[2].action, UpdateAction::Install);
        assert_eq!(updates[3].action, UpdateAction::Remove);
        assert_eq!(updates[3].size, None);
        assert_eq!(updates[3].repo.as_deref(), Some("@System"));
        assert_eq!(summary(&updates), "4 packages to update");
        assert_eq!(summary(&[]), "System is up to date");
    }

    #[test]
    fn policy_from_config() {
        assert_eq!(parse_policy(""), AutoUpdatePolicy::DownloadAndApply);
        assert_eq!(
            parse_policy("[commands]\ndownload_updates = yes\napply_updates = no\n"),
            AutoUpdatePolicy::DownloadOnly
        );
        assert_eq!(
            parse_policy("[commands]\ndownload_updates=no\napply_updates=no\n"),
            AutoUpdatePolicy::Disabled
        );
    }

    #[test]
    fn render_replaces_existing_keys() {
        let existing = "[commands]\nupgrade_type = default\ndownload_updates = yes\napply_updates = yes\n\n[base]\n";
        let rendered = render_policy(existing, AutoUpdatePolicy::Disabled);
        assert_eq!(
            rendered,
            "[commands]\nupgrade_type = default\ndownload_updates = no\napply_updates = no\n\n[base]\n"
        );
    }

    #[test]
    fn render_inserts_missing_keys_after_header() {
        let rendered = render_policy("[commands]\nrandom_sleep = 0\n", AutoUpdatePolicy::DownloadOnly);
        assert_eq!(
            rendered,
            "[commands]\ndownload_updates = yes\napply_updates = no\nrandom_sleep = 0\n"
        );
        let fresh = render_policy("", AutoUpdatePolicy::DownloadOnly);
        assert!(fresh.starts_with("[commands]\ndownload_updates = yes\napply_updates = no\n"));
        assert_eq!(parse_policy(&fresh), AutoUpdatePolicy::DownloadOnly);
    }

    #[tokio::test]
    async fn missing_config_means_download_and_apply() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            read_policy(&dir.path().join("automatic.conf")).await,
            AutoUpdatePolicy::DownloadAndApply
        );
    }
}
