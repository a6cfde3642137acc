//! The optional OpenMandriva repositories: extra, restricted and non-free.

use std::fmt;

use tracing::info;

use crate::config::OPENMANDRIVA_RELEASE;
use crate::error::Result;
use crate::exec::{probe, run_checked, CommandSpec};
use crate::system::packages::repo_arch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionalRepo {
    Extra,
    Restricted,
    NonFree,
}

impl OptionalRepo {
    pub const ALL: [OptionalRepo; 3] = [Self::Extra, Self::Restricted, Self::NonFree];

    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Extra => "extra",
            Self::Restricted => "restricted",
            Self::NonFree => "non-free",
        }
    }

    pub fn id(&self, base: &str, arch: &str) -> String {
        format!("{}-{}-{}", base, arch, self.suffix())
    }
}

impl fmt::Display for OptionalRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Extra => "Extra",
            Self::Restricted => "Restricted",
            Self::NonFree => "Non-Free",
        })
    }
}

/// Release family named in `/etc/openmandriva-release`.
pub fn base_type(release: &str) -> &'static str {
    if release.contains("ROME") || release.contains("Rolling") {
        "rolling"
    } else if release.contains("ROCK") {
        "rock"
    } else {
        "cooker"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoState {
    pub repo: OptionalRepo,
    pub id: String,
    pub enabled: bool,
}

impl RepoState {
    pub fn toggle_label(&self) -> String {
        let verb = if self.enabled { "Disable" } else { "Enable" };
        format!("{} {}", verb, self.repo)
    }
}

/// Repo ids listed by `dnf repolist --enabled`.
pub fn enabled_ids(repolist: &str) -> Vec<String> {
    repolist
        .lines()
        .skip_while(|line| !line.trim_start().starts_with("repo id"))
        .skip(1)
        .filter_map(|line| line.split_whitespace().next())
        .map(String::from)
        .collect()
}

pub fn states(base: &str, arch: &str, enabled: &[String]) -> Vec<RepoState> {
    OptionalRepo::ALL
        .iter()
        .map(|repo| {
            let id = repo.id(base, arch);
            RepoState {
                repo: *repo,
                enabled: enabled.iter().any(|e| *e == id),
                id,
            }
        })
        .collect()
}

pub async fn query() -> Result<Vec<RepoState>> {
    let release = tokio::fs::read_to_string(OPENMANDRIVA_RELEASE).await.unwrap_or_default();
    let base = base_type(&release);
    let arch = repo_arch(&probe("uname", &["-m"]).await.unwrap_or_default());
    let repolist = run_checked(&CommandSpec::new("dnf").args(["repolist", "--enabled"])).await?;
    Ok(states(base, arch, &enabled_ids(&repolist)))
}

/// Enable all when any is disabled, otherwise disable all.
pub fn all_target(states: &[RepoState]) -> bool {
    !states.iter().all(|s| s.enabled)
}

pub fn setopt_spec(ids: &[&str], enable: bool) -> CommandSpec {
    let value = if enable { 1 } else { 0 };
    CommandSpec::new("dnf")
        .args(["config-manager", "setopt"])
        .args(ids.iter().map(|id| format!("{}.enabled={}", id, value)))
        .privileged()
}

pub async fn set_enabled(ids: &[&str], enable: bool) -> Result<()> {
    info!(?ids, enable, "changing repository state");
    run_checked(&setopt_spec(ids, enable)).await?;
    run_checked(&CommandSpec::new("dnf").args(["clean", "expire-cache"])).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_file_names_the_base() {
        assert_eq!(base_type("OpenMandriva Lx release 6.0 (ROME) for x86_64"), "rolling");
        assert_eq!(base_type("OpenMandriva Lx release 5.0 (ROCK) for x86_64"), "rock");
        assert_eq!(base_type(""), "cooker");
    }

    #[test]
    fn repolist_states() {
        let repolist = "\
Updating and loading repositories:
repo id                      repo name
rolling-x86_64               OpenMandriva Rolling - x86_64
rolling-x86_64-non-free      OpenMandriva Rolling - Non-free - x86_64
rolling-x86_64-extra         OpenMandriva Rolling - Extra - x86_64
";
        let states = states("rolling", "x86_64", &enabled_ids(repolist));
        assert!(states[0].enabled);
        assert_eq!(states[1].id, "rolling-x86_64-restricted");
        assert!(!states[1].enabled);
        assert_eq!(states[1].toggle_label(), "Enable Restricted");
        assert_eq!(states[2].toggle_label(), "Disable Non-Free");
        assert!(all_target(&states));
    }

    #[test]
    fn setopt_covers_each_id() {
        let spec = setopt_spec(&["cooker-x86_64-extra", "cooker-x86_64-non-free"], false);
        assert_eq!(
            spec.display(),
            "dnf config-manager setopt cooker-x86_64-extra.enabled=0 cooker-x86_64-non-free.enabled=0"
        );
        assert!(spec.is_privileged());
    }
}
