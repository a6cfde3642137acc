//! Default login shell and GNOME Tweaks.

use std::path::Path;

use tracing::info;

use crate::error::{ControlError, Result};
use crate::exec::{run_checked, spawn_detached, CommandSpec};
use crate::system::packages;
use crate::utils::{binary_exists, current_username};

pub const TWEAKS_BINARY: &str = "/usr/bin/gnome-tweaks";
pub const TWEAKS_PACKAGE: &str = "gnome-tweaks";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shell {
    pub name: &'static str,
    pub package: &'static str,
    pub description: &'static str,
}

impl Shell {
    pub fn path(&self) -> String {
        format!("/bin/{}", self.name)
    }

    pub fn is_installed(&self) -> bool {
        binary_exists(&self.path())
    }

    pub fn title(&self) -> String {
        self.name.to_uppercase()
    }
}

pub const SHELLS: &[Shell] = &[
    Shell { name: "bash", package: "bash", description: "Default Linux shell with advanced features" },
    Shell { name: "zsh", package: "zsh", description: "Extended Bourne shell with many improvements" },
    Shell { name: "fish", package: "fish", description: "Friendly interactive shell with modern features" },
    Shell { name: "dash", package: "dash", description: "Lightweight POSIX-compliant shell" },
    Shell { name: "ksh", package: "ksh", description: "KornShell with advanced scripting capabilities" },
    Shell { name: "tcsh", package: "tcsh", description: "Enhanced C shell with programmable completion" },
];

pub fn shell(name: &str) -> Option<&'static Shell> {
    SHELLS.iter().find(|s| s.name == name)
}

/// Basename of a `$SHELL` value, bash when unset.
pub fn shell_name(value: Option<&str>) -> String {
    value
        .filter(|v| !v.is_empty())
        .and_then(|v| Path::new(v).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bash".to_string())
}

pub fn current_shell() -> String {
    shell_name(std::env::var("SHELL").ok().as_deref())
}

pub fn install_shell_spec(shell: &Shell) -> CommandSpec {
    packages::install_spec(&[shell.package], &[])
}

pub fn chsh_spec(shell: &Shell, user: &str) -> CommandSpec {
    CommandSpec::new("chsh")
        .args(["-s", shell.path().as_str(), user])
        .privileged()
}

pub async fn set_default_shell(shell: &Shell) -> Result<()> {
    let user = current_username()
        .ok_or_else(|| ControlError::validation("Could not determine the current user"))?;
    if !shell.is_installed() {
        return Err(ControlError::validation(format!("{} is not installed", shell.title())));
    }
    info!(shell = shell.name, %user, "changing default shell");
    run_checked(&chsh_spec(shell, &user)).await?;
    Ok(())
}

pub fn tweaks_installed() -> bool {
    binary_exists(TWEAKS_BINARY)
}

pub fn launch_tweaks() -> Result<()> {
    spawn_detached(TWEAKS_BINARY, &[])
}

pub fn install_tweaks_spec() -> CommandSpec {
    packages::install_spec(&[TWEAKS_PACKAGE], &[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_name_from_env() {
        assert_eq!(shell_name(Some("/usr/bin/zsh")), "zsh");
        assert_eq!(shell_name(Some("")), "bash");
        assert_eq!(shell_name(None), "bash");
    }

    #[test]
    fn chsh_for_user() {
        let fish = shell("fish").unwrap();
        assert_eq!(fish.title(), "FISH");
        assert_eq!(chsh_spec(fish, "alice").display(), "chsh -s /bin/fish alice");
        assert!(chsh_spec(fish, "alice").is_privileged());
        assert_eq!(install_shell_spec(fish).display(), "dnf install -y fish");
    }
}
