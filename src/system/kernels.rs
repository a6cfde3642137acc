//! Kernel flavours offered by the distribution and their install state.

use tracing::debug;

use crate::error::Result;
use crate::exec::{probe, run, CommandSpec};
use crate::system::packages;

pub const PROTECTED_KERNEL: &str = "kernel-desktop";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelKind {
    Desktop,
    Server,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub compiler: &'static str,
    pub kind: KernelKind,
    pub testing: bool,
}

impl KernelSpec {
    /// Suffix used in the boot image name, e.g. `desktop-gcc`.
    pub fn flavour(&self) -> &'static str {
        self.name.strip_prefix("kernel-").unwrap_or(self.name)
    }
}

const fn kernel(
    name: &'static str,
    description: &'static str,
    compiler: &'static str,
    kind: KernelKind,
    testing: bool,
) -> KernelSpec {
    KernelSpec { name, description, compiler, kind, testing }
}

pub const KERNELS: &[KernelSpec] = &[
    kernel("kernel-desktop", "Desktop kernel compiled with Clang", "Clang", KernelKind::Desktop, false),
    kernel("kernel-desktop-gcc", "Desktop kernel compiled with GCC", "GCC", KernelKind::Desktop, false),
    kernel("kernel-rc-desktop", "Release Candidate desktop kernel compiled with Clang", "Clang", KernelKind::Desktop, true),
    kernel("kernel-rc-desktop-gcc", "Release Candidate desktop kernel compiled with GCC", "GCC", KernelKind::Desktop, true),
    kernel("kernel-server", "Server kernel compiled with Clang", "Clang", KernelKind::Server, false),
    kernel("kernel-server-gcc", "Server kernel compiled with GCC", "GCC", KernelKind::Server, false),
    kernel("kernel-rc-server", "Release Candidate server kernel compiled with Clang", "Clang", KernelKind::Server, true),
    kernel("kernel-rc-server-gcc", "Release Candidate server kernel compiled with GCC", "GCC", KernelKind::Server, true),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelStatus {
    pub spec: KernelSpec,
    pub installed: bool,
    pub is_default: bool,
}

impl KernelStatus {
    pub fn is_protected(&self) -> bool {
        self.spec.name == PROTECTED_KERNEL
    }

    pub fn can_remove(&self) -> bool {
        self.installed && !self.is_default && !self.is_protected()
    }

    /// Why removal is refused, if it is.
    pub fn removal_blocker(&self) -> Option<&'static str> {
        if self.is_protected() {
            Some("The main desktop kernel is protected and cannot be removed.")
        } else if self.is_default {
            Some("The default system kernel cannot be removed for system stability.")
        } else {
            None
        }
    }
}

/// `kernel-desktop-6.12.1-1omv2590.x86_64` belongs to `kernel-desktop`, not to `kernel-desktop-gcc`.
pub fn is_installed(name: &str, installed_packages: &[String]) -> bool {
    installed_packages.iter().any(|package| {
        package == name
            || package
                .strip_prefix(name)
                .and_then(|rest| rest.strip_prefix('-'))
                .and_then(|rest| rest.chars().next())
                .is_some_and(|c| c.is_ascii_digit())
    })
}

/// Catalog entry whose flavour appears in the boot image path. The longest match wins.
pub fn default_kernel<'a>(path: &str, catalog: &'a [KernelSpec]) -> Option<&'a KernelSpec> {
    let image = path.rsplit('/').next().unwrap_or(path);
    catalog
        .iter()
        .filter(|spec| {
            let flavour = spec.flavour();
            image.contains(&format!("-{}-", flavour)) || image.ends_with(&format!("-{}", flavour))
        })
        .max_by_key(|spec| spec.flavour().len())
}

pub fn statuses(installed_packages: &[String], default_path: &str) -> Vec<KernelStatus> {
    let default = default_kernel(default_path, KERNELS).map(|spec| spec.name);
    KERNELS
        .iter()
        .map(|spec| KernelStatus {
            spec: *spec,
            installed: is_installed(spec.name, installed_packages),
            is_default: default == Some(spec.name),
        })
        .collect()
}

pub async fn query() -> Result<Vec<KernelStatus>> {
    let output = run(&CommandSpec::new("rpm").args(["-qa", "kernel*"])).await?;
    let installed: Vec<String> = output.stdout.lines().map(|l| l.trim().to_string()).collect();
    let default_path = probe("grubby", &["--default-kernel"]).await.unwrap_or_default();
    debug!(installed = installed.len(), %default_path, "queried kernels");
    Ok(statuses(&installed, &default_path))
}

pub fn install_spec(name: &str) -> CommandSpec {
    packages::install_spec(&[name], &[])
}

pub fn remove_spec(name: &str) -> CommandSpec {
    packages::remove_spec(&[name])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn installed() -> Vec<String> {
        vec![
            "kernel-desktop-6.12.1-1omv2590.x86_64".to_string(),
            "kernel-desktop-devel-6.12.1-1omv2590.x86_64".to_string(),
            "kernel-server-gcc-6.11.9-1omv2590.x86_64".to_string(),
            "kernel-firmware-20241210-1omv2590.noarch".to_string(),
        ]
    }

    #[test]
    fn installed_matches_exact_flavour() {
        let packages = installed();
        assert!(is_installed("kernel-desktop", &packages));
        assert!(!is_installed("kernel-desktop-gcc", &packages));
        assert!(is_installed("kernel-server-gcc", &packages));
        assert!(!is_installed("kernel-server", &packages));
    }

    #[test]
    fn default_prefers_longest_flavour() {
        let gcc = default_kernel("/boot/vmlinuz-6.11.9-server-gcc-1omv2590", KERNELS).unwrap();
        assert_eq!(gcc.name, "kernel-server-gcc");
        let clang = default_kernel("/boot/vmlinuz-6.12.1-desktop-1omv2590", KERNELS).unwrap();
        assert_eq!(clang.name, "kernel-desktop");
        assert!(default_kernel("", KERNELS).is_none());
    }

    #[test]
    fn removal_rules() {
        let list = statuses(&installed(), "/boot/vmlinuz-6.11.9-server-gcc-1omv2590");
        let find = |name: &str| list.iter().find(|k| k.spec.name == name).unwrap().clone();

        let desktop = find("kernel-desktop");
        assert!(desktop.installed && !desktop.is_default);
        assert!(!desktop.can_remove());
        assert!(desktop.removal_blocker().is_some());

        let server_gcc = find("kernel-server-gcc");
        assert!(server_gcc.is_default);
        assert!(!server_gcc.can_remove());

        let rc = find("kernel-rc-server");
        assert!(!rc.installed && !rc.can_remove());
        assert!(rc.spec.testing);
    }
}
