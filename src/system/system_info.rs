//! Overview of the running system.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::exec::probe;
use crate::utils::read_os_release;

const KNOWN_DESKTOPS: &[&str] = &["gnome", "kde", "xfce", "mate", "lxde", "cinnamon"];
const PREFERRED_MODULES: &[&str] = &["nvidia", "amdgpu", "radeon", "nouveau"];

static MESA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"OpenGL version string: .*Mesa (\d+\.\d+\.\d+)").expect("valid regex")
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemInfo {
    pub system_name: String,
    pub distribution: String,
    pub architecture: String,
    pub kernel: String,
    pub desktop_environment: String,
    pub graphics_driver: String,
    pub hostname: String,
}

impl SystemInfo {
    /// Label/value pairs in display order.
    pub fn rows(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("System", self.system_name.as_str()),
            ("Distribution", self.distribution.as_str()),
            ("Architecture", self.architecture.as_str()),
            ("Kernel", self.kernel.as_str()),
            ("Desktop Environment", self.desktop_environment.as_str()),
            ("Graphics Driver", self.graphics_driver.as_str()),
            ("Hostname", self.hostname.as_str()),
        ]
    }
}

pub async fn collect() -> SystemInfo {
    let unknown = || "Unknown".to_string();
    let info = SystemInfo {
        system_name: probe("uname", &["-s"]).await.unwrap_or_else(unknown),
        distribution: distribution_name(&read_os_release()),
        architecture: probe("uname", &["-m"]).await.unwrap_or_else(unknown),
        kernel: probe("uname", &["-r"]).await.unwrap_or_else(unknown),
        desktop_environment: desktop_environment().await,
        graphics_driver: graphics_driver().await,
        hostname: probe("uname", &["-n"]).await.unwrap_or_else(unknown),
    };
    debug!(?info, "collected system information");
    info
}

pub fn distribution_name(os_release: &HashMap<String, String>) -> String {
    if let Some(pretty) = os_release.get("PRETTY_NAME").filter(|v| !v.is_empty()) {
        return pretty.clone();
    }
    match (os_release.get("NAME"), os_release.get("VERSION")) {
        (Some(name), Some(version)) => format!("{} {}", name, version),
        (Some(name), None) => name.clone(),
        _ => "Unknown".to_string(),
    }
}

pub fn desktop_from_env(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_uppercase)
}

async fn desktop_environment() -> String {
    let env_value = std::env::var("XDG_CURRENT_DESKTOP").ok();
    if let Some(desktop) = desktop_from_env(env_value.as_deref()) {
        return desktop;
    }
    for desktop in KNOWN_DESKTOPS {
        if probe("pgrep", &["-l", *desktop]).await.is_some_and(|out| !out.is_empty()) {
            return desktop.to_uppercase();
        }
    }
    "Unknown".to_string()
}

async fn graphics_driver() -> String {
    if let Some(driver) = probe("glxinfo", &[]).await.and_then(|out| driver_from_glxinfo(&out)) {
        return driver;
    }
    if let Some(version) = probe("nvidia-smi", &["--query-gpu=driver_version", "--format=csv,noheader"])
        .await
        .filter(|v| !v.is_empty())
    {
        return format!("NVIDIA {}", version);
    }
    probe("lspci", &["-k"])
        .await
        .and_then(|out| driver_from_lspci(&out))
        .unwrap_or_else(|| "Unknown".to_string())
}

pub fn driver_from_glxinfo(output: &str) -> Option<String> {
    if let Some(caps) = MESA_RE.captures(output) {
        return Some(format!("Mesa {}", &caps[1]));
    }
    let vendor = glx_field(output, "OpenGL vendor string")?;
    let version = glx_field(output, "OpenGL version string")?;
    if vendor.to_lowercase().contains("nvidia") {
        Some(format!("NVIDIA {}", version))
    } else {
        Some(format!("{} - {}", vendor, version))
    }
}

pub(crate) fn glx_field<'a>(output: &'a str, key: &str) -> Option<&'a str> {
    output.lines().find_map(|line| {
        line.trim()
            .strip_prefix(key)
            .and_then(|rest| rest.strip_prefix(':'))
            .map(str::trim)
    })
}

/// Kernel module of the first display controller in `lspci -k` output.
pub fn driver_from_lspci(output: &str) -> Option<String> {
    let lines: Vec<&str> = output.lines().collect();
    for (index, line) in lines.iter().enumerate() {
        if !(line.contains("VGA") || line.contains("3D controller")) {
            continue;
        }
        for candidate in lines.iter().skip(index + 1).take(4) {
            let Some((_, modules)) = candidate.split_once("Kernel modules:") else {
                continue;
            };
            let modules: Vec<&str> = modules
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|m| !m.is_empty())
                .collect();
            let chosen = PREFERRED_MODULES
                .iter()
                .find(|preferred| modules.contains(*preferred))
                .copied()
                .or_else(|| modules.first().copied())?;
            return Some(format!("Driver: {}", chosen));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distribution_prefers_pretty_name() {
        let mut release = HashMap::new();
        release.insert("NAME".to_string(), "OpenMandriva Lx".to_string());
        release.insert("VERSION".to_string(), "6.0 (Rome)".to_string());
        assert_eq!(distribution_name(&release), "OpenMandriva Lx 6.0 (Rome)");

        release.insert("PRETTY_NAME".to_string(), "OpenMandriva Lx 6.0 Rome".to_string());
        assert_eq!(distribution_name(&release), "OpenMandriva Lx 6.0 Rome");

        assert_eq!(distribution_name(&HashMap::new()), "Unknown");
    }

    #[test]
    fn glxinfo_mesa_version() {
        let output = "OpenGL vendor string: AMD\nOpenGL version string: 4.6 (Compatibility Profile) Mesa 24.3.2\n";
        assert_eq!(driver_from_glxinfo(output).as_deref(), Some("Mesa 24.3.2"));
    }

    #[test]
    fn glxinfo_proprietary_vendor() {
        let output = "OpenGL vendor string: NVIDIA Corporation\nOpenGL version string: 4.6.0 NVIDIA 565.77\n";
        assert_eq!(driver_from_glxinfo(output).as_deref(), Some("NVIDIA 4.6.0 NVIDIA 565.77"));
    }

    #[test]
    fn lspci_prefers_known_modules() {
        let output = "\
00:02.0 Host bridge: Intel Corporation Device
01:00.0 VGA compatible controller: NVIDIA Corporation AD106 [GeForce RTX 4060 Ti]
\tSubsystem: Gigabyte Technology Co., Ltd Device 4116
\tKernel driver in use: nvidia
\tKernel modules: nouveau, nvidia_drm, nvidia
";
        assert_eq!(driver_from_lspci(output).as_deref(), Some("Driver: nvidia"));
    }

    #[test]
    fn lspci_without_modules_is_none() {
        assert_eq!(driver_from_lspci("00:00.0 Host bridge: Intel\n"), None);
    }

    #[test]
    fn desktop_env_is_uppercased() {
        assert_eq!(desktop_from_env(Some("KDE")).as_deref(), Some("KDE"));
        assert_eq!(desktop_from_env(Some("gnome")).as_deref(), Some("GNOME"));
        assert_eq!(desktop_from_env(Some("  ")), None);
        assert_eq!(desktop_from_env(None), None);
    }
}
