//! CPU, memory, storage, GPU and display details.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::exec::probe;
use crate::system::system_info::glx_field;
use crate::utils::{format_bytes, parse_meminfo, percent};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuInfo {
    pub model: String,
    pub physical_cores: usize,
    pub logical_cores: usize,
    pub current_mhz: Option<f64>,
    pub max_mhz: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryUsage {
    pub total: u64,
    pub available: u64,
    pub used: u64,
    pub percent: f64,
}

impl MemoryUsage {
    fn new(total: u64, available: u64) -> Self {
        let used = total.saturating_sub(available);
        Self {
            total,
            available,
            used,
            percent: percent(used, total),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} of {} used ({:.1}%), {} available",
            format_bytes(self.used),
            format_bytes(self.total),
            self.percent,
            format_bytes(self.available)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiskUsage {
    pub device: String,
    pub mount: String,
    pub total: u64,
    pub used: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpuInfo {
    pub name: String,
    pub driver: String,
    pub memory_total: Option<String>,
    pub memory_used: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayInfo {
    pub output: String,
    pub resolution: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HardwareInfo {
    pub cpu: CpuInfo,
    pub memory: MemoryUsage,
    pub swap: MemoryUsage,
    pub disks: Vec<DiskUsage>,
    pub gpus: Vec<GpuInfo>,
    pub displays: Vec<DisplayInfo>,
}

pub async fn collect() -> HardwareInfo {
    let mut cpu = tokio::fs::read_to_string("/proc/cpuinfo")
        .await
        .map(|content| parse_cpuinfo(&content))
        .unwrap_or_default();
    cpu.max_mhz = tokio::fs::read_to_string("/sys/devices/system/cpu/cpu0/cpufreq/cpuinfo_max_freq")
        .await
        .ok()
        .and_then(|khz| khz.trim().parse::<f64>().ok())
        .map(|khz| khz / 1000.0);

    let meminfo = tokio::fs::read_to_string("/proc/meminfo")
        .await
        .map(|content| parse_meminfo(&content))
        .unwrap_or_default();
    let (memory, swap) = memory_usage(&meminfo);

    let disks = probe(
        "df",
        &["-B1", "--output=source,target,size,used", "-x", "tmpfs", "-x", "devtmpfs", "-x", "squashfs", "-x", "efivarfs"],
    )
    .await
    .map(|out| parse_df(&out))
    .unwrap_or_default();

    let mut gpus = probe(
        "nvidia-smi",
        &[
            "--query-gpu=gpu_name,driver_version,memory.total,memory.used",
            "--format=csv,noheader,nounits",
        ],
    )
    .await
    .map(|out| parse_nvidia_smi(&out))
    .unwrap_or_default();
    if gpus.is_empty() {
        gpus.extend(probe("glxinfo", &[]).await.and_then(|out| gpu_from_glxinfo(&out)));
    }

    let displays = probe("xrandr", &[]).await.map(|out| parse_xrandr(&out)).unwrap_or_default();

    let info = HardwareInfo {
        cpu,
        memory,
        swap,
        disks,
        gpus,
        displays,
    };
    debug!(disks = info.disks.len(), gpus = info.gpus.len(), "collected hardware information");
    info
}

pub fn parse_cpuinfo(content: &str) -> CpuInfo {
    let mut model = None;
    let mut logical = 0;
    let mut cores = HashSet::new();
    let mut mhz = Vec::new();
    let mut physical_id = String::new();

    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        match key {
            "processor" => logical += 1,
            "model name" if model.is_none() => model = Some(value.to_string()),
            "physical id" => physical_id = value.to_string(),
            "core id" => {
                cores.insert((physical_id.clone(), value.to_string()));
            }
            "cpu MHz" => {
                if let Ok(value) = value.parse::<f64>() {
                    mhz.push(value);
                }
            }
            _ => {}
        }
    }

    CpuInfo {
        model: model.unwrap_or_else(|| "Unknown".to_string()),
        physical_cores: if cores.is_empty() { logical } else { cores.len() },
        logical_cores: logical,
        current_mhz: (!mhz.is_empty()).then(|| mhz.iter().sum::<f64>() / mhz.len() as f64),
        max_mhz: None,
    }
}

pub fn memory_usage(meminfo: &HashMap<String, u64>) -> (MemoryUsage, MemoryUsage) {
    let kib = |key: &str| meminfo.get(key).copied().unwrap_or(0) * 1024;
    let memory = MemoryUsage::new(kib("MemTotal"), kib("MemAvailable"));
    let swap = MemoryUsage::new(kib("SwapTotal"), kib("SwapFree"));
    (memory, swap)
}

pub fn parse_df(output: &str) -> Vec<DiskUsage> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 4 {
                return None;
            }
            let total: u64 = parts[2].parse().ok()?;
            let used: u64 = parts[3].parse().ok()?;
            if total == 0 {
                return None;
            }
            Some(DiskUsage {
                device: parts[0].to_string(),
                mount: parts[1].to_string(),
                total,
                used,
                percent: percent(used, total),
            })
        })
        .collect()
}

pub fn parse_nvidia_smi(output: &str) -> Vec<GpuInfo> {
    output
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split(',').map(str::trim).collect();
            if parts.len() < 4 || parts[0].is_empty() {
                return None;
            }
            Some(GpuInfo {
                name: parts[0].to_string(),
                driver: parts[1].to_string(),
                memory_total: Some(format!("{} MB", parts[2])),
                memory_used: Some(format!("{} MB", parts[3])),
            })
        })
        .collect()
}

pub fn gpu_from_glxinfo(output: &str) -> Option<GpuInfo> {
    let renderer = glx_field(output, "OpenGL renderer string")?;
    let vendor = glx_field(output, "OpenGL vendor string").unwrap_or("Unknown");
    let version = glx_field(output, "OpenGL version string").unwrap_or("Unknown");
    Some(GpuInfo {
        name: format!("{} {}", vendor, renderer),
        driver: version.to_string(),
        memory_total: None,
        memory_used: None,
    })
}

pub fn parse_xrandr(output: &str) -> Vec<DisplayInfo> {
    output
        .lines()
        .filter(|line| line.contains(" connected"))
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let name = parts.next()?;
            let resolution = line
                .split_whitespace()
                .find(|part| part.contains('x') && part.contains('+'))
                .and_then(|part| part.split('+').next())
                .unwrap_or("unknown");
            Some(DisplayInfo {
                output: name.to_string(),
                resolution: resolution.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CPUINFO: &str = "\
processor\t: 0
model name\t: AMD Ryzen 7 5800X 8-Core Processor
physical id\t: 0
core id\t\t: 0
cpu MHz\t\t: 3000.000
processor\t: 1
model name\t: AMD Ryzen 7 5800X 8-Core Processor
physical id\t: 0
core id\t\t: 0
cpu MHz\t\t: 4000.000
processor\t: 2
model name\t: AMD Ryzen 7 5800X 8-Core Processor
physical id\t: 0
core id\t\t: 1
cpu MHz\t\t: 3500.000
";

    #[test]
    fn cpuinfo_counts_cores_and_threads() {
        let cpu = parse_cpuinfo(CPUINFO);
        assert_eq!(cpu.model, "AMD Ryzen 7 5800X 8-Core Processor");
        assert_eq!(cpu.logical_cores, 3);
        assert_eq!(cpu.physical_cores, 2);
        assert_eq!(cpu.current_mhz, Some(3500.0));
    }

    #[test]
    fn memory_and_swap_from_meminfo() {
        let meminfo = parse_meminfo(
            "MemTotal: 1000 kB\nMemAvailable: 250 kB\nSwapTotal: 0 kB\nSwapFree: 0 kB\n",
        );
        let (memory, swap) = memory_usage(&meminfo);
        assert_eq!(memory.total, 1_024_000);
        assert_eq!(memory.used, 768_000);
        assert_eq!(memory.percent, 75.0);
        assert_eq!(swap.percent, 0.0);
    }

    #[test]
    fn df_rows_skip_header_and_empty_filesystems() {
        let output = "\
Filesystem     Mounted on        1B-blocks         Used
/dev/nvme0n1p2 /              500000000000 125000000000
/dev/nvme0n1p1 /boot/efi          0            0
";
        let disks = parse_df(output);
        assert_eq!(disks.len(), 1);
        assert_eq!(disks[0].mount, "/");
        assert_eq!(disks[0].percent, 25.0);
    }

    #[test]
    fn nvidia_smi_csv() {
        let gpus = parse_nvidia_smi("NVIDIA GeForce RTX 3070, 565.77, 8192, 512\n");
        assert_eq!(gpus.len(), 1);
        assert_eq!(gpus[0].name, "NVIDIA GeForce RTX 3070");
        assert_eq!(gpus[0].memory_total.as_deref(), Some("8192 MB"));
    }

    #[test]
    fn xrandr_connected_outputs() {
        let output = "\
Screen 0: minimum 320 x 200, current 2560 x 1440, maximum 16384 x 16384
DP-1 connected primary 2560x1440+0+0 (normal left inverted right x axis y axis) 597mm x 336mm
HDMI-1 disconnected (normal left inverted right x axis y axis)
DP-2 connected (normal left inverted right x axis y axis)
";
        let displays = parse_xrandr(output);
        assert_eq!(
            displays,
            vec![
                DisplayInfo { output: "DP-1".into(), resolution: "2560x1440".into() },
                DisplayInfo { output: "DP-2".into(), resolution: "unknown".into() },
            ]
        );
    }
}
