use std::collections::HashMap;
use std::path::Path;

const BYTE_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, BYTE_UNITS[unit])
}

pub fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        used as f64 * 100.0 / total as f64
    }
}

/// `KEY=value` pairs from an os-release style file, quotes stripped.
pub fn parse_os_release(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}

pub fn read_os_release() -> HashMap<String, String> {
    ["/etc/os-release", "/usr/lib/os-release"]
        .iter()
        .find_map(|path| std::fs::read_to_string(path).ok())
        .map(|content| parse_os_release(&content))
        .unwrap_or_default()
}

/// Values from /proc/meminfo in kibibytes.
pub fn parse_meminfo(content: &str) -> HashMap<String, u64> {
    content
        .lines()
        .filter_map(|line| {
            let (key, rest) = line.split_once(':')?;
            let value = rest.split_whitespace().next()?.parse().ok()?;
            Some((key.trim().to_string(), value))
        })
        .collect()
}

pub fn current_username() -> Option<String> {
    std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .ok()
        .filter(|name| !name.is_empty())
}

pub fn binary_exists(path: &str) -> bool {
    Path::new(path).exists()
}

/// Host part of a URL, used as the display name of uptime checks.
pub fn url_domain(url: &str) -> String {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or(without_scheme)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_bytes_with_two_decimals() {
        assert_eq!(format_bytes(512), "512.00 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(8 * 1024 * 1024 * 1024), "8.00 GB");
    }

    #[test]
    fn parses_quoted_os_release() {
        let release = parse_os_release(
            "NAME=\"OpenMandriva Lx\"\nVERSION=\"6.0 (Rome)\"\n# comment\nID=openmandriva\n",
        );
        assert_eq!(release.get("NAME").map(String::as_str), Some("OpenMandriva Lx"));
        assert_eq!(release.get("VERSION").map(String::as_str), Some("6.0 (Rome)"));
        assert_eq!(release.get("ID").map(String::as_str), Some("openmandriva"));
    }

    #[test]
    fn parses_meminfo_values() {
        let info = parse_meminfo("MemTotal:       16303412 kB\nSwapFree:              0 kB\nHugePages_Total:       0\n");
        assert_eq!(info.get("MemTotal"), Some(&16303412));
        assert_eq!(info.get("SwapFree"), Some(&0));
        assert_eq!(info.get("HugePages_Total"), Some(&0));
    }

    #[test]
    fn url_domain_is_the_host_only() {
        assert_eq!(url_domain("https://abf.openmandriva.org"), "abf.openmandriva.org");
        assert_eq!(url_domain("https://github.com/OpenMandrivaAssociation"), "github.com");
        assert_eq!(url_domain("https://forum.openmandriva.org/"), "forum.openmandriva.org");
        assert_eq!(url_domain("http://127.0.0.1:9?x=1"), "127.0.0.1:9");
    }

    #[test]
    fn percent_handles_zero_total() {
        assert_eq!(percent(5, 0), 0.0);
        assert_eq!(percent(1, 4), 25.0);
    }
}
