//! Connection settings launchers and connectivity checks.

use std::net::{IpAddr, UdpSocket};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::error::Result;
use crate::exec::{run, spawn_detached, which, CommandSpec};
use crate::utils::url_domain;

const UPTIME_TIMEOUT: Duration = Duration::from_secs(5);
const PARALLEL_CHECKS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    Wired,
    Wireless,
}

impl ConnectionKind {
    fn panel(&self) -> &'static str {
        match self {
            Self::Wired => "network",
            Self::Wireless => "wifi",
        }
    }
}

pub fn open_connection_settings(kind: ConnectionKind) -> Result<()> {
    if which("gnome-control-center").is_some() {
        spawn_detached("gnome-control-center", &[kind.panel()])
    } else {
        spawn_detached("nm-connection-editor", &[])
    }
}

/// Address of the interface that routes to the internet. Nothing is sent.
pub fn local_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    socket.local_addr().ok().map(|addr| addr.ip())
}

#[derive(Debug, Clone, PartialEq)]
pub struct PingResult {
    pub host: String,
    pub latency_ms: Option<f64>,
}

impl PingResult {
    pub fn working(&self) -> bool {
        self.latency_ms.is_some()
    }

    pub fn line(&self) -> String {
        match self.latency_ms {
            Some(ms) => format!("{}: ✓ Working (ping: {:.1}ms)", self.host, ms),
            None => format!("{}: ✗ Not responding", self.host),
        }
    }
}

pub fn parse_ping_latency(output: &str) -> Option<f64> {
    let rest = output.split("time=").nth(1)?;
    rest.split_whitespace().next()?.trim_end_matches("ms").parse().ok()
}

pub async fn ping(host: &str) -> PingResult {
    let spec = CommandSpec::new("ping").args(["-c", "1", "-W", "2", host]);
    let latency_ms = match run(&spec).await {
        Ok(output) if output.success() => parse_ping_latency(&output.stdout),
        _ => None,
    };
    debug!(host, ?latency_ms, "ping finished");
    PingResult {
        host: host.to_string(),
        latency_ms,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionReport {
    pub ip: Option<IpAddr>,
    pub pings: Vec<PingResult>,
}

impl ConnectionReport {
    pub fn working(&self) -> bool {
        self.pings.iter().any(PingResult::working)
    }

    pub fn render(&self) -> String {
        let ip = self
            .ip
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "Unable to determine IP address".to_string());
        let mut text = format!("Current IP Address: {}\n\nPing Results:\n\n", ip);
        for ping in &self.pings {
            text.push_str(&ping.line());
            text.push('\n');
        }
        let overall = if self.working() { "✓ Working" } else { "✗ Not working" };
        text.push_str(&format!("\nOverall Network Status: {}", overall));
        text
    }
}

pub async fn check_connection(hosts: &[String]) -> ConnectionReport {
    let ip = tokio::task::spawn_blocking(local_ip).await.ok().flatten();
    let mut pings = Vec::with_capacity(hosts.len());
    for host in hosts {
        pings.push(ping(host).await);
    }
    let report = ConnectionReport { ip, pings };
    info!(working = report.working(), "connection check finished");
    report
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UptimeResult {
    pub domain: String,
    pub up: bool,
}

impl UptimeResult {
    pub fn status(&self) -> &'static str {
        if self.up { "Working" } else { "Not responding" }
    }
}

/// Client and server errors both count as the service being down.
fn answered(status: StatusCode) -> bool {
    status.is_success()
}

/// Probes every URL concurrently and reports them in the order given.
pub async fn check_uptime(urls: &[String]) -> Result<Vec<UptimeResult>> {
    let client = Client::builder()
        .user_agent(concat!("tears-of-mandrake/", env!("CARGO_PKG_VERSION")))
        .timeout(UPTIME_TIMEOUT)
        .build()?;

    let mut results: Vec<(usize, UptimeResult)> = stream::iter(urls.iter().cloned().enumerate())
        .map(|(index, url)| {
            let client = client.clone();
            async move {
                let up = match client.get(url.as_str()).send().await {
                    Ok(response) => answered(response.status()),
                    Err(e) => {
                        debug!(%url, error = %e, "service did not answer");
                        false
                    }
                };
                (index, UptimeResult { domain: url_domain(&url), up })
            }
        })
        .buffer_unordered(PARALLEL_CHECKS)
        .collect()
        .await;

    results.sort_by_key(|(index, _)| *index);
    Ok(results.into_iter().map(|(_, result)| result).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_latency_from_output() {
        let output = "\
PING www.google.com (142.250.186.196) 56(84) bytes of data.
64 bytes from waw07s05-in-f4.1e100.net (142.250.186.196): icmp_seq=1 ttl=117 time=13.4 ms
";
        assert_eq!(parse_ping_latency(output), Some(13.4));
        assert_eq!(parse_ping_latency("1 packets transmitted, 0 received"), None);
    }

    #[test]
    fn report_is_working_when_any_host_answers() {
        let report = ConnectionReport {
            ip: None,
            pings: vec![
                PingResult { host: "a.example".into(), latency_ms: None },
                PingResult { host: "b.example".into(), latency_ms: Some(21.04) },
            ],
        };
        assert!(report.working());
        let text = report.render();
        assert!(text.starts_with("Current IP Address: Unable to determine IP address"));
        assert!(text.contains("a.example: ✗ Not responding"));
        assert!(text.contains("b.example: ✓ Working (ping: 21.0ms)"));
        assert!(text.ends_with("Overall Network Status: ✓ Working"));
    }

    #[test]
    fn error_responses_are_not_responding() {
        assert!(answered(StatusCode::OK));
        assert!(!answered(StatusCode::NOT_FOUND));
        assert!(!answered(StatusCode::FORBIDDEN));
        assert!(!answered(StatusCode::SERVICE_UNAVAILABLE));
    }

    #[tokio::test]
    async fn unreachable_services_keep_their_order() {
        let urls = vec![
            "http://127.0.0.1:9/first".to_string(),
            "http://127.0.0.1:9/second".to_string(),
        ];
        let results = check_uptime(&urls).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| !r.up));
        assert_eq!(results[0].domain, "127.0.0.1:9");
        assert_eq!(results[1].domain, "127.0.0.1:9");
        assert_eq!(results[0].status(), "Not responding");
    }
}
