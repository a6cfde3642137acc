//! Project news, published as dated sections of a markdown file.

use std::sync::LazyLock;
use std::time::Duration;

use chrono::NaiveDate;
use regex::Regex;
use reqwest::Client;
use tracing::{info, warn};

use crate::error::Result;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^###\s+(\d{4}\.\d{2}\.\d{2})\s*$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsEntry {
    pub date: NaiveDate,
    pub lines: Vec<String>,
}

impl NewsEntry {
    pub fn title(&self) -> String {
        self.date.format("%Y.%m.%d").to_string()
    }
}

/// Entries newest first. Sections without content or with impossible dates are dropped.
pub fn parse_news(content: &str) -> Vec<NewsEntry> {
    let headers: Vec<_> = HEADER_RE.captures_iter(content).collect();
    let mut entries: Vec<NewsEntry> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, caps)| {
            let whole = caps.get(0)?;
            let date = NaiveDate::parse_from_str(&caps[1], "%Y.%m.%d").ok()?;
            let end = headers
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(content.len(), |m| m.start());
            let lines: Vec<String> = content[whole.end()..end]
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect();
            (!lines.is_empty()).then_some(NewsEntry { date, lines })
        })
        .collect();
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    entries
}

async fn fetch(url: &str) -> Result<String> {
    let client = Client::builder()
        .user_agent(concat!("tears-of-mandrake/", env!("CARGO_PKG_VERSION")))
        .timeout(FETCH_TIMEOUT)
        .build()?;
    let body = client
        .get(url)
        .header("Accept", "text/plain")
        .header("Cache-Control", "no-cache")
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(body)
}

/// Remote news, or the built-in entries when nothing usable came back.
pub async fn load(url: &str) -> Vec<NewsEntry> {
    match fetch(url).await {
        Ok(body) => {
            let entries = parse_news(&body);
            if entries.is_empty() {
                warn!(url, "no news entries in response");
                fallback()
            } else {
                info!(count = entries.len(), "news loaded");
                entries
            }
        }
        Err(e) => {
            warn!(url, error = %e, "could not fetch news");
            fallback()
        }
    }
}

fn entry(date: (i32, u32, u32), lines: &[&str]) -> Option<NewsEntry> {
    Some(NewsEntry {
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2)?,
        lines: lines.iter().filter(|l| !l.is_empty()).map(|l| l.to_string()).collect(),
    })
}

pub fn fallback() -> Vec<NewsEntry> {
    [
        entry(
            (2025, 1, 5),
            &[
                "### Welcome to Tears of Mandrake!",
                "We are excited to announce the first release of Tears of Mandrake, a powerful system management tool for OpenMandriva.",
                "### Key Features:",
                "• Advanced Kernel Management with support for multiple kernels",
                "• Easy shell switching and configuration",
                "• GNOME Tweaks integration",
                "• Modern, user-friendly interface built with GTK4 and libadwaita",
                "### Coming Soon:",
                "• System backup and restore",
                "• Advanced hardware monitoring",
                "• Performance optimization tools",
            ],
        ),
        entry(
            (2025, 1, 4),
            &[
                "### Development Update",
                "The development team has been working hard on improving the kernel management features:",
                "• Added support for Clang and GCC compiled kernels",
                "• Implemented kernel installation progress tracking",
                "• Added safety features to prevent removal of the running kernel",
                "### Community",
                "Join our growing community! We welcome contributors of all skill levels.",
                "Visit our GitHub repository to get involved.",
            ],
        ),
        entry(
            (2025, 1, 3),
            &[
                "### Project Announcement",
                "Today marks the beginning of the Tears of Mandrake project, a new initiative to create a comprehensive system management tool for OpenMandriva.",
                "### Goals:",
                "• Simplify system administration tasks",
                "• Provide a modern, user-friendly interface",
                "• Integrate deeply with OpenMandriva",
                "• Build a strong community around the project",
            ],
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_sorted_newest_first() {
        let content = "\
# Tears of Mandrake

### 2025.01.03
First post.

### 2025.02.10
  Second post.
### Features
- shells

### 2025.02.30
Impossible date.

### 2025.03.01
";
        let entries = parse_news(content);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title(), "2025.02.10");
        assert_eq!(entries[0].lines, vec!["Second post.", "### Features", "- shells"]);
        assert_eq!(entries[1].lines, vec!["First post."]);
    }

    #[test]
    fn fallback_has_three_dated_entries() {
        let entries = fallback();
        let titles: Vec<_> = entries.iter().map(NewsEntry::title).collect();
        assert_eq!(titles, vec!["2025.01.05", "2025.01.04", "2025.01.03"]);
    }

    #[tokio::test]
    async fn unreachable_source_falls_back() {
        let entries = load("http://127.0.0.1:9/README.md").await;
        assert_eq!(entries.len(), 3);
    }
}
