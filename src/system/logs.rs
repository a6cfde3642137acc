//! Collects the boot journal and kernel ring buffer into the user's documents.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{info, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;
use crate::exec::{run, CommandSpec};

#[derive(Debug, Clone, PartialEq)]
pub struct CollectedLogs {
    pub directory: PathBuf,
    pub journal: PathBuf,
    pub dmesg: PathBuf,
    pub archive: PathBuf,
}

pub async fn collect(output_dir: &Path) -> Result<CollectedLogs> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let journal = capture(CommandSpec::new("journalctl").args(["-b", "--no-pager"])).await;
    let dmesg = capture(CommandSpec::new("dmesg")).await;

    let dir = output_dir.to_path_buf();
    let collected = tokio::task::spawn_blocking(move || write_bundle(&dir, &timestamp, &journal, &dmesg))
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))??;
    info!(directory = %collected.directory.display(), "system logs collected");
    Ok(collected)
}

/// Output of a collector, or a note about why it is missing.
async fn capture(spec: CommandSpec) -> String {
    match run(&spec).await {
        Ok(output) if output.success() => output.stdout,
        Ok(output) => {
            warn!(command = %spec.display(), code = ?output.status_code, "log collector failed");
            format!(
                "# `{}` exited with code {:?}\n{}\n{}",
                spec.display(),
                output.status_code,
                output.stderr.trim(),
                output.stdout
            )
        }
        Err(e) => {
            warn!(command = %spec.display(), error = %e, "log collector could not run");
            format!("# `{}` could not run: {}\n", spec.display(), e)
        }
    }
}

pub fn write_bundle(dir: &Path, timestamp: &str, journal: &str, dmesg: &str) -> Result<CollectedLogs> {
    std::fs::create_dir_all(dir)?;

    let journal_path = dir.join(format!("journal_{}.log", timestamp));
    let dmesg_path = dir.join(format!("dmesg_{}.log", timestamp));
    let archive_path = dir.join(format!("system_logs_{}.zip", timestamp));

    std::fs::write(&journal_path, journal)?;
    std::fs::write(&dmesg_path, dmesg)?;

    let mut zip = ZipWriter::new(File::create(&archive_path)?);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (path, content) in [(&journal_path, journal), (&dmesg_path, dmesg)] {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
    }
    zip.finish()?;

    Ok(CollectedLogs {
        directory: dir.to_path_buf(),
        journal: journal_path,
        dmesg: dmesg_path,
        archive: archive_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn bundle_writes_logs_and_archive() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("system_logs");
        let logs = write_bundle(&target, "20250105_101500", "journal line\n", "dmesg line\n").unwrap();

        assert_eq!(logs.journal, target.join("journal_20250105_101500.log"));
        assert_eq!(std::fs::read_to_string(&logs.dmesg).unwrap(), "dmesg line\n");

        let mut archive = zip::ZipArchive::new(File::open(&logs.archive).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
        let mut journal = String::new();
        archive
            .by_name("journal_20250105_101500.log")
            .unwrap()
            .read_to_string(&mut journal)
            .unwrap();
        assert_eq!(journal, "journal line\n");
    }
}
