pub mod format;

pub use format::{format_csv, parse_export, preamble, ExportMetadata, ExportRow};

use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use chrono::{DateTime, TimeZone};
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::scoring::TargetProfile;

/// Default export file name, e.g. `university-tiers-DS-MLE-2024-03-01T09-30-00.csv`
pub fn export_filename<Tz: TimeZone>(profile: TargetProfile, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "university-tiers-{}-{}.csv",
        profile.slug(),
        at.format("%Y-%m-%dT%H-%M-%S")
    )
}

/// Write an export atomically; a failed write leaves any previous file intact.
pub fn write_export(path: &Path, contents: &str) -> Result<()> {
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open export file at {}", path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("Failed to write export to {}", path.display()))?;
    file.commit()
        .with_context(|| format!("Failed to save export to {}", path.display()))?;

    info!("Wrote export to {}", path.display());
    Ok(())
}
