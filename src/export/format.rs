use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::collections::BTreeSet;

use crate::dataset::loader::{ARCHETYPE, COUNTRY, NOTES, REGION, UNIVERSITY};
use crate::ranking::{Filters, RankedCourse};
use crate::scoring::{Catalog, ClampPolicy, ModifierTable, TargetProfile, Tier, WeightSet};

pub const TITLE: &str = "STEM Course Prioritization Export";

pub const RAW_SCORE: &str = "RawScore";
pub const BASE_SCORE: &str = "BaseScore_0_100";
pub const COUNTRY_MODIFIER: &str = "CountryModifier";
pub const FINAL_SCORE: &str = "FinalScore";
pub const TIER: &str = "Tier";

/// Configuration recorded in the export preamble.
#[derive(Debug, Clone, Copy)]
pub struct ExportMetadata<'a> {
    pub generated: DateTime<Local>,
    pub catalog: &'a Catalog,
    pub profile: TargetProfile,
    pub weights: &'a WeightSet,
    pub modifiers: &'a ModifierTable,
    pub filters: &'a Filters,
    pub clamp: ClampPolicy,
}

/// One data row read back from an export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub country: String,
    pub university: String,
    pub region: String,
    pub archetype: String,
    pub notes: String,
    pub values: Vec<Option<f64>>,
    pub raw_score: f64,
    pub base_score: f64,
    pub country_modifier: f64,
    pub final_score: f64,
    pub tier: Tier,
}

fn header(catalog: &Catalog) -> Vec<&'static str> {
    let mut header = vec![COUNTRY, UNIVERSITY, REGION, ARCHETYPE, NOTES];
    header.extend(catalog.criteria.iter().map(|c| c.column));
    header.extend([RAW_SCORE, BASE_SCORE, COUNTRY_MODIFIER, FINAL_SCORE, TIER]);
    header
}

/// `#`-prefixed lines describing the configuration behind an export.
/// `countries` are the countries whose modifiers are listed.
pub fn preamble(meta: &ExportMetadata, countries: &[String]) -> String {
    let mut lines = vec![
        TITLE.to_string(),
        format!("Generated: {}", meta.generated.format("%Y-%m-%d %H:%M:%S")),
        format!("Target Function: {}", meta.profile),
        format!("Model: {} ({} criteria)", meta.catalog.model, meta.catalog.len()),
        "Active Filters:".to_string(),
        format!("  Countries: {}", meta.filters.describe_countries()),
        format!("  Archetypes: {}", meta.filters.describe_archetypes()),
        "Function Weights:".to_string(),
    ];
    lines.extend(meta.catalog.criteria.iter().map(|criterion| {
        format!(
            "  {} ({}): {:.2}",
            criterion.label,
            criterion.key,
            meta.weights.get(criterion.key)
        )
    }));

    lines.push("Country Modifiers:".to_string());
    lines.extend(
        meta.modifiers
            .effective(countries.iter().map(String::as_str))
            .into_iter()
            .map(|(country, modifier)| {
                if meta.modifiers.is_overridden(&country) {
                    format!("  {}: {:.2} (override)", country, modifier)
                } else {
                    format!("  {}: {:.2}", country, modifier)
                }
            }),
    );
    lines.push(format!("  Other countries: {:.2}", meta.modifiers.fallback()));

    let clamp = match meta.clamp {
        ClampPolicy::None => "none",
        ClampPolicy::Cap100 => "cap at 100",
    };
    lines.push(format!("Final Score Clamp: {}", clamp));

    let mut out: String = lines.iter().map(|line| format!("# {}\n", line)).collect();
    out.push_str("#\n");
    out
}

/// Render ranked rows as a CSV document with a metadata preamble.
///
/// Computed fields carry two decimals. Fields containing a comma, quote or
/// newline are quoted with inner quotes doubled.
pub fn format_csv(rows: &[RankedCourse], meta: &ExportMetadata) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(header(meta.catalog))
        .context("Failed to write export header")?;

    for row in rows {
        let course = row.course;
        let mut record = vec![
            course.country.clone(),
            course.university.clone(),
            course.region.clone(),
            course.archetype.clone(),
            course.notes.clone(),
        ];
        record.extend((0..meta.catalog.len()).map(|i| {
            course
                .values
                .get(i)
                .copied()
                .flatten()
                .map(|v| v.to_string())
                .unwrap_or_default()
        }));
        let r = &row.result;
        record.extend([
            format!("{:.2}", r.raw_score),
            format!("{:.2}", r.base_score),
            format!("{:.2}", r.country_modifier),
            format!("{:.2}", r.final_score),
            r.tier.to_string(),
        ]);
        writer
            .write_record(&record)
            .with_context(|| format!("Failed to write export row for {}", course.university))?;
    }

    let body = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush export: {}", e.error()))?;
    let body = String::from_utf8(body).context("Export is not valid UTF-8")?;

    let countries: Vec<String> = rows
        .iter()
        .map(|row| row.course.country.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    Ok(preamble(meta, &countries) + &body)
}

fn number(record: &csv::StringRecord, column: usize, name: &str, line: usize) -> Result<f64> {
    let raw = record.get(column).unwrap_or("");
    raw.trim()
        .parse::<f64>()
        .with_context(|| format!("Invalid {} '{}' on export row {}", name, raw, line))
}

/// Read an export back, skipping the preamble.
pub fn parse_export(text: &str, catalog: &Catalog) -> Result<Vec<ExportRow>> {
    let body: String = text
        .lines()
        .skip_while(|line| line.starts_with('#'))
        .map(|line| format!("{}\n", line))
        .collect();

    let mut reader = csv::ReaderBuilder::new().from_reader(body.as_bytes());
    let headers = reader.headers().context("Export has no header row")?.clone();

    let position = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("Export is missing the '{}' column", name))
    };

    let identity = [
        position(COUNTRY)?,
        position(UNIVERSITY)?,
        position(REGION)?,
        position(ARCHETYPE)?,
        position(NOTES)?,
    ];
    let criteria = catalog
        .criteria
        .iter()
        .map(|c| position(c.column))
        .collect::<Result<Vec<_>>>()?;
    let computed = [
        position(RAW_SCORE)?,
        position(BASE_SCORE)?,
        position(COUNTRY_MODIFIER)?,
        position(FINAL_SCORE)?,
        position(TIER)?,
    ];

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let line = i + 1;
        let record = record.with_context(|| format!("Malformed export row {}", line))?;
        let text = |column: usize| record.get(column).unwrap_or("").to_string();

        let values = criteria
            .iter()
            .map(|&column| record.get(column).and_then(|v| v.trim().parse::<f64>().ok()))
            .collect();
        let tier_label = text(computed[4]);

        rows.push(ExportRow {
            country: text(identity[0]),
            university: text(identity[1]),
            region: text(identity[2]),
            archetype: text(identity[3]),
            notes: text(identity[4]),
            values,
            raw_score: number(&record, computed[0], RAW_SCORE, line)?,
            base_score: number(&record, computed[1], BASE_SCORE, line)?,
            country_modifier: number(&record, computed[2], COUNTRY_MODIFIER, line)?,
            final_score: number(&record, computed[3], FINAL_SCORE, line)?,
            tier: tier_label
                .parse()
                .with_context(|| format!("Invalid tier '{}' on export row {}", tier_label, line))?,
        });
    }
    Ok(rows)
}
