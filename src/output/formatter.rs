use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::ranking::{RankedCourse, RankingSummary};
use crate::scoring::{Catalog, ModifierTable, TargetProfile, Tier, WeightSet};
use crate::store::UserState;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate_text(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Scores always show two decimals
pub fn format_score(score: f64) -> String {
    format!("{:.2}", score)
}

fn tier_cell(tier: Tier, width: usize, use_colors: bool) -> String {
    let padded = format!("{:<width$}", tier.to_string(), width = width);
    if use_colors {
        padded.color(tier.color()).bold().to_string()
    } else {
        padded
    }
}

const TIER_WIDTH: usize = 22;
const SCORE_WIDTH: usize = 7;
const MODIFIER_WIDTH: usize = 5;

/// Ranked courses as a table:
/// index, final score, tier, base score, modifier, university, course, country.
/// Index is 1-based and matches `explain <INDEX>`.
pub fn format_ranked_table(rows: &[RankedCourse], use_colors: bool) -> String {
    render_table(rows, use_colors, get_terminal_width())
}

fn render_table(rows: &[RankedCourse], use_colors: bool, term_width: Option<usize>) -> String {
    if rows.is_empty() {
        return "No courses match the current filters.".to_string();
    }

    let separator = "  ";
    // Room for the widest index, never narrower than " 1."
    let index_width = rows.len().to_string().len().max(2);
    // index with its dot and space, then final, tier, base and modifier,
    // each followed by a separator
    let fixed_width = index_width + 2
        + SCORE_WIDTH
        + TIER_WIDTH
        + SCORE_WIDTH
        + MODIFIER_WIDTH
        + separator.len() * 4;
    let fit = |text: &str| match term_width {
        Some(width) if width > fixed_width + 10 => truncate_text(text, width - fixed_width),
        Some(_) => truncate_text(text, 20),
        None => text.to_string(),
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    let header = format!(
        "{:>iw$} {:>sw$}{sep}{:<tw$}{sep}{:>sw$}{sep}{:>mw$}{sep}{}",
        "#",
        "Final",
        "Tier",
        "Base",
        "Mod",
        fit("University / Course (Country)"),
        sep = separator,
        iw = index_width + 1,
        sw = SCORE_WIDTH,
        tw = TIER_WIDTH,
        mw = MODIFIER_WIDTH,
    );
    lines.push(if use_colors {
        header.dimmed().to_string()
    } else {
        header
    });

    for (position, row) in rows.iter().enumerate() {
        let index_str = format!("{:>width$}.", position + 1, width = index_width);
        let final_str = format!("{:>width$}", format_score(row.result.final_score), width = SCORE_WIDTH);
        let base_str = format!("{:>width$}", format_score(row.result.base_score), width = SCORE_WIDTH);
        let modifier_str = format!(
            "{:>width$}",
            format!("x{:.2}", row.result.country_modifier),
            width = MODIFIER_WIDTH
        );
        let identity = fit(&format!(
            "{} / {} ({})",
            row.course.university, row.course.archetype, row.course.country
        ));

        let line = if use_colors {
            format!(
                "{} {}{sep}{}{sep}{}{sep}{}{sep}{}",
                index_str.dimmed(),
                final_str.bold(),
                tier_cell(row.result.tier, TIER_WIDTH, true),
                base_str,
                modifier_str.cyan(),
                identity,
                sep = separator,
            )
        } else {
            format!(
                "{} {}{sep}{}{sep}{}{sep}{}{sep}{}",
                index_str,
                final_str,
                tier_cell(row.result.tier, TIER_WIDTH, false),
                base_str,
                modifier_str,
                identity,
                sep = separator,
            )
        };
        lines.push(line);
    }

    lines.join("\n")
}

/// Tab-separated values for scripting, no headers or colors.
/// Columns: final, tier number, base, modifier, university, course, country
pub fn format_tsv(rows: &[RankedCourse]) -> String {
    rows.iter()
        .map(|row| {
            format!(
                "{:.2}\t{}\t{:.2}\t{:.2}\t{}\t{}\t{}",
                row.result.final_score,
                row.result.tier.number(),
                row.result.base_score,
                row.result.country_modifier,
                row.course.university,
                row.course.archetype,
                row.course.country
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-line summary shown under the ranking
pub fn format_summary(summary: &RankingSummary, total: usize) -> String {
    if summary.count == 0 {
        return format!("0 of {} courses", total);
    }
    let tiers = Tier::ALL
        .iter()
        .map(|t| format!("T{}: {}", t.number(), summary.count_for(*t)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{} of {} courses | avg {:.2} | min {:.2} | max {:.2} | {}",
        summary.count, total, summary.average, summary.min, summary.max, tiers
    )
}

/// Per-criterion breakdown of one ranked course
pub fn format_breakdown(row: &RankedCourse, catalog: &Catalog, use_colors: bool) -> String {
    let course = row.course;
    let result = &row.result;

    let title = format!("{} / {}", course.university, course.archetype);
    let mut lines = vec![
        if use_colors { title.bold().to_string() } else { title },
        format!("  Country: {}", course.country),
    ];
    if !course.region.is_empty() {
        lines.push(format!("  City/Region: {}", course.region));
    }
    if !course.notes.is_empty() {
        lines.push(format!("  Notes: {}", course.notes));
    }
    lines.push(String::new());
    lines.push(format!(
        "  {:<36} {:>9} {:>7} {:>5} {:>15} {:>6}",
        "Criterion", "Value", "Weight", "Mult", "Points", "Share"
    ));

    for (i, (criterion, c)) in catalog
        .criteria
        .iter()
        .zip(&result.breakdown.contributions)
        .enumerate()
    {
        let value = match course.values.get(i).copied().flatten() {
            Some(_) => format!("{}/{}", c.value, criterion.max),
            None => format!("-/{}", criterion.max),
        };
        lines.push(format!(
            "  {:<36} {:>9} {:>7.2} {:>5.2} {:>15} {:>5.0}%",
            truncate_text(c.label, 36),
            value,
            c.weight,
            c.multiplier,
            format!("{:.2}/{:.2}", c.contribution, c.max_contribution),
            c.percentage()
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "  Raw score:        {:.2} of {:.2}",
        result.raw_score, result.breakdown.max_raw
    ));
    lines.push(format!("  Base score:       {:.2}", result.base_score));
    lines.push(format!("  Country modifier: x{:.2}", result.country_modifier));
    lines.push(format!("  Final score:      {:.2}", result.final_score));
    lines.push(format!("  Tier:             {}", tier_cell(result.tier, 0, use_colors)));
    lines.join("\n")
}

/// Tiers with score ranges and activation playbooks
pub fn format_tiers(use_colors: bool) -> String {
    Tier::ALL
        .iter()
        .enumerate()
        .map(|(i, tier)| {
            let range = match i.checked_sub(1).map(|prev| Tier::ALL[prev].threshold()) {
                Some(upper) => format!("{:.0} to <{:.0}", tier.threshold(), upper),
                None => format!(">= {:.0}", tier.threshold()),
            };
            let mut lines = vec![format!("{}  ({})", tier_cell(*tier, 0, use_colors), range)];
            lines.extend(tier.playbook().iter().map(|action| format!("  - {}", action)));
            lines.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Catalog criteria with ranges, weights, profile multipliers and help text
pub fn format_criteria(
    catalog: &Catalog,
    weights: &WeightSet,
    verbose: bool,
    use_colors: bool,
) -> String {
    let mut lines = vec![format!("{} model, {} criteria", catalog.model, catalog.len())];

    for (i, criterion) in catalog.criteria.iter().enumerate() {
        let heading = format!("{:>2}. {} ({})", i + 1, criterion.label, criterion.key);
        lines.push(String::new());
        lines.push(if use_colors { heading.bold().to_string() } else { heading });
        lines.push(format!("    Column: {}", criterion.column));
        lines.push(format!("    Range: 0-{}", criterion.max));
        if let Some(base) = criterion.base_weight {
            lines.push(format!("    Base weight: {}", base));
        }
        lines.push(format!("    Weight: {:.2}", weights.get(criterion.key)));
        let multipliers = TargetProfile::ALL
            .iter()
            .map(|p| format!("{} {:.1}", p, catalog.multipliers(*p).get(i).copied().unwrap_or(0.0)))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("    Multipliers: {}", multipliers));
        if verbose {
            lines.push(format!("    {}", criterion.question));
            lines.extend(criterion.scale.iter().map(|line| format!("      {}", line)));
        }
    }
    lines.join("\n")
}

/// Effective modifier per country, marking overrides
pub fn format_modifiers(table: &ModifierTable, countries: &[String], use_colors: bool) -> String {
    let width = countries.iter().map(|c| c.chars().count()).max().unwrap_or(0).max(7);

    let mut lines: Vec<String> = table
        .effective(countries.iter().map(String::as_str))
        .into_iter()
        .map(|(country, modifier)| {
            if table.is_overridden(&country) {
                let note = format!("(default x{:.2})", table.default_for(&country));
                format!(
                    "{:<width$}  x{:.2}  {}",
                    country,
                    modifier,
                    if use_colors { note.yellow().to_string() } else { note },
                    width = width
                )
            } else {
                format!("{:<width$}  x{:.2}", country, modifier, width = width)
            }
        })
        .collect();
    lines.push(format!(
        "{:<width$}  x{:.2}",
        "(other)",
        table.fallback(),
        width = width
    ));
    lines.join("\n")
}

/// Saved per-course scores for one model
pub fn format_saved_scores(state: &UserState, catalog: &Catalog) -> String {
    let entries: Vec<_> = state
        .scores
        .iter()
        .filter(|(_, s)| s.model == catalog.model)
        .collect();
    if entries.is_empty() {
        return format!("No saved scores for the {} model.", catalog.model);
    }

    let mut lines = Vec::new();
    for (key, scores) in entries {
        lines.push(format!("{} (updated {})", key, scores.updated_at.format("%Y-%m-%d %H:%M")));
        lines.extend(catalog.criteria.iter().filter_map(|criterion| {
            scores
                .values
                .get(criterion.key)
                .map(|value| format!("  {}: {}", criterion.key, value))
        }));
    }
    lines.join("\n")
}
