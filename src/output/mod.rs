pub mod formatter;

pub use formatter::{
    format_breakdown, format_criteria, format_modifiers, format_ranked_table, format_saved_scores,
    format_score, format_summary, format_tiers, format_tsv, should_use_colors,
};
