use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, warn};

use uni_tiers::config::Config;
use uni_tiers::dataset::{Course, CourseKey, DatasetError};
use uni_tiers::ranking::{
    distinct_countries, Filters, RankingSession, SessionSettings, SortDirection, SortField,
    SortState, WeightPreset,
};
use uni_tiers::scoring::{Catalog, ClampPolicy, Model, TargetProfile, WeightSet};
use uni_tiers::store::UserState;

const EXIT_SUCCESS: i32 = 0;
const EXIT_DATA: i32 = 2;
const EXIT_CONFIG: i32 = 4;
const EXIT_IO: i32 = 5;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank courses by final score (default if no subcommand)
    Rank {
        /// Show only the first N rows
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Tab-separated output for scripting
        #[arg(long)]
        tsv: bool,
    },
    /// Show the per-criterion score breakdown of a ranked course
    Explain {
        /// Index number of the course (1-based, as shown by `rank`)
        index: usize,
    },
    /// Write the current ranking to a CSV file
    Export {
        /// Output file (defaults to university-tiers-<profile>-<timestamp>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List tiers, their score ranges and activation playbooks
    Tiers,
    /// List the criteria of the active model
    Criteria {
        /// Include each criterion's question and scale
        #[arg(long)]
        details: bool,
    },
    /// Show the effective country modifier for every country in the dataset
    Modifiers,
    /// Manage saved per-course criterion scores
    Scores {
        #[command(subcommand)]
        action: ScoresAction,
    },
    /// Manage saved filters
    Filters {
        #[command(subcommand)]
        action: FiltersAction,
    },
}

#[derive(Subcommand, Debug)]
enum ScoresAction {
    /// Save criterion values for one course, e.g. `quality=3 geo_fit=2`
    Set {
        university: String,
        course: String,
        #[arg(required = true, value_parser = parse_key_value)]
        values: Vec<(String, f64)>,
    },
    /// List saved scores for the active model
    Show,
    /// Remove saved scores for one course, or all with --all
    Clear {
        #[arg(required_unless_present = "all")]
        university: Option<String>,
        #[arg(required_unless_present = "all")]
        course: Option<String>,
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand, Debug)]
enum FiltersAction {
    /// Save the --country/--archetype selection as the default filters
    Save,
    /// Show the filters in effect
    Show,
    /// Forget saved filters
    Clear,
}

#[derive(Parser, Debug)]
#[command(name = "uni-tiers")]
#[command(about = "University course scoring and tier ranking CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/uni-tiers/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Dataset file (JSON or CSV)
    #[arg(short, long, global = true)]
    dataset: Option<PathBuf>,

    /// Criterion model: full (11 criteria) or simple (4 criteria)
    #[arg(short, long, global = true, value_parser = parse_model)]
    model: Option<Model>,

    /// Target profile: AE, BA or DS/MLE
    #[arg(short, long, global = true, value_parser = parse_profile)]
    profile: Option<TargetProfile>,

    /// Override a criterion weight (repeatable), e.g. --weight quality=1.5
    #[arg(short, long = "weight", global = true, value_parser = parse_key_value)]
    weights: Vec<(String, f64)>,

    /// Start from the catalog base weights instead of the profile presets
    #[arg(long, global = true)]
    base_weights: bool,

    /// Override a country modifier (repeatable), e.g. --modifier Chile=1.1
    #[arg(long = "modifier", global = true, value_parser = parse_key_value)]
    modifiers: Vec<(String, f64)>,

    /// Only include these countries (repeatable)
    #[arg(long = "country", global = true)]
    countries: Vec<String>,

    /// Only include these course archetypes (repeatable)
    #[arg(long = "archetype", global = true)]
    archetypes: Vec<String>,

    /// Cap final scores at 100
    #[arg(long, global = true)]
    clamp: bool,

    /// Ignore saved per-course scores
    #[arg(long, global = true)]
    no_saved_scores: bool,

    /// Sort field: final_score, base_score, raw_score, modifier, tier,
    /// university, country, region, course, or a criterion key
    #[arg(short, long, global = true)]
    sort: Option<String>,

    /// Sort ascending
    #[arg(long, global = true, conflicts_with = "desc")]
    asc: bool,

    /// Sort descending
    #[arg(long, global = true)]
    desc: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn parse_model(s: &str) -> Result<Model, uni_tiers::scoring::ParseError> {
    s.parse()
}

fn parse_profile(s: &str) -> Result<TargetProfile, uni_tiers::scoring::ParseError> {
    s.parse()
}

fn parse_key_value(s: &str) -> Result<(String, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value.trim()))?;
    Ok((key.trim().to_string(), value))
}

fn exit_with(code: i32, message: impl std::fmt::Display) -> ! {
    eprintln!("{}", message);
    std::process::exit(code);
}

/// Merge config and command line into session settings. Command line wins.
fn build_settings(cli: &Cli, config: &Config, state: &UserState) -> Result<SessionSettings, Vec<String>> {
    let scoring = config.scoring.clone().unwrap_or_default();
    let catalog = Catalog::for_model(cli.model.unwrap_or_else(|| scoring.model()));
    let mut errors = Vec::new();

    let mut settings = SessionSettings::new(catalog);
    settings.profile = cli.profile.unwrap_or_else(|| scoring.profile());
    settings.preset = if cli.base_weights || scoring.base_weights {
        if !catalog.has_base_weights() {
            warn!(
                "The {} model has no base weights; using the {} profile weights",
                catalog.model, settings.profile
            );
        }
        WeightPreset::BaseWeights
    } else {
        WeightPreset::ProfileDefaults
    };

    // Config weights were checked against the config's model; --model may
    // have switched catalogs since
    let mut weights = WeightSet::default();
    for (key, weight) in scoring.weight_overrides().iter() {
        match catalog.index_of(key) {
            Some(i) => weights.set(catalog.criteria[i].key, weight),
            None => warn!("Ignoring weight for '{}': not a {} model criterion", key, catalog.model),
        }
    }
    for (key, weight) in &cli.weights {
        match catalog.index_of(key) {
            Some(i) if weight.is_finite() && *weight >= 0.0 => {
                weights.set(catalog.criteria[i].key, *weight);
            }
            Some(_) => errors.push(format!("--weight {}: must be a non-negative number", key)),
            None => errors.push(format!(
                "--weight {}: unknown criterion (expected one of: {})",
                key,
                catalog.keys().collect::<Vec<_>>().join(", ")
            )),
        }
    }
    settings.weight_overrides = weights;

    let mut modifiers = scoring.modifier_table();
    for (country, modifier) in &cli.modifiers {
        if modifier.is_finite() && *modifier > 0.0 {
            modifiers.set_override(country.clone(), *modifier);
        } else {
            errors.push(format!("--modifier {}: must be positive", country));
        }
    }
    settings.modifiers = modifiers;

    settings.clamp = if cli.clamp {
        ClampPolicy::Cap100
    } else {
        scoring.clamp()
    };

    settings.filters = if !cli.countries.is_empty() || !cli.archetypes.is_empty() {
        Filters::new(cli.countries.iter().cloned(), cli.archetypes.iter().cloned())
    } else if let Some(saved) = &state.filters {
        saved.clone()
    } else {
        config.filters.clone().unwrap_or_default()
    };

    let config_sort = config.sort.as_ref();
    let field_name = cli.sort.as_deref().or(config_sort.map(|s| s.field.as_str()));
    if let Some(name) = field_name {
        match SortField::parse(name, catalog) {
            Some(field) => settings.sort = SortState::new(field),
            None => errors.push(format!("sort: unknown field '{}'", name)),
        }
    }
    if cli.asc {
        settings.sort.direction = SortDirection::Asc;
    } else if cli.desc {
        settings.sort.direction = SortDirection::Desc;
    } else if let Some(direction) = config_sort.and_then(|s| s.direction) {
        if cli.sort.is_none() {
            settings.sort.direction = direction;
        }
    }

    if errors.is_empty() {
        Ok(settings)
    } else {
        Err(errors)
    }
}

fn load_courses(cli: &Cli, config: &Config, catalog: &Catalog) -> Vec<Course> {
    let Some(path) = cli.dataset.clone().or_else(|| config.dataset.clone()) else {
        exit_with(
            EXIT_CONFIG,
            "No dataset given. Pass --dataset <FILE> or set `dataset:` in ~/.config/uni-tiers/config.yaml",
        );
    };

    match uni_tiers::dataset::load_dataset(&path, catalog) {
        Ok(courses) => courses,
        Err(e @ DatasetError::Io { .. }) => exit_with(EXIT_IO, format!("Dataset error: {}", e)),
        Err(e) => exit_with(EXIT_DATA, format!("Dataset error: {}", e)),
    }
}

fn save_state(path: &std::path::Path, state: &UserState) {
    if let Err(e) = uni_tiers::store::save_user_state(path, state) {
        exit_with(EXIT_IO, format!("Failed to save state: {:#}", e));
    }
}

fn main() {
    let cli = Cli::parse();
    uni_tiers::logging::init(cli.verbose);

    // Load config
    let config = match uni_tiers::config::load_config(cli.config.clone()) {
        Ok(c) => c,
        Err(e) => exit_with(EXIT_CONFIG, format!("Config error: {:#}", e)),
    };

    // Validate config at startup
    if let Err(errors) = uni_tiers::config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let state_path = uni_tiers::store::get_state_path();
    let mut state = match uni_tiers::store::load_user_state(&state_path) {
        Ok(s) => s,
        Err(e) => exit_with(EXIT_IO, format!("State error: {:#}", e)),
    };

    let settings = match build_settings(&cli, &config, &state) {
        Ok(s) => s,
        Err(errors) => {
            eprintln!("Invalid options:");
            for error in errors {
                eprintln!("  - {}", error);
            }
            std::process::exit(EXIT_CONFIG);
        }
    };
    let catalog = settings.catalog;
    let use_colors = uni_tiers::output::should_use_colors();
    debug!(
        "Model {}, profile {}, {} filter(s)",
        catalog.model,
        settings.profile,
        settings.filters.countries.len() + settings.filters.archetypes.len()
    );

    let default_command = Commands::Rank {
        limit: None,
        tsv: false,
    };
    let command = cli.command.as_ref().unwrap_or(&default_command);

    // Commands that do not need the dataset
    match command {
        Commands::Tiers => {
            println!("{}", uni_tiers::output::format_tiers(use_colors));
            std::process::exit(EXIT_SUCCESS);
        }
        Commands::Criteria { details } => {
            let session = RankingSession::new(Vec::new(), settings);
            println!(
                "{}",
                uni_tiers::output::format_criteria(catalog, session.weights(), *details, use_colors)
            );
            std::process::exit(EXIT_SUCCESS);
        }
        Commands::Scores { action } => {
            match action {
                ScoresAction::Set {
                    university,
                    course,
                    values,
                } => {
                    let key = CourseKey::new(university.as_str(), course.as_str());
                    for (name, value) in values {
                        let Some(i) = catalog.index_of(name) else {
                            exit_with(
                                EXIT_CONFIG,
                                format!("Unknown {} model criterion '{}'", catalog.model, name),
                            );
                        };
                        let criterion = &catalog.criteria[i];
                        if !value.is_finite() || *value < 0.0 || *value > criterion.max {
                            exit_with(
                                EXIT_CONFIG,
                                format!("{} must be between 0 and {}", criterion.key, criterion.max),
                            );
                        }
                        state.set_score(key.clone(), catalog.model, criterion.key, *value);
                    }
                    save_state(&state_path, &state);
                    println!("Saved {} score(s) for {}", values.len(), key);
                }
                ScoresAction::Show => {
                    println!("{}", uni_tiers::output::format_saved_scores(&state, catalog));
                }
                ScoresAction::Clear {
                    university,
                    course,
                    all,
                } => {
                    if *all {
                        state.clear_all();
                        save_state(&state_path, &state);
                        println!("Cleared all saved scores");
                    } else if let (Some(university), Some(course)) = (university, course) {
                        let key = CourseKey::new(university.as_str(), course.as_str());
                        if state.clear(&key) {
                            save_state(&state_path, &state);
                            println!("Cleared saved scores for {}", key);
                        } else {
                            println!("No saved scores for {}", key);
                        }
                    }
                }
            }
            std::process::exit(EXIT_SUCCESS);
        }
        Commands::Filters { action } => {
            match action {
                FiltersAction::Save => {
                    let filters = Filters::new(cli.countries.iter().cloned(), cli.archetypes.iter().cloned());
                    if filters.is_empty() {
                        exit_with(EXIT_CONFIG, "Nothing to save: pass --country and/or --archetype");
                    }
                    state.filters = Some(filters);
                    save_state(&state_path, &state);
                    println!("Saved filters");
                }
                FiltersAction::Show => {
                    println!("Countries: {}", settings.filters.describe_countries());
                    println!("Archetypes: {}", settings.filters.describe_archetypes());
                }
                FiltersAction::Clear => {
                    if state.filters.take().is_some() {
                        save_state(&state_path, &state);
                    }
                    println!("Cleared saved filters");
                }
            }
            std::process::exit(EXIT_SUCCESS);
        }
        _ => {}
    }

    let mut courses = load_courses(&cli, &config, catalog);
    if !cli.no_saved_scores {
        let applied = uni_tiers::store::apply_saved_scores(&mut courses, catalog, &state);
        if applied > 0 {
            debug!("Applied saved scores to {} course(s)", applied);
        }
    }

    for unmatched in settings.filters.unmatched(&courses) {
        warn!("Filter matches no courses: {}", unmatched);
    }

    let session = RankingSession::new(courses, settings);

    // Route based on subcommand
    match command {
        Commands::Rank { limit, tsv } => {
            let rows = session.rows();
            let shown = &rows[..limit.unwrap_or(rows.len()).min(rows.len())];
            if *tsv {
                let output = uni_tiers::output::format_tsv(shown);
                if !output.is_empty() {
                    println!("{}", output);
                }
            } else {
                println!("{}", uni_tiers::output::format_ranked_table(shown, use_colors));
                println!();
                println!(
                    "{}",
                    uni_tiers::output::format_summary(&session.summary(), session.courses().len())
                );
            }
        }
        Commands::Explain { index } => {
            // Validate index bounds (1-based)
            if *index < 1 || *index > session.len() {
                exit_with(
                    EXIT_DATA,
                    format!("Invalid index {}. Must be between 1 and {}.", index, session.len()),
                );
            }
            if let Some(row) = session.row(index - 1) {
                println!("{}", uni_tiers::output::format_breakdown(&row, catalog, use_colors));
            }
        }
        Commands::Export { output } => {
            let rows = session.rows();
            if rows.is_empty() {
                eprintln!("No courses to export");
                std::process::exit(EXIT_SUCCESS);
            }
            let now = chrono::Local::now();
            let path = output.clone().unwrap_or_else(|| {
                PathBuf::from(uni_tiers::export::export_filename(session.profile(), &now))
            });
            let meta = uni_tiers::export::ExportMetadata {
                generated: now,
                catalog,
                profile: session.profile(),
                weights: session.weights(),
                modifiers: session.modifiers(),
                filters: session.filters(),
                clamp: session.clamp(),
            };
            let contents = match uni_tiers::export::format_csv(&rows, &meta) {
                Ok(c) => c,
                Err(e) => exit_with(EXIT_IO, format!("Export error: {:#}", e)),
            };
            if let Err(e) = uni_tiers::export::write_export(&path, &contents) {
                exit_with(EXIT_IO, format!("Export error: {:#}", e));
            }
            println!("Exported {} courses to {}", rows.len(), path.display());
        }
        Commands::Modifiers => {
            let mut countries: BTreeSet<String> =
                distinct_countries(session.courses()).into_iter().collect();
            countries.extend(session.modifiers().overrides().keys().cloned());
            let countries: Vec<String> = countries.into_iter().collect();
            println!(
                "{}",
                uni_tiers::output::format_modifiers(session.modifiers(), &countries, use_colors)
            );
        }
        Commands::Tiers | Commands::Criteria { .. } | Commands::Scores { .. } | Commands::Filters { .. } => {}
    }

    std::process::exit(EXIT_SUCCESS);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(parse_key_value("quality=1.5"), Ok(("quality".to_string(), 1.5)));
        assert_eq!(
            parse_key_value("United States = 0.9"),
            Ok(("United States".to_string(), 0.9))
        );
        assert!(parse_key_value("quality").is_err());
        assert!(parse_key_value("quality=high").is_err());
    }

    #[test]
    fn test_default_settings() {
        let cli = Cli::parse_from(["uni-tiers"]);
        let settings = build_settings(&cli, &Config::default(), &UserState::new()).unwrap();
        assert_eq!(settings.catalog.model, Model::Full);
        assert_eq!(settings.profile, TargetProfile::DsMle);
        assert_eq!(settings.clamp, ClampPolicy::None);
        assert_eq!(settings.sort, SortState::default());
    }

    #[test]
    fn test_cli_overrides_config() {
        let config: Config = serde_saphyr::from_str(
            "scoring:\n  model: simple\n  profile: AE\n  weights:\n    quality: 2.0\nsort:\n  field: university\n",
        )
        .unwrap();
        let cli = Cli::parse_from([
            "uni-tiers", "--profile", "BA", "--weight", "quality=0.5", "--modifier", "Chile=1.3",
            "--clamp", "--sort", "final", "rank",
        ]);
        let settings = build_settings(&cli, &config, &UserState::new()).unwrap();
        assert_eq!(settings.catalog.model, Model::Simple);
        assert_eq!(settings.profile, TargetProfile::Ba);
        assert_eq!(settings.weight_overrides.get("quality"), 0.5);
        assert_eq!(settings.modifiers.resolve("Chile"), 1.3);
        assert_eq!(settings.clamp, ClampPolicy::Cap100);
        assert_eq!(settings.sort.field, SortField::FinalScore);
    }

    #[test]
    fn test_config_weights_follow_active_model() {
        let config: Config =
            serde_saphyr::from_str("scoring:\n  model: simple\n  weights:\n    geo_fit: 1.5\n").unwrap();
        let cli = Cli::parse_from(["uni-tiers"]);
        let settings = build_settings(&cli, &config, &UserState::new()).unwrap();
        assert_eq!(settings.weight_overrides.get("geo_fit"), 1.5);

        // geo_fit has no counterpart in the full model and is dropped
        let cli = Cli::parse_from(["uni-tiers", "--model", "full"]);
        let settings = build_settings(&cli, &config, &UserState::new()).unwrap();
        assert!(settings.weight_overrides.is_empty());
    }

    #[test]
    fn test_unknown_weight_key_is_rejected() {
        let cli = Cli::parse_from(["uni-tiers", "--weight", "popularity=2"]);
        let errors = build_settings(&cli, &Config::default(), &UserState::new()).unwrap_err();
        assert!(errors[0].contains("unknown criterion"));
    }

    #[test]
    fn test_filter_precedence() {
        let config: Config =
            serde_saphyr::from_str("filters:\n  countries: [Mexico]\n").unwrap();
        let mut state = UserState::new();

        let cli = Cli::parse_from(["uni-tiers"]);
        let settings = build_settings(&cli, &config, &state).unwrap();
        assert!(settings.filters.countries.contains("Mexico"));

        state.filters = Some(Filters::new(vec!["Peru".to_string()], vec![]));
        let settings = build_settings(&cli, &config, &state).unwrap();
        assert!(settings.filters.countries.contains("Peru"));

        let cli = Cli::parse_from(["uni-tiers", "--country", "Brazil"]);
        let settings = build_settings(&cli, &config, &state).unwrap();
        assert_eq!(settings.filters.describe_countries(), "Brazil");
    }

    #[test]
    fn test_sort_direction_flags() {
        let cli = Cli::parse_from(["uni-tiers", "--sort", "university", "--desc"]);
        let settings = build_settings(&cli, &Config::default(), &UserState::new()).unwrap();
        assert_eq!(settings.sort.field, SortField::University);
        assert_eq!(settings.sort.direction, SortDirection::Desc);
    }
}
