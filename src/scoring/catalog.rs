use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ParseError;

/// Which criterion set a dataset is scored against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Model {
    /// 11 criteria, each scored 0-10
    #[default]
    Full,
    /// Quality, Scale, Employability (0-3) and GeoFit (0-2)
    Simple,
}

impl FromStr for Model {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" | "11" => Ok(Model::Full),
            "simple" | "4" => Ok(Model::Simple),
            _ => Err(ParseError::UnknownModel(s.to_string())),
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Model::Full => write!(f, "full"),
            Model::Simple => write!(f, "simple"),
        }
    }
}

/// Hiring function a ranking is tuned for.
///
/// The set is closed: an unknown profile string is rejected when parsed, so
/// the score engine never sees one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum TargetProfile {
    #[serde(rename = "AE")]
    Ae,
    #[serde(rename = "BA")]
    Ba,
    #[default]
    #[serde(rename = "DS/MLE")]
    DsMle,
}

impl TargetProfile {
    pub const ALL: [TargetProfile; 3] = [TargetProfile::Ae, TargetProfile::Ba, TargetProfile::DsMle];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetProfile::Ae => "AE",
            TargetProfile::Ba => "BA",
            TargetProfile::DsMle => "DS/MLE",
        }
    }

    /// Profile name safe to embed in a file name ("DS/MLE" -> "DS-MLE")
    pub fn slug(&self) -> &'static str {
        match self {
            TargetProfile::Ae => "AE",
            TargetProfile::Ba => "BA",
            TargetProfile::DsMle => "DS-MLE",
        }
    }
}

impl FromStr for TargetProfile {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AE" => Ok(TargetProfile::Ae),
            "BA" => Ok(TargetProfile::Ba),
            "DS/MLE" | "DS-MLE" | "DSMLE" => Ok(TargetProfile::DsMle),
            _ => Err(ParseError::UnknownProfile(s.to_string())),
        }
    }
}

impl fmt::Display for TargetProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scoring criterion.
#[derive(Debug)]
pub struct Criterion {
    /// Stable key used in weight sets and config files
    pub key: &'static str,
    /// Column name in the input dataset and in exports
    pub column: &'static str,
    pub label: &'static str,
    /// Highest raw value the criterion can take
    pub max: f64,
    /// Flat base weight, only defined for the full model
    pub base_weight: Option<f64>,
    pub question: &'static str,
    pub scale: &'static [&'static str],
}

/// Static description of a criterion model.
#[derive(Debug)]
pub struct Catalog {
    pub model: Model,
    pub criteria: &'static [Criterion],
    ae: &'static [f64],
    ba: &'static [f64],
    ds_mle: &'static [f64],
    /// Default weights per profile as (AE, BA, DS/MLE), if the model has them
    profile_weights: Option<[&'static [f64]; 3]>,
}

impl Catalog {
    pub fn for_model(model: Model) -> &'static Catalog {
        match model {
            Model::Full => &FULL,
            Model::Simple => &SIMPLE,
        }
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Profile multipliers aligned index-for-index with `criteria`
    pub fn multipliers(&self, profile: TargetProfile) -> &'static [f64] {
        let m = match profile {
            TargetProfile::Ae => self.ae,
            TargetProfile::Ba => self.ba,
            TargetProfile::DsMle => self.ds_mle,
        };
        debug_assert_eq!(m.len(), self.criteria.len());
        m
    }

    /// Default weight vector for a profile. `None` means uniform weights.
    pub fn profile_weights(&self, profile: TargetProfile) -> Option<&'static [f64]> {
        self.profile_weights.map(|w| match profile {
            TargetProfile::Ae => w[0],
            TargetProfile::Ba => w[1],
            TargetProfile::DsMle => w[2],
        })
    }

    /// Whether the model defines flat base weights
    pub fn has_base_weights(&self) -> bool {
        self.criteria.iter().any(|c| c.base_weight.is_some())
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.criteria
            .iter()
            .position(|c| c.key.eq_ignore_ascii_case(key) || c.column == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.criteria.iter().map(|c| c.key)
    }
}

static FULL_CRITERIA: [Criterion; 11] = [
    Criterion {
        key: "curriculum_depth",
        column: "Curriculum Depth (DS/ML/Stats/SQL) (0-10)",
        label: "Curriculum Depth (DS/ML/Stats/SQL)",
        max: 10.0,
        base_weight: Some(10.0),
        question: "How much data science, ML, statistics and SQL does the curriculum cover?",
        scale: &["10 = dedicated tracks and deep coursework", "5 = a few core courses", "0 = no coverage"],
    },
    Criterion {
        key: "engineering_foundations",
        column: "Engineering Foundations (0-10)",
        label: "Engineering Foundations",
        max: 10.0,
        base_weight: Some(8.0),
        question: "How strong is the software engineering and CS foundation?",
        scale: &["10 = rigorous algorithms, systems and programming", "5 = introductory programming", "0 = none"],
    },
    Criterion {
        key: "data_engineering_exposure",
        column: "Data Engineering Exposure (0-10)",
        label: "Data Engineering Exposure",
        max: 10.0,
        base_weight: Some(7.0),
        question: "Do students work with pipelines, databases and distributed data tools?",
        scale: &["10 = hands-on pipelines and warehousing", "5 = databases only", "0 = none"],
    },
    Criterion {
        key: "analytics_business_orientation",
        column: "Analytics/Business Orientation (0-10)",
        label: "Analytics/Business Orientation",
        max: 10.0,
        base_weight: Some(8.0),
        question: "How much does the program connect data work to business decisions?",
        scale: &["10 = applied analytics with business cases", "5 = some applied projects", "0 = purely theoretical"],
    },
    Criterion {
        key: "cohort_size_continuity",
        column: "Cohort Size & Continuity (0-10)",
        label: "Cohort Size & Continuity",
        max: 10.0,
        base_weight: Some(9.0),
        question: "How many graduates per year, and how stable is the intake?",
        scale: &["10 = large, stable annual cohorts", "5 = mid-size cohorts", "0 = unknown or irregular"],
    },
    Criterion {
        key: "capstone_projects_intensity",
        column: "Capstone/Projects Intensity (0-10)",
        label: "Capstone/Projects Intensity",
        max: 10.0,
        base_weight: Some(7.0),
        question: "How project-based is the program, including capstones with industry?",
        scale: &["10 = mandatory industry capstones", "5 = occasional projects", "0 = none"],
    },
    Criterion {
        key: "tools_stack_familiarity",
        column: "Tools & Stack Familiarity (0-10)",
        label: "Tools & Stack Familiarity",
        max: 10.0,
        base_weight: Some(6.0),
        question: "Do students use the tools the team works with day to day?",
        scale: &["10 = Python, SQL, cloud and version control throughout", "5 = partial", "0 = none"],
    },
    Criterion {
        key: "clubs_competitions",
        column: "Clubs & Competitions (0-10)",
        label: "Clubs & Competitions",
        max: 10.0,
        base_weight: Some(6.0),
        question: "Are there active data/tech clubs, hackathons or competition teams?",
        scale: &["10 = active clubs with competition results", "5 = some activity", "0 = none"],
    },
    Criterion {
        key: "internship_alignment",
        column: "Internship Alignment (0-10)",
        label: "Internship Alignment",
        max: 10.0,
        base_weight: Some(7.0),
        question: "Does the calendar and culture support internships in data/tech roles?",
        scale: &["10 = structured internship programs", "5 = internships possible", "0 = not supported"],
    },
    Criterion {
        key: "di_pipeline_contribution",
        column: "D&I Pipeline Contribution (0-10)",
        label: "D&I Pipeline Contribution",
        max: 10.0,
        base_weight: Some(7.0),
        question: "How much does the program contribute to a diverse talent pipeline?",
        scale: &["10 = strong diversity programs and outcomes", "5 = average", "0 = no signal"],
    },
    Criterion {
        key: "regional_coverage_fit",
        column: "Regional Coverage Fit (0-10)",
        label: "Regional Coverage Fit",
        max: 10.0,
        base_weight: Some(5.0),
        question: "Does the campus location fill a gap in regional coverage?",
        scale: &["10 = key hub or uncovered strategic region", "5 = secondary region", "0 = low fit"],
    },
];

static SIMPLE_CRITERIA: [Criterion; 4] = [
    Criterion {
        key: "quality",
        column: "Quality_0_3",
        label: "Course Quality Index",
        max: 3.0,
        base_weight: None,
        question: "How strong is this course within its country?",
        scale: &[
            "3 = top programs (very selective, strong reputation)",
            "2 = solid / well-known program",
            "1 = decent but not a strong reference",
            "0 = unknown / weak",
        ],
    },
    Criterion {
        key: "scale",
        column: "Scale_0_3",
        label: "Scale / Cohort Size",
        max: 3.0,
        base_weight: None,
        question: "How many students does this course produce per year?",
        scale: &[
            "3 = large cohorts (strong, stable annual volume)",
            "2 = mid-size cohorts",
            "1 = small / niche program",
            "0 = unknown",
        ],
    },
    Criterion {
        key: "employability",
        column: "Employability_0_3",
        label: "Employability in Data/Tech",
        max: 3.0,
        base_weight: None,
        question: "How often do graduates show up in data/tech/fintech roles?",
        scale: &[
            "3 = strong pipeline (CS, Data Science, Stats, etc.)",
            "2 = decent pipeline (Economics, Applied Math, etc.)",
            "1 = low direct pipeline",
            "0 = unknown / no signal",
        ],
    },
    Criterion {
        key: "geo_fit",
        column: "GeoFit_0_2",
        label: "Geographic / Strategic Fit",
        max: 2.0,
        base_weight: None,
        question: "Is this campus/city strategically important?",
        scale: &[
            "2 = key hub (major tech/financial/talent hub)",
            "1 = secondary but still relevant",
            "0 = low strategic fit",
        ],
    },
];

static FULL: Catalog = Catalog {
    model: Model::Full,
    criteria: &FULL_CRITERIA,
    ae: &[0.6, 0.9, 1.0, 0.5, 0.8, 0.7, 0.9, 0.6, 0.6, 0.6, 0.6],
    ba: &[1.0, 0.6, 0.6, 1.0, 0.9, 0.9, 0.7, 0.8, 0.9, 0.8, 0.7],
    ds_mle: &[1.0, 0.9, 0.8, 0.7, 0.8, 0.8, 1.0, 0.7, 0.8, 0.7, 0.6],
    profile_weights: None,
};

// The simple model expresses profile emphasis through its weight presets,
// so every profile multiplier is 1.0.
static SIMPLE: Catalog = Catalog {
    model: Model::Simple,
    criteria: &SIMPLE_CRITERIA,
    ae: &[1.0; 4],
    ba: &[1.0; 4],
    ds_mle: &[1.0; 4],
    profile_weights: Some([
        &[0.8, 1.2, 1.0, 0.8],
        &[1.0, 0.8, 1.2, 1.0],
        &[1.2, 0.8, 1.2, 0.8],
    ]),
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplier_vectors_align_with_criteria() {
        for model in [Model::Full, Model::Simple] {
            let catalog = Catalog::for_model(model);
            for profile in TargetProfile::ALL {
                let m = catalog.multipliers(profile);
                assert_eq!(m.len(), catalog.len(), "{} {}", model, profile);
                assert!(m.iter().all(|v| (0.0..=1.0).contains(v)));
            }
        }
    }

    #[test]
    fn test_full_model_shape() {
        let catalog = Catalog::for_model(Model::Full);
        assert_eq!(catalog.len(), 11);
        assert!(catalog.criteria.iter().all(|c| c.max == 10.0));
        assert!(catalog.criteria.iter().all(|c| c.base_weight.is_some()));
        assert!(catalog.profile_weights(TargetProfile::Ae).is_none());
        assert!(catalog.has_base_weights());
    }

    #[test]
    fn test_simple_model_ranges() {
        let catalog = Catalog::for_model(Model::Simple);
        let maxes: Vec<f64> = catalog.criteria.iter().map(|c| c.max).collect();
        assert_eq!(maxes, vec![3.0, 3.0, 3.0, 2.0]);
        assert_eq!(
            catalog.profile_weights(TargetProfile::DsMle),
            Some(&[1.2, 0.8, 1.2, 0.8][..])
        );
        assert!(!catalog.has_base_weights());
    }

    #[test]
    fn test_index_of_accepts_key_or_column() {
        let catalog = Catalog::for_model(Model::Simple);
        assert_eq!(catalog.index_of("geo_fit"), Some(3));
        assert_eq!(catalog.index_of("GeoFit_0_2"), Some(3));
        assert_eq!(catalog.index_of("QUALITY"), Some(0));
        assert_eq!(catalog.index_of("nope"), None);
    }

    #[test]
    fn test_parse_profile() {
        assert_eq!("DS/MLE".parse::<TargetProfile>().unwrap(), TargetProfile::DsMle);
        assert_eq!("ds-mle".parse::<TargetProfile>().unwrap(), TargetProfile::DsMle);
        assert_eq!("ae".parse::<TargetProfile>().unwrap(), TargetProfile::Ae);
        assert!("PM".parse::<TargetProfile>().is_err());
    }

    #[test]
    fn test_parse_model() {
        assert_eq!("simple".parse::<Model>().unwrap(), Model::Simple);
        assert_eq!("Full".parse::<Model>().unwrap(), Model::Full);
        assert!("huge".parse::<Model>().is_err());
    }

    #[test]
    fn test_profile_serde_uses_display_names() {
        let json = serde_json::to_string(&TargetProfile::DsMle).unwrap();
        assert_eq!(json, "\"DS/MLE\"");
        let parsed: TargetProfile = serde_json::from_str("\"BA\"").unwrap();
        assert_eq!(parsed, TargetProfile::Ba);
    }
}
