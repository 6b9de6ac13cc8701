use owo_colors::AnsiColors;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ParseError;

/// Priority tier, ordered from most to least strategic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum Tier {
    Strategic,
    Core,
    Opportunistic,
    Explore,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Strategic, Tier::Core, Tier::Opportunistic, Tier::Explore];

    /// Classify a final score. Lower bounds are inclusive, so a score sitting
    /// exactly on a threshold lands in the higher tier.
    pub fn classify(final_score: f64) -> Tier {
        if final_score >= 85.0 {
            Tier::Strategic
        } else if final_score >= 70.0 {
            Tier::Core
        } else if final_score >= 55.0 {
            Tier::Opportunistic
        } else {
            Tier::Explore
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            Tier::Strategic => 0,
            Tier::Core => 1,
            Tier::Opportunistic => 2,
            Tier::Explore => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tier::Strategic => "Strategic",
            Tier::Core => "Core",
            Tier::Opportunistic => "Opportunistic",
            Tier::Explore => "Explore",
        }
    }

    /// Inclusive lower bound of the tier's score range
    pub fn threshold(&self) -> f64 {
        match self {
            Tier::Strategic => 85.0,
            Tier::Core => 70.0,
            Tier::Opportunistic => 55.0,
            Tier::Explore => 0.0,
        }
    }

    pub fn color(&self) -> AnsiColors {
        match self {
            Tier::Strategic => AnsiColors::Magenta,
            Tier::Core => AnsiColors::Blue,
            Tier::Opportunistic => AnsiColors::Yellow,
            Tier::Explore => AnsiColors::White,
        }
    }

    /// Recommended activation actions for universities in this tier
    pub fn playbook(&self) -> &'static [&'static str] {
        match self {
            Tier::Strategic => &[
                "MOU with university leadership",
                "2-3 major events per semester",
                "Capstone partnerships & projects",
                "Campus Champion program",
                "Always-on ads during peak recruiting",
            ],
            Tier::Core => &[
                "1-2 events per semester",
                "Strategic ad windows",
                "Interview blitz campaigns",
                "Regular presence at career fairs",
            ],
            Tier::Opportunistic => &[
                "1 event per semester or virtual",
                "Small ad bursts",
                "Tight ROI monitoring",
                "Leverage student ambassadors",
            ],
            Tier::Explore => &[
                "Virtual or joint career fairs",
                "Content syndication",
                "Low-touch engagement",
                "Monitor for future potential",
            ],
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tier {} - {}", self.number(), self.name())
    }
}

impl FromStr for Tier {
    type Err = ParseError;

    /// Accepts "Tier 2 - Opportunistic", "Tier 2", "2" or "Opportunistic"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let head = trimmed
            .strip_prefix("Tier")
            .map(|rest| rest.trim_start())
            .unwrap_or(trimmed);
        if let Some(digit) = head.chars().next().and_then(|c| c.to_digit(10)) {
            return Tier::ALL
                .into_iter()
                .find(|t| u32::from(t.number()) == digit)
                .ok_or_else(|| ParseError::UnknownTier(s.to_string()));
        }
        Tier::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(head))
            .ok_or_else(|| ParseError::UnknownTier(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_belong_to_higher_tier() {
        assert_eq!(Tier::classify(85.0), Tier::Strategic);
        assert_eq!(Tier::classify(84.99), Tier::Core);
        assert_eq!(Tier::classify(70.0), Tier::Core);
        assert_eq!(Tier::classify(69.99), Tier::Opportunistic);
        assert_eq!(Tier::classify(55.0), Tier::Opportunistic);
        assert_eq!(Tier::classify(54.99), Tier::Explore);
        assert_eq!(Tier::classify(0.0), Tier::Explore);
    }

    #[test]
    fn test_scores_above_hundred_stay_strategic() {
        assert_eq!(Tier::classify(120.0), Tier::Strategic);
    }

    #[test]
    fn test_tiers_are_ordered() {
        assert!(Tier::Strategic < Tier::Core);
        assert!(Tier::Opportunistic < Tier::Explore);
    }

    #[test]
    fn test_display_and_parse() {
        assert_eq!(Tier::Core.to_string(), "Tier 1 - Core");
        for tier in Tier::ALL {
            assert_eq!(tier.to_string().parse::<Tier>().unwrap(), tier);
        }
        assert_eq!("2".parse::<Tier>().unwrap(), Tier::Opportunistic);
        assert_eq!("explore".parse::<Tier>().unwrap(), Tier::Explore);
        assert!("Tier 7".parse::<Tier>().is_err());
        assert!("Gold".parse::<Tier>().is_err());
    }

    #[test]
    fn test_every_tier_has_playbook() {
        for tier in Tier::ALL {
            assert!(!tier.playbook().is_empty());
        }
    }
}
