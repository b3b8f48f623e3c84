//! Character presets: starting seed weights and capability strengths.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::catalog::{FactorCatalog, FactorCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Neutral,
    /// Deep wholesome roots
    Virtuous,
    /// Heavy root afflictions
    Afflicted,
    Practitioner,
    /// Ordinary person
    Worldling,
    Sage,
    Greedy,
    Wrathful,
}

impl Archetype {
    pub const ALL: [Archetype; 8] = [
        Archetype::Neutral,
        Archetype::Virtuous,
        Archetype::Afflicted,
        Archetype::Practitioner,
        Archetype::Worldling,
        Archetype::Sage,
        Archetype::Greedy,
        Archetype::Wrathful,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Virtuous => "virtuous",
            Self::Afflicted => "afflicted",
            Self::Practitioner => "practitioner",
            Self::Worldling => "worldling",
            Self::Sage => "sage",
            Self::Greedy => "greedy",
            Self::Wrathful => "wrathful",
        }
    }

    /// Initial seed weights. Traits not listed start at the default weight.
    pub fn seeds(&self, catalog: &FactorCatalog) -> HashMap<String, f64> {
        let by_category = |f: &dyn Fn(FactorCategory) -> Option<f64>| -> HashMap<String, f64> {
            catalog
                .iter()
                .filter_map(|d| f(d.category).map(|w| (d.id.clone(), w)))
                .collect()
        };

        match self {
            Self::Neutral => HashMap::new(),
            Self::Virtuous => by_category(&|c| match c {
                FactorCategory::Wholesome => Some(0.7),
                c if c.is_affliction() => Some(0.3),
                _ => None,
            }),
            Self::Afflicted => by_category(&|c| match c {
                FactorCategory::Wholesome => Some(0.3),
                FactorCategory::PrimaryAffliction => Some(0.7),
                _ => None,
            }),
            Self::Practitioner => map(&[
                ("sraddha", 0.7),
                ("virya", 0.6),
                ("alobha", 0.6),
                ("raga", 0.3),
                ("moha", 0.4),
            ]),
            Self::Worldling => map(&[
                ("raga", 0.6),
                ("moha", 0.6),
                ("mana", 0.5),
                ("alobha", 0.3),
                ("amoha", 0.3),
            ]),
            Self::Sage => map(&[
                ("amoha", 0.8),
                ("prajna", 0.7),
                ("moha", 0.2),
                ("drsti", 0.2),
            ]),
            Self::Greedy => map(&[("raga", 0.8), ("matsarya", 0.6), ("alobha", 0.2)]),
            Self::Wrathful => map(&[("pratigha", 0.8), ("krodha", 0.7), ("advesa", 0.2)]),
        }
    }

    /// Initial capability strengths. Gauges not listed start at the default.
    pub fn capabilities(&self) -> HashMap<String, f64> {
        match self {
            Self::Neutral | Self::Virtuous | Self::Afflicted => HashMap::new(),
            Self::Practitioner => map(&[("samadhi", 0.6), ("prajna", 0.6), ("smrti", 0.6)]),
            Self::Worldling => map(&[("chanda", 0.6), ("prajna", 0.4)]),
            Self::Sage => map(&[("prajna", 0.8), ("smrti", 0.6), ("samadhi", 0.5)]),
            Self::Greedy => map(&[("chanda", 0.7)]),
            Self::Wrathful => map(&[("adhimoksa", 0.6)]),
        }
    }
}

fn map(entries: &[(&str, f64)]) -> HashMap<String, f64> {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Archetype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.id() == s)
            .ok_or_else(|| format!("unknown archetype: {}", s))
    }
}
