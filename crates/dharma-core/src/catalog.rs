//! Mental-factor catalog.
//!
//! The catalog is the static, read-only table every core component consults:
//! which trait ids exist, which category each belongs to, and which trait
//! acts as its antidote. It is built once, wrapped in an `Arc`, and injected
//! into the store, the capability system and the engine.
//!
//! # Categories (51 factors in the built-in table)
//! - **Universal** (5): present in every mind-moment
//! - **Particular** (5): object-specific, backed by the capability gauges
//! - **Wholesome** (11)
//! - **Primary affliction** (6): the root afflictions
//! - **Secondary affliction** (20): derived afflictions
//! - **Indeterminate** (4): polarity decided by context

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Category of a mental factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorCategory {
    Universal,
    Particular,
    Wholesome,
    PrimaryAffliction,
    SecondaryAffliction,
    Indeterminate,
}

impl FactorCategory {
    /// Primary and secondary afflictions.
    #[inline]
    pub fn is_affliction(&self) -> bool {
        matches!(self, Self::PrimaryAffliction | Self::SecondaryAffliction)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Universal => "universal",
            Self::Particular => "particular",
            Self::Wholesome => "wholesome",
            Self::PrimaryAffliction => "primary affliction",
            Self::SecondaryAffliction => "secondary affliction",
            Self::Indeterminate => "indeterminate",
        }
    }
}

impl std::fmt::Display for FactorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Definition of one mental factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorDef {
    pub id: String,
    /// English display name
    pub name: String,
    #[serde(default)]
    pub sanskrit: String,
    pub category: FactorCategory,
    #[serde(default)]
    pub description: String,
    /// Trait id that counteracts this one. May name an id outside the
    /// catalog, in which case counterforce on this trait is a no-op.
    #[serde(default)]
    pub antidote: Option<String>,
    /// Stimulus tags that habitually call this factor up.
    #[serde(default)]
    pub triggers: Vec<String>,
}

#[derive(Error, Debug, PartialEq)]
pub enum CatalogError {
    #[error("catalog is empty")]
    Empty,
    #[error("duplicate factor id: {0}")]
    Duplicate(String),
    #[error("factor id must not be blank")]
    BlankId,
}

/// Ordered, indexed set of factor definitions.
///
/// Iteration order is insertion order. The store and the manifestation
/// sampler both walk the catalog in this order, which keeps seeded runs
/// reproducible and gives `dominant` its tie-break.
#[derive(Debug, Clone)]
pub struct FactorCatalog {
    factors: Vec<FactorDef>,
    index: HashMap<String, usize>,
}

impl FactorCatalog {
    /// Build a catalog from caller data.
    pub fn new(factors: Vec<FactorDef>) -> Result<Self, CatalogError> {
        if factors.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut index = HashMap::with_capacity(factors.len());
        for (i, f) in factors.iter().enumerate() {
            if f.id.trim().is_empty() {
                return Err(CatalogError::BlankId);
            }
            if index.insert(f.id.clone(), i).is_some() {
                return Err(CatalogError::Duplicate(f.id.clone()));
            }
        }
        Ok(Self { factors, index })
    }

    /// The built-in 51-factor catalog.
    pub fn builtin() -> Self {
        let factors: Vec<FactorDef> = BUILTIN.iter().map(Entry::to_def).collect();
        let index = factors
            .iter()
            .enumerate()
            .map(|(i, f)| (f.id.clone(), i))
            .collect();
        Self { factors, index }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Position of `id` in catalog order.
    #[inline]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&FactorDef> {
        self.position(id).map(|i| &self.factors[i])
    }

    pub fn category(&self, id: &str) -> Option<FactorCategory> {
        self.get(id).map(|f| f.category)
    }

    /// Configured antidote id for `id`, if any.
    pub fn antidote(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(|f| f.antidote.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FactorDef> {
        self.factors.iter()
    }

    pub fn in_category(&self, category: FactorCategory) -> impl Iterator<Item = &FactorDef> {
        self.factors.iter().filter(move |f| f.category == category)
    }

    /// Membership of the wholesome direction set used by capability
    /// direction updates.
    #[inline]
    pub fn in_wholesome_set(&self, id: &str) -> bool {
        self.category(id) == Some(FactorCategory::Wholesome)
    }

    /// Membership of the core-affliction direction set (root afflictions).
    #[inline]
    pub fn in_core_affliction_set(&self, id: &str) -> bool {
        self.category(id) == Some(FactorCategory::PrimaryAffliction)
    }

    /// Factors listing `stimulus` among their triggers.
    pub fn triggered_by<'a>(&'a self, stimulus: &'a str) -> impl Iterator<Item = &'a FactorDef> {
        self.factors
            .iter()
            .filter(move |f| f.triggers.iter().any(|t| t == stimulus))
    }

    /// Display name, falling back to the id for unknown factors.
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map(|f| f.name.as_str()).unwrap_or(id)
    }
}

impl Default for FactorCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

// ============================================================================
// Built-in table
// ============================================================================

struct Entry {
    id: &'static str,
    name: &'static str,
    sanskrit: &'static str,
    category: FactorCategory,
    antidote: Option<&'static str>,
    triggers: &'static [&'static str],
    description: &'static str,
}

impl Entry {
    fn to_def(&self) -> FactorDef {
        FactorDef {
            id: self.id.to_string(),
            name: self.name.to_string(),
            sanskrit: self.sanskrit.to_string(),
            category: self.category,
            description: self.description.to_string(),
            antidote: self.antidote.map(str::to_string),
            triggers: self.triggers.iter().map(|t| t.to_string()).collect(),
        }
    }
}

use self::FactorCategory::{
    Indeterminate, Particular, PrimaryAffliction, SecondaryAffliction, Universal, Wholesome,
};

const fn e(
    id: &'static str,
    name: &'static str,
    sanskrit: &'static str,
    category: FactorCategory,
    antidote: Option<&'static str>,
    triggers: &'static [&'static str],
    description: &'static str,
) -> Entry {
    Entry {
        id,
        name,
        sanskrit,
        category,
        antidote,
        triggers,
        description,
    }
}

const BUILTIN: &[Entry] = &[
    // Universal
    e("cetana", "volition", "cetanā", Universal, None, &["always"],
        "Drives the mind to act"),
    e("sparsa", "contact", "sparśa", Universal, None, &["always"],
        "Meeting of faculty, object and consciousness"),
    e("manaskara", "attention", "manaskāra", Universal, None, &["always"],
        "Turns the mind toward its object"),
    e("vedana", "feeling", "vedanā", Universal, None, &["always"],
        "Pleasant, unpleasant or neutral experience"),
    e("samjna", "perception", "saṃjñā", Universal, None, &["always"],
        "Grasps the object's marks and labels it"),
    // Particular
    e("chanda", "desire-to-act", "chanda", Particular, None, &["goal_present"],
        "Wish toward a desired object"),
    e("adhimoksa", "resolve", "adhimokṣa", Particular, None, &["decision_made"],
        "Holds an ascertained object firmly"),
    e("smrti", "mindfulness", "smṛti", Particular, None, &["memory_accessed"],
        "Keeps a familiar object without forgetting"),
    e("samadhi", "concentration", "samādhi", Particular, None, &["focus_sustained"],
        "One-pointedness of mind"),
    e("prajna", "wisdom", "prajñā", Particular, None, &["analysis_active"],
        "Discriminates the examined object"),
    // Wholesome
    e("sraddha", "faith", "śraddhā", Wholesome, None,
        &["truth_encountered", "virtue_witnessed"], "Clear confidence in what is real and good"),
    e("hri", "shame", "hrī", Wholesome, None, &["wrongdoing_self"],
        "Self-respect that honours the good"),
    e("apatrapya", "embarrassment", "apatrāpya", Wholesome, None, &["wrongdoing_public"],
        "Regard for others that shuns wrongdoing"),
    e("alobha", "non-attachment", "alobha", Wholesome, None,
        &["generosity_practiced", "letting_go"], "Absence of clinging"),
    e("advesa", "non-hatred", "adveṣa", Wholesome, None,
        &["compassion_practiced", "patience_shown"], "Absence of ill-will"),
    e("amoha", "non-delusion", "amoha", Wholesome, None,
        &["understanding_gained", "truth_realized"], "Clear understanding"),
    e("virya", "diligence", "vīrya", Wholesome, None,
        &["effort_sustained", "challenge_faced"], "Courageous effort toward the good"),
    e("prasrabdhi", "tranquility", "praśrabdhi", Wholesome, None,
        &["meditation_deepened", "stress_released"], "Pliancy of body and mind"),
    e("apramada", "conscientiousness", "apramāda", Wholesome, None,
        &["vigilance_maintained"], "Guarding what is wholesome"),
    e("upeksa", "equanimity", "upekṣā", Wholesome, None,
        &["balance_achieved", "extremes_avoided"], "Even, upright and effortless mind"),
    e("ahimsa", "non-violence", "ahiṃsā", Wholesome, None, &["compassion_active"],
        "Not harming beings"),
    // Primary afflictions
    e("raga", "greed", "rāga", PrimaryAffliction, Some("alobha"),
        &["desirable_object", "scarcity_perceived", "pleasure_memory"],
        "Attachment to existence and its supports"),
    e("pratigha", "anger", "pratigha", PrimaryAffliction, Some("advesa"),
        &["obstacle_encountered", "harm_received", "expectation_violated"],
        "Aversion toward suffering and its causes"),
    e("moha", "delusion", "moha", PrimaryAffliction, Some("amoha"),
        &["complexity_high", "information_overload", "deceptive_input"],
        "Darkness about things and principles"),
    e("mana", "pride", "māna", PrimaryAffliction, Some("upeksa"),
        &["success_achieved", "comparison_favorable", "status_high"],
        "Elevating oneself over others"),
    e("vicikitsa", "doubt", "vicikitsā", PrimaryAffliction, Some("adhimoksa"),
        &["uncertainty_high", "conflicting_info", "risk_perceived"],
        "Hesitation about the truths"),
    e("drsti", "wrong view", "dṛṣṭi", PrimaryAffliction, Some("prajna"),
        &["false_teaching", "ego_investment", "confirmation_bias"],
        "Inverted reasoning about the truths"),
    // Secondary afflictions
    e("krodha", "fury", "krodha", SecondaryAffliction, Some("advesa"),
        &["immediate_harm", "provocation"], "Outburst at a present harm"),
    e("upanaha", "resentment", "upanāha", SecondaryAffliction, Some("advesa"),
        &["past_harm_memory", "grudge_activated"], "Holding on to ill-will"),
    e("mraksa", "concealment", "mrakṣa", SecondaryAffliction, Some("hri"),
        &["wrongdoing_detected", "reputation_threatened"], "Hiding one's faults"),
    e("pradasa", "spite", "pradāśa", SecondaryAffliction, Some("advesa"),
        &["confrontation", "revenge_opportunity"], "Vicious, stinging hostility"),
    e("irsya", "jealousy", "īrṣyā", SecondaryAffliction, Some("mudita"),
        &["others_success", "comparison_unfavorable"], "Intolerance of others' fortune"),
    e("matsarya", "stinginess", "mātsarya", SecondaryAffliction, Some("alobha"),
        &["resource_request", "sharing_opportunity"], "Miserly hoarding"),
    e("maya", "deceit", "māyā", SecondaryAffliction, Some("hri"),
        &["gain_opportunity", "impression_management"], "Feigning virtue for gain"),
    e("sathya", "flattery", "śāṭhya", SecondaryAffliction, Some("hri"),
        &["power_differential", "favor_seeking"], "Crooked ingratiation"),
    e("vihimsa", "harmfulness", "vihiṃsā", SecondaryAffliction, Some("ahimsa"),
        &["vulnerability_detected", "power_available"], "Lack of compassion, wish to harm"),
    e("mada", "vanity", "mada", SecondaryAffliction, Some("upeksa"),
        &["achievement", "praise_received"], "Intoxication with one's success"),
    e("ahrikya", "shamelessness", "āhrīkya", SecondaryAffliction, Some("hri"),
        &["wrongdoing_rationalized"], "Disregard of one's own conscience"),
    e("anapatrapya", "recklessness", "anapatrāpya", SecondaryAffliction, Some("apatrapya"),
        &["social_norms_ignored"], "Disregard of others' judgement"),
    e("styana", "torpor", "styāna", SecondaryAffliction, Some("virya"),
        &["fatigue", "overeating", "lack_of_purpose"], "Heaviness that makes the mind unfit"),
    e("auddhatya", "restlessness", "auddhatya", SecondaryAffliction, Some("upeksa"),
        &["excitement", "anxiety", "reward_anticipation"], "Agitation that prevents calm"),
    e("asraddhya", "faithlessness", "āśraddhya", SecondaryAffliction, Some("sraddha"),
        &["disappointment", "betrayal_experienced"], "Absence of confidence"),
    e("kausidya", "laziness", "kausīdya", SecondaryAffliction, Some("virya"),
        &["difficulty_perceived", "comfort_available"], "Sloth toward the good"),
    e("pramada", "negligence", "pramāda", SecondaryAffliction, Some("apramada"),
        &["discipline_lapse", "temptation_present"], "Failing to guard the mind"),
    e("musitasmritita", "forgetfulness", "muṣitasmṛtitā", SecondaryAffliction, Some("smrti"),
        &["distraction", "multitasking", "overload"], "Losing hold of the object"),
    e("viksepa", "distraction", "vikṣepa", SecondaryAffliction, Some("samadhi"),
        &["stimuli_multiple", "noise", "social_interruption"], "Scattering of the mind"),
    e("asamprajanya", "non-alertness", "asaṃprajanya", SecondaryAffliction, Some("prajna"),
        &["emotional_override", "habit_autopilot"], "Not knowing what one is doing"),
    // Indeterminate
    e("middha", "sleep", "middha", Indeterminate, None, &["fatigue_high", "night_time"],
        "Dimming and contraction of the mind"),
    e("kaukritya", "regret", "kaukṛtya", Indeterminate, None,
        &["action_reviewed", "outcome_negative"], "Remorse over past deeds"),
    e("vitarka", "initial thought", "vitarka", Indeterminate, None,
        &["new_object", "inquiry_start"], "Coarse inquiry"),
    e("vicara", "sustained thought", "vicāra", Indeterminate, None,
        &["analysis_ongoing", "detail_focus"], "Fine examination"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_fifty_one_factors() {
        let catalog = FactorCatalog::builtin();
        assert_eq!(catalog.len(), 51);

        let count = |c| catalog.in_category(c).count();
        assert_eq!(count(FactorCategory::Universal), 5);
        assert_eq!(count(FactorCategory::Particular), 5);
        assert_eq!(count(FactorCategory::Wholesome), 11);
        assert_eq!(count(FactorCategory::PrimaryAffliction), 6);
        assert_eq!(count(FactorCategory::SecondaryAffliction), 20);
        assert_eq!(count(FactorCategory::Indeterminate), 4);
    }

    #[test]
    fn antidote_lookup() {
        let catalog = FactorCatalog::builtin();
        assert_eq!(catalog.antidote("raga"), Some("alobha"));
        assert_eq!(catalog.antidote("sraddha"), None);
        assert_eq!(catalog.antidote("nope"), None);
        // jealousy points at a factor the table does not define
        assert_eq!(catalog.antidote("irsya"), Some("mudita"));
        assert!(!catalog.contains("mudita"));
    }

    #[test]
    fn direction_sets_follow_categories() {
        let catalog = FactorCatalog::builtin();
        assert!(catalog.in_wholesome_set("amoha"));
        assert!(catalog.in_core_affliction_set("drsti"));
        assert!(!catalog.in_core_affliction_set("krodha"));
        assert!(!catalog.in_wholesome_set("prajna"));
    }

    #[test]
    fn new_rejects_empty_and_duplicates() {
        assert_eq!(FactorCatalog::new(vec![]).unwrap_err(), CatalogError::Empty);

        let f = FactorDef {
            id: "x".into(),
            name: "x".into(),
            sanskrit: String::new(),
            category: FactorCategory::Wholesome,
            description: String::new(),
            antidote: None,
            triggers: vec![],
        };
        let err = FactorCatalog::new(vec![f.clone(), f]).unwrap_err();
        assert_eq!(err, CatalogError::Duplicate("x".into()));
    }

    #[test]
    fn triggers_resolve_to_factors() {
        let catalog = FactorCatalog::builtin();
        let ids: Vec<&str> = catalog
            .triggered_by("harm_received")
            .map(|f| f.id.as_str())
            .collect();
        assert_eq!(ids, vec!["pratigha"]);
    }
}
