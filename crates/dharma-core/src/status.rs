//! Read-only review outputs for a presentation layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::capability::Direction;
use crate::engine::IndeterminateState;
use crate::pipeline::EventSummary;

/// One row of the capability table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityStatus {
    pub id: String,
    pub name: String,
    pub strength: f64,
    pub effective: f64,
    pub stability: f64,
    pub direction: Direction,
    pub disrupted: bool,
    pub disruption_source: Option<String>,
    /// `effective * valence`
    pub effect: f64,
    pub description: String,
}

/// A trait id with its display name and a level (weight or activation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitLevel {
    pub id: String,
    pub name: String,
    pub level: f64,
}

/// Full snapshot of one character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub time: u64,
    pub scene: Option<String>,
    pub capabilities: Vec<CapabilityStatus>,
    pub patterns: Vec<String>,
    pub dominant_afflictions: Vec<TraitLevel>,
    pub dominant_wholesome: Vec<TraitLevel>,
    pub manifest_wholesome: Vec<TraitLevel>,
    pub manifest_afflictions: Vec<TraitLevel>,
    pub net_valence: f64,
    pub indeterminate: IndeterminateState,
    pub counterforces: BTreeMap<String, f64>,
    pub pipeline: Option<EventSummary>,
}

fn join_levels(levels: &[TraitLevel]) -> String {
    levels
        .iter()
        .map(|t| format!("{}({:.2})", t.name, t.level))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Human-readable review report.
impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Mental state review (t={}) ===", self.time)?;
        if let Some(scene) = &self.scene {
            writeln!(f, "Scene: {}", scene)?;
        }

        writeln!(f, "\n[Capabilities]")?;
        for c in &self.capabilities {
            writeln!(f, "  {}", c.description)?;
        }

        if !self.patterns.is_empty() {
            writeln!(f, "\n[Patterns] {}", self.patterns.join(", "))?;
        }
        if !self.manifest_wholesome.is_empty() {
            writeln!(f, "\n[Wholesome active] {}", join_levels(&self.manifest_wholesome))?;
        }
        if !self.manifest_afflictions.is_empty() {
            writeln!(f, "\n[Afflictions active] {}", join_levels(&self.manifest_afflictions))?;
        }

        let v = self.net_valence;
        if v > 0.5 {
            writeln!(f, "\n[Overall] wholesome forces prevail (+{:.2})", v)?;
        } else if v < -0.5 {
            writeln!(f, "\n[Overall] afflictions weigh heavily ({:.2})", v)?;
        } else {
            writeln!(f, "\n[Overall] balanced ({:.2})", v)?;
        }

        let latent: Vec<TraitLevel> = self.dominant_afflictions.iter().take(2).cloned().collect();
        if !latent.is_empty() {
            writeln!(f, "\n[Latent affliction seeds] {}", join_levels(&latent))?;
        }

        if !self.counterforces.is_empty() {
            let cf = self
                .counterforces
                .iter()
                .map(|(k, v)| format!("{}={:.2}", k, v))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(f, "\n[Counterforces] {}", cf)?;
        }
        Ok(())
    }
}
