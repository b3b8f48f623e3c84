//! Stimulus pipeline: the five universal factors as an event pipeline.
//!
//! ```text
//! stimulus -> attention -> contact -> feeling -> labeling -> volition
//! ```
//!
//! A strict sequence, each stage consuming the previous output plus the
//! shared [`PipelineContext`]. Every stage clamps its own output to [0, 1].
//! The pipeline reads capability and affliction levels but never touches the
//! trait store; it only appends to its own bounded event log.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use crate::config::PipelineConfig;
use crate::manifestation::StrengthMap;

/// Clarity at or below which contact fails.
const CONTACT_FLOOR: f64 = 0.2;
/// Clarity propagated downstream after failed contact.
const FAILED_CLARITY: f64 = 0.1;
/// Combined valence beyond which a feeling is pleasant or unpleasant.
const TONE_BAND: f64 = 0.2;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeelingTone {
    Pleasant,
    Unpleasant,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolitionDirection {
    Approach,
    Avoid,
    Hold,
}

impl From<FeelingTone> for VolitionDirection {
    fn from(tone: FeelingTone) -> Self {
        match tone {
            FeelingTone::Pleasant => Self::Approach,
            FeelingTone::Unpleasant => Self::Avoid,
            FeelingTone::Neutral => Self::Hold,
        }
    }
}

/// Live state the pipeline reads. Missing keys fall back to neutral values:
/// 0.5 for capabilities, 0.0 for afflictions, biases and valences.
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    /// Capability id -> effective strength
    pub capabilities: StrengthMap,
    /// Active affliction id -> strength
    pub afflictions: StrengthMap,
    /// Stimulus -> habitual attention bias, [-1, 1]
    pub seed_bias: HashMap<String, f64>,
    /// Stimulus -> learned hedonic tone
    pub seed_valence: HashMap<String, f64>,
    pub scene_valence: f64,
    /// Traits whose triggers include the stimulus
    pub triggered: Vec<String>,
}

impl PipelineContext {
    #[inline]
    fn capability(&self, id: &str) -> f64 {
        self.capabilities.get(id).copied().unwrap_or(0.5)
    }

    #[inline]
    fn affliction(&self, id: &str) -> f64 {
        self.afflictions.get(id).copied().unwrap_or(0.0)
    }
}

/// Attention stage output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attention {
    pub target: String,
    pub strength: f64,
}

/// Contact stage output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub success: bool,
    /// Clarity passed downstream (floored to 0.1 on failure)
    pub clarity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Feeling {
    pub tone: FeelingTone,
    pub intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Labeling {
    pub label: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Volition {
    pub direction: VolitionDirection,
    pub force: f64,
}

/// Full trace of one stimulus through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentalEvent {
    pub stimulus: String,
    pub intensity: f64,
    pub attention: Attention,
    pub contact: Contact,
    pub feeling: Feeling,
    pub labeling: Labeling,
    pub volition: Volition,
    pub timestamp: u64,
    #[serde(default)]
    pub triggered: Vec<String>,
}

impl MentalEvent {
    /// One-line trace for logs.
    pub fn to_log(&self) -> String {
        format!(
            "[{}] {} -> attention({}, {:.2}) -> contact({}, {:.2}) -> feeling({:?}, {:.2}) -> label({}, {:.2}) -> volition({:?}, {:.2})",
            self.timestamp,
            self.stimulus,
            self.attention.target,
            self.attention.strength,
            if self.contact.success { "ok" } else { "failed" },
            self.contact.clarity,
            self.feeling.tone,
            self.feeling.intensity,
            self.labeling.label,
            self.labeling.confidence,
            self.volition.direction,
            self.volition.force,
        )
    }
}

/// Aggregate over the most recent events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub total_events: usize,
    pub recent_pleasant: usize,
    pub recent_unpleasant: usize,
    pub recent_neutral: usize,
    pub avg_attention: f64,
    pub avg_clarity: f64,
}

// ============================================================================
// Pipeline
// ============================================================================

#[derive(Debug, Clone)]
pub struct StimulusPipeline {
    config: PipelineConfig,
    log: VecDeque<MentalEvent>,
    current_time: u64,
}

impl Default for StimulusPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl StimulusPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            log: VecDeque::with_capacity(config.log_cap.min(1024)),
            config,
            current_time: 0,
        }
    }

    #[inline]
    pub fn current_time(&self) -> u64 {
        self.current_time
    }

    /// Advance the pipeline's own clock.
    pub fn tick(&mut self) {
        self.current_time += 1;
    }

    /// Run one stimulus through all five stages and log the event.
    pub fn process(&mut self, stimulus: &str, intensity: f64, ctx: &PipelineContext) -> MentalEvent {
        let intensity = if intensity.is_finite() {
            intensity.clamp(0.0, 1.0)
        } else {
            log::warn!("Non-finite intensity for stimulus '{}', using 0", stimulus);
            0.0
        };

        let attention = attend(stimulus, intensity, ctx);
        let contact = make_contact(attention.strength, ctx);
        let feeling = feel(stimulus, contact.clarity, ctx);
        let labeling = label(stimulus, ctx);
        let volition = will(feeling, ctx);

        let event = MentalEvent {
            stimulus: stimulus.to_string(),
            intensity,
            attention,
            contact,
            feeling,
            labeling,
            volition,
            timestamp: self.current_time,
            triggered: ctx.triggered.clone(),
        };
        log::trace!("{}", event.to_log());

        self.push(event.clone());
        event
    }

    fn push(&mut self, event: MentalEvent) {
        self.log.push_back(event);
        let cap = self.config.log_cap;
        if self.log.len() > cap {
            // keep never exceeds cap, even for an unvalidated config
            let keep = self.config.log_keep.min(cap);
            let excess = self.log.len() - keep;
            self.log.drain(..excess);
        }
    }

    pub fn events(&self) -> impl DoubleEndedIterator<Item = &MentalEvent> {
        self.log.iter()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// The `n` most recent events, oldest first.
    pub fn recent(&self, n: usize) -> Vec<&MentalEvent> {
        let skip = self.log.len().saturating_sub(n);
        self.log.iter().skip(skip).collect()
    }

    /// Summary over the last `summary_window` events. `None` when empty.
    pub fn summary(&self) -> Option<EventSummary> {
        if self.log.is_empty() {
            return None;
        }
        let recent = self.recent(self.config.summary_window);
        let n = recent.len() as f64;
        let count = |tone: FeelingTone| recent.iter().filter(|e| e.feeling.tone == tone).count();

        Some(EventSummary {
            total_events: self.log.len(),
            recent_pleasant: count(FeelingTone::Pleasant),
            recent_unpleasant: count(FeelingTone::Unpleasant),
            recent_neutral: count(FeelingTone::Neutral),
            avg_attention: recent.iter().map(|e| e.attention.strength).sum::<f64>() / n,
            avg_clarity: recent.iter().map(|e| e.contact.clarity).sum::<f64>() / n,
        })
    }
}

// ============================================================================
// Stages
// ============================================================================

fn attend(stimulus: &str, intensity: f64, ctx: &PipelineContext) -> Attention {
    let chanda = ctx.capability("chanda");
    let bias = ctx.seed_bias.get(stimulus).copied().unwrap_or(0.0);
    let distraction = ctx.affliction("viksepa");

    let strength = intensity * (0.5 + chanda * 0.3 + bias * 0.2) * (1.0 - distraction * 0.5);
    Attention {
        target: stimulus.to_string(),
        strength: strength.clamp(0.0, 1.0),
    }
}

fn make_contact(attention: f64, ctx: &PipelineContext) -> Contact {
    let samadhi = ctx.capability("samadhi");
    let torpor = ctx.affliction("styana");

    let clarity = (attention * (0.5 + samadhi * 0.5) * (1.0 - torpor * 0.7)).clamp(0.0, 1.0);
    let success = clarity > CONTACT_FLOOR;
    Contact {
        success,
        clarity: if success { clarity } else { FAILED_CLARITY },
    }
}

fn feel(stimulus: &str, clarity: f64, ctx: &PipelineContext) -> Feeling {
    let seed = ctx.seed_valence.get(stimulus).copied().unwrap_or(0.0);
    let combined = seed + ctx.scene_valence;

    let tone = if combined > TONE_BAND {
        FeelingTone::Pleasant
    } else if combined < -TONE_BAND {
        FeelingTone::Unpleasant
    } else {
        FeelingTone::Neutral
    };
    Feeling {
        tone,
        intensity: (combined.abs() * clarity).clamp(0.0, 1.0),
    }
}

/// Wrong view lowers confidence; it never changes the label.
fn label(stimulus: &str, ctx: &PipelineContext) -> Labeling {
    let prajna = ctx.capability("prajna");
    let smrti = ctx.capability("smrti");
    let wrong_view = ctx.affliction("drsti");

    Labeling {
        label: stimulus.to_string(),
        confidence: ((prajna * 0.5 + smrti * 0.5) * (1.0 - wrong_view * 0.5)).clamp(0.0, 1.0),
    }
}

fn will(feeling: Feeling, ctx: &PipelineContext) -> Volition {
    let chanda = ctx.capability("chanda");
    let adhimoksa = ctx.capability("adhimoksa");
    let laziness = ctx.affliction("kausidya");

    let force = feeling.intensity * (chanda * 0.5 + adhimoksa * 0.5) * (1.0 - laziness * 0.5);
    Volition {
        direction: feeling.tone.into(),
        force: force.clamp(0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> PipelineContext {
        PipelineContext::default()
    }

    #[test]
    fn neutral_context_defaults() {
        let mut p = StimulusPipeline::default();
        let e = p.process("noise", 1.0, &ctx());

        // 1.0 * (0.5 + 0.5*0.3) = 0.65
        assert!((e.attention.strength - 0.65).abs() < 1e-12);
        // 0.65 * 0.75
        assert!((e.contact.clarity - 0.4875).abs() < 1e-12);
        assert!(e.contact.success);
        assert_eq!(e.feeling.tone, FeelingTone::Neutral);
        assert_eq!(e.feeling.intensity, 0.0);
        assert!((e.labeling.confidence - 0.5).abs() < 1e-12);
        assert_eq!(e.labeling.label, "noise");
        assert_eq!(e.volition.direction, VolitionDirection::Hold);
        assert_eq!(e.volition.force, 0.0);
    }

    #[test]
    fn failed_contact_degrades_to_floor() {
        let mut p = StimulusPipeline::default();
        let mut c = ctx();
        c.afflictions.insert("styana".into(), 1.0);
        c.scene_valence = 0.5;
        let e = p.process("whisper", 0.3, &c);

        assert!(!e.contact.success);
        assert_eq!(e.contact.clarity, 0.1);
        assert_eq!(e.feeling.tone, FeelingTone::Pleasant);
        assert!((e.feeling.intensity - 0.05).abs() < 1e-12);
    }

    #[test]
    fn feeling_tone_band_is_strict() {
        let mut p = StimulusPipeline::default();
        let mut c = ctx();
        c.scene_valence = 0.2;
        assert_eq!(p.process("x", 1.0, &c).feeling.tone, FeelingTone::Neutral);

        c.seed_valence.insert("x".into(), -0.5);
        let e = p.process("x", 1.0, &c);
        assert_eq!(e.feeling.tone, FeelingTone::Unpleasant);
        assert_eq!(e.volition.direction, VolitionDirection::Avoid);
        assert!(e.volition.force > 0.0);
    }

    #[test]
    fn wrong_view_lowers_confidence_only() {
        let mut p = StimulusPipeline::default();
        let mut c = ctx();
        c.capabilities.insert("prajna".into(), 0.8);
        c.capabilities.insert("smrti".into(), 0.6);
        c.afflictions.insert("drsti".into(), 1.0);
        let e = p.process("teaching", 1.0, &c);
        assert!((e.labeling.confidence - 0.35).abs() < 1e-12);
        assert_eq!(e.labeling.label, "teaching");
    }

    #[test]
    fn outputs_stay_in_unit_range() {
        let mut p = StimulusPipeline::default();
        let mut c = ctx();
        c.seed_bias.insert("gold".into(), 1.0);
        c.capabilities.insert("chanda".into(), 1.0);
        c.capabilities.insert("samadhi".into(), 1.0);
        c.seed_valence.insert("gold".into(), 3.0);
        let e = p.process("gold", 7.0, &c);
        for v in [
            e.attention.strength,
            e.contact.clarity,
            e.feeling.intensity,
            e.labeling.confidence,
            e.volition.force,
        ] {
            assert!((0.0..=1.0).contains(&v));
        }
        assert_eq!(e.intensity, 1.0);
    }

    #[test]
    fn log_is_bounded() {
        let mut p = StimulusPipeline::new(PipelineConfig {
            log_cap: 10,
            log_keep: 5,
            summary_window: 4,
        });
        for i in 0..11 {
            p.process(&format!("s{}", i), 1.0, &ctx());
        }
        assert_eq!(p.len(), 5);
        assert_eq!(p.events().next().unwrap().stimulus, "s6");

        let summary = p.summary().unwrap();
        assert_eq!(summary.total_events, 5);
        assert_eq!(summary.recent_neutral, 4);
    }

    #[test]
    fn log_keep_above_cap_trims_to_cap() {
        let mut p = StimulusPipeline::new(PipelineConfig {
            log_cap: 1,
            log_keep: 5,
            summary_window: 4,
        });
        for i in 0..3 {
            p.process(&format!("s{}", i), 1.0, &ctx());
        }
        assert_eq!(p.len(), 1);
        assert_eq!(p.events().next().unwrap().stimulus, "s2");
    }

    #[test]
    fn tick_only_moves_own_clock() {
        let mut p = StimulusPipeline::default();
        assert!(p.summary().is_none());
        p.tick();
        p.tick();
        assert_eq!(p.process("x", 1.0, &ctx()).timestamp, 2);
    }
}
