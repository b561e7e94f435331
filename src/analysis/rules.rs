//! Threshold rules engine
//!
//! Rules run in a fixed order against a fresh set of default scores. Each
//! rule holds an ordered list of branches; the first branch whose condition
//! holds fires its effects and its description, the rest are skipped. A rule
//! with no matching branch does nothing. Scores are clamped once at the end.

use tracing::debug;

use super::{Descriptor, Trait, TraitProfile, TraitScores};
use crate::config::ScoringThresholds;
use crate::vision::FeatureVector;

/// Predicate over a feature vector
pub type Condition = Box<dyn Fn(&FeatureVector) -> bool + Send + Sync>;

/// What a firing branch does to the scores
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    /// Overwrite the score
    Assign(Trait, f64),
    /// Add to the current score
    Adjust(Trait, f64),
}

impl Effect {
    fn apply(self, scores: &mut TraitScores) {
        match self {
            Effect::Assign(t, value) => scores.set(t, value),
            Effect::Adjust(t, delta) => scores.adjust(t, delta),
        }
    }
}

/// One condition with its effects
pub struct Branch {
    condition: Condition,
    pub effects: Vec<Effect>,
    pub descriptor: Option<Descriptor>,
}

impl Branch {
    pub fn when(condition: impl Fn(&FeatureVector) -> bool + Send + Sync + 'static) -> Self {
        Self {
            condition: Box::new(condition),
            effects: Vec::new(),
            descriptor: None,
        }
    }

    /// Branch that always matches
    pub fn otherwise() -> Self {
        Self::when(|_| true)
    }

    pub fn assign(mut self, t: Trait, value: f64) -> Self {
        self.effects.push(Effect::Assign(t, value));
        self
    }

    pub fn adjust(mut self, t: Trait, delta: f64) -> Self {
        self.effects.push(Effect::Adjust(t, delta));
        self
    }

    pub fn describe(mut self, label: &'static str, text: &'static str) -> Self {
        self.descriptor = Some(Descriptor { label, text });
        self
    }

    pub fn matches(&self, features: &FeatureVector) -> bool {
        (self.condition)(features)
    }
}

impl std::fmt::Debug for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Branch")
            .field("effects", &self.effects)
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// A named group of mutually exclusive branches
#[derive(Debug)]
pub struct Rule {
    /// Rule identifier
    pub id: &'static str,
    /// Rule name for display
    pub name: &'static str,
    branches: Vec<Branch>,
}

impl Rule {
    pub fn new(id: &'static str, name: &'static str, branches: Vec<Branch>) -> Self {
        Self { id, name, branches }
    }

    /// First branch whose condition holds
    pub fn matching_branch(&self, features: &FeatureVector) -> Option<&Branch> {
        self.branches.iter().find(|b| b.matches(features))
    }

    /// Apply the matching branch; returns whether anything fired
    pub fn apply(&self, features: &FeatureVector, profile: &mut TraitProfile) -> bool {
        let Some(branch) = self.matching_branch(features) else {
            return false;
        };
        for effect in &branch.effects {
            effect.apply(&mut profile.scores);
        }
        if let Some(descriptor) = branch.descriptor {
            profile.describe(descriptor);
        }
        true
    }
}

/// Scores a feature vector with the ordered rule table
#[derive(Debug)]
pub struct PersonalityScorer {
    rules: Vec<Rule>,
}

impl Default for PersonalityScorer {
    fn default() -> Self {
        Self::new(&ScoringThresholds::default())
    }
}

impl PersonalityScorer {
    /// Build the standard rule table for the given thresholds
    pub fn new(thresholds: &ScoringThresholds) -> Self {
        Self {
            rules: standard_rules(thresholds),
        }
    }

    /// Run every rule in order, then clamp the scores
    pub fn score(&self, features: &FeatureVector) -> TraitProfile {
        let mut profile = TraitProfile::default();

        for rule in &self.rules {
            if rule.apply(features, &mut profile) {
                debug!("Rule '{}' ({}) fired", rule.id, rule.name);
            }
        }
        profile.scores.clamp();

        profile
    }
}

/// The fixed rule table, in evaluation order
pub fn standard_rules(thresholds: &ScoringThresholds) -> Vec<Rule> {
    let t = thresholds;
    let slant = t.slant_threshold;
    let ratio = t.narrow_spacing_ratio;
    let (large, small) = (t.large_letter_size, t.small_letter_size);
    let (heavy, light) = (t.heavy_pressure, t.light_pressure);
    let tolerance = t.baseline_tolerance;
    let (wide, narrow) = (t.wide_margin, t.narrow_margin);

    vec![
        Rule::new(
            "slant_outlook",
            "Slant sets sociability",
            vec![
                Branch::when(move |f| f.slant > slant)
                    .assign(Trait::Sociability, 0.8)
                    .describe("Outlook", "Sociable, expressive, approach-oriented."),
                Branch::when(move |f| f.slant < -slant)
                    .assign(Trait::Sociability, 0.2)
                    .describe("Outlook", "Reserved, withdrawn, avoids conflict."),
                Branch::otherwise()
                    .assign(Trait::Sociability, 0.4)
                    .describe("Outlook", "Controlled, independent, balanced."),
            ],
        ),
        Rule::new(
            "spacing_social_type",
            "Word spacing adjusts sociability",
            vec![
                Branch::when(|f| f.word_spacing > f.letter_size)
                    .adjust(Trait::Sociability, -0.1)
                    .describe("Social Type", "Values space, independent."),
                Branch::when(move |f| f.word_spacing < f.letter_size * ratio)
                    .adjust(Trait::Sociability, 0.2)
                    .describe("Social Type", "Sociable, seeks closeness."),
            ],
        ),
        Rule::new(
            "letter_size_focus",
            "Letter size sets focus",
            vec![
                Branch::when(move |f| f.letter_size > large)
                    .assign(Trait::Focus, 0.3)
                    .describe("Focus", "Outgoing, assertive, big-picture oriented."),
                Branch::when(move |f| f.letter_size < small)
                    .assign(Trait::Focus, 0.9)
                    .describe("Focus", "Focused, introverted, detail-oriented."),
                Branch::otherwise().describe("Focus", "Balanced and adaptable."),
            ],
        ),
        Rule::new(
            "pressure_intensity",
            "Pen pressure sets intensity",
            vec![
                Branch::when(move |f| f.pressure < heavy)
                    .assign(Trait::Intensity, 0.8)
                    .describe("Intensity", "Intense, forceful, high energy."),
                Branch::when(move |f| f.pressure > light)
                    .assign(Trait::Intensity, 0.2)
                    .describe("Intensity", "Sensitive, empathetic, low arousal."),
                Branch::otherwise().describe("Intensity", "Balanced emotional intensity."),
            ],
        ),
        Rule::new(
            "baseline_mood",
            "Baseline direction sets optimism",
            vec![
                Branch::when(move |f| f.baseline_slope < -tolerance)
                    .assign(Trait::Optimism, 0.2)
                    .describe("Mood", "Pessimistic, tired, or discouraged."),
                Branch::when(move |f| f.baseline_slope > tolerance)
                    .assign(Trait::Optimism, 0.8)
                    .describe("Mood", "Optimistic, energetic, ambitious."),
                Branch::otherwise()
                    .assign(Trait::Optimism, 0.5)
                    .describe("Mood", "Steady, balanced, and stable."),
            ],
        ),
        Rule::new(
            "baseline_discipline",
            "Straight baseline sets discipline",
            vec![
                Branch::when(move |f| (-tolerance..=tolerance).contains(&f.baseline_slope))
                    .assign(Trait::Discipline, 0.8),
                Branch::otherwise().assign(Trait::Discipline, 0.3),
            ],
        ),
        Rule::new(
            "slant_discipline",
            "Upright slant raises discipline",
            vec![Branch::when(move |f| (-slant..=slant).contains(&f.slant))
                .adjust(Trait::Discipline, 0.2)],
        ),
        Rule::new(
            "margin_planning",
            "Left margin sets spontaneity",
            vec![
                Branch::when(move |f| f.left_margin > wide)
                    .assign(Trait::Spontaneity, 0.2)
                    .describe("Planning", "Cautious, planned, looks to the future."),
                Branch::when(move |f| f.left_margin < narrow)
                    .assign(Trait::Spontaneity, 0.9)
                    .describe("Planning", "Spontaneous, impulsive, lives in the moment."),
            ],
        ),
    ]
}
