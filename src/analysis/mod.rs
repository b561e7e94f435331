//! Trait profiling
//!
//! Maps a feature vector onto six bounded trait scores plus a set of
//! human-readable descriptions, using a fixed table of threshold rules.

pub mod rules;

pub use rules::{Branch, Effect, PersonalityScorer, Rule};

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// Lowest score any trait can end up with
pub const MIN_SCORE: f64 = 0.1;
/// Highest score any trait can end up with
pub const MAX_SCORE: f64 = 1.0;
/// Score every trait starts from before rules run
pub const DEFAULT_SCORE: f64 = 0.5;

/// The six scored traits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Trait {
    Sociability,
    Focus,
    Intensity,
    Optimism,
    Discipline,
    Spontaneity,
}

impl Trait {
    /// All traits in chart order
    pub const ALL: [Trait; 6] = [
        Trait::Sociability,
        Trait::Focus,
        Trait::Intensity,
        Trait::Optimism,
        Trait::Discipline,
        Trait::Spontaneity,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Trait::Sociability => "Sociability",
            Trait::Focus => "Focus",
            Trait::Intensity => "Intensity",
            Trait::Optimism => "Optimism",
            Trait::Discipline => "Discipline",
            Trait::Spontaneity => "Spontaneity",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Trait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Quantitative view: one score per trait
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraitScores {
    values: [f64; 6],
}

impl Default for TraitScores {
    fn default() -> Self {
        Self {
            values: [DEFAULT_SCORE; 6],
        }
    }
}

impl TraitScores {
    pub fn get(&self, t: Trait) -> f64 {
        self.values[t.index()]
    }

    pub fn set(&mut self, t: Trait, value: f64) {
        self.values[t.index()] = value;
    }

    pub fn adjust(&mut self, t: Trait, delta: f64) {
        self.values[t.index()] += delta;
    }

    /// Clamp every score into [MIN_SCORE, MAX_SCORE]
    pub fn clamp(&mut self) {
        for value in &mut self.values {
            *value = value.clamp(MIN_SCORE, MAX_SCORE);
        }
    }

    /// (trait, score) pairs in chart order
    pub fn iter(&self) -> impl Iterator<Item = (Trait, f64)> + '_ {
        Trait::ALL.iter().map(move |&t| (t, self.get(t)))
    }
}

impl Serialize for TraitScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Trait::ALL.len()))?;
        for (t, score) in self.iter() {
            map.serialize_entry(t.name(), &score)?;
        }
        map.end()
    }
}

/// One descriptive finding, e.g. `Mood: Steady, balanced, and stable.`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub label: &'static str,
    pub text: &'static str,
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.text)
    }
}

/// Scores and descriptions derived from one feature vector
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraitProfile {
    pub scores: TraitScores,
    descriptions: Vec<Descriptor>,
}

impl TraitProfile {
    /// Record a description; a later one with the same label replaces the earlier
    pub fn describe(&mut self, descriptor: Descriptor) {
        match self.descriptions.iter_mut().find(|d| d.label == descriptor.label) {
            Some(existing) => *existing = descriptor,
            None => self.descriptions.push(descriptor),
        }
    }

    /// Descriptions in the order the rules produced them
    pub fn descriptions(&self) -> &[Descriptor] {
        &self.descriptions
    }
}

/// Serializes `descriptions` as a label -> sentence map
pub struct DescriptionMap<'a>(pub &'a [Descriptor]);

impl Serialize for DescriptionMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for d in self.0 {
            map.serialize_entry(d.label, d.text)?;
        }
        map.end()
    }
}

impl Serialize for TraitProfile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("scores", &self.scores)?;
        map.serialize_entry("descriptions", &DescriptionMap(&self.descriptions))?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scores() {
        let scores = TraitScores::default();
        assert!(scores.iter().all(|(_, s)| s == DEFAULT_SCORE));
        assert_eq!(scores.iter().count(), 6);
    }

    #[test]
    fn test_clamp() {
        let mut scores = TraitScores::default();
        scores.set(Trait::Focus, -3.0);
        scores.set(Trait::Discipline, 1.2);
        scores.clamp();

        assert_eq!(scores.get(Trait::Focus), MIN_SCORE);
        assert_eq!(scores.get(Trait::Discipline), MAX_SCORE);
        assert_eq!(scores.get(Trait::Optimism), DEFAULT_SCORE);
    }

    #[test]
    fn test_describe_replaces_same_label() {
        let mut profile = TraitProfile::default();
        profile.describe(Descriptor {
            label: "Mood",
            text: "first",
        });
        profile.describe(Descriptor {
            label: "Focus",
            text: "other",
        });
        profile.describe(Descriptor {
            label: "Mood",
            text: "second",
        });

        assert_eq!(profile.descriptions().len(), 2);
        assert_eq!(profile.descriptions()[0].text, "second");
        assert_eq!(profile.descriptions()[0].label, "Mood");
    }

    #[test]
    fn test_profile_json_shape() {
        let mut profile = TraitProfile::default();
        profile.describe(Descriptor {
            label: "Planning",
            text: "Cautious.",
        });

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["scores"]["Sociability"], 0.5);
        assert_eq!(json["scores"].as_object().unwrap().len(), 6);
        assert_eq!(json["descriptions"]["Planning"], "Cautious.");
    }

    #[test]
    fn test_descriptor_display() {
        let d = Descriptor {
            label: "Outlook",
            text: "Controlled, independent, balanced.",
        };
        assert_eq!(d.to_string(), "Outlook: Controlled, independent, balanced.");
    }
}
