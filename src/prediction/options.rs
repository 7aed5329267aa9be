//! Prediction Options
//!
//! The per-match form a user fills in before submitting a wager. Every
//! user-entered field is a string where empty means "not predicted"; set
//! winners are derived from winner + result and kept apart from the
//! user-entered fields.

use crate::error::PredictionError;
use crate::prediction::sets::{self, MatchFormat, MatchScore};
use serde::{Deserialize, Deserializer, Serialize};

/// Number of set slots on the form
pub const MAX_SETS: usize = 5;

/// Yes / no / unanswered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TieBreakChoice {
    #[default]
    Unset,
    Yes,
    No,
}

impl TieBreakChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            TieBreakChoice::Unset => "",
            TieBreakChoice::Yes => "yes",
            TieBreakChoice::No => "no",
        }
    }

    pub fn is_yes(&self) -> bool {
        *self == TieBreakChoice::Yes
    }
}

// Unknown values degrade to Unset so a legacy row never fails to load.
impl From<String> for TieBreakChoice {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "yes" | "true" => TieBreakChoice::Yes,
            "no" | "false" => TieBreakChoice::No,
            _ => TieBreakChoice::Unset,
        }
    }
}

impl From<TieBreakChoice> for String {
    fn from(c: TieBreakChoice) -> Self {
        c.as_str().to_string()
    }
}

/// Accepts strings, numbers, booleans and null for a free-text field.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    })
}

fn lenient_choice<'de, D>(deserializer: D) -> Result<TieBreakChoice, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_string(deserializer).map(TieBreakChoice::from)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PredictionOptions {
    #[serde(deserialize_with = "lenient_string")]
    pub winner: String,
    /// `<winnerSets>-<loserSets>`
    #[serde(deserialize_with = "lenient_string")]
    pub match_result: String,

    #[serde(deserialize_with = "lenient_string")]
    pub set1_score: String,
    #[serde(deserialize_with = "lenient_string")]
    pub set2_score: String,
    #[serde(deserialize_with = "lenient_string")]
    pub set3_score: String,
    #[serde(deserialize_with = "lenient_string")]
    pub set4_score: String,
    #[serde(deserialize_with = "lenient_string")]
    pub set5_score: String,

    #[serde(deserialize_with = "lenient_choice")]
    pub set1_tie_break: TieBreakChoice,
    #[serde(deserialize_with = "lenient_string")]
    pub set1_tie_break_score: String,
    #[serde(deserialize_with = "lenient_choice")]
    pub set2_tie_break: TieBreakChoice,
    #[serde(deserialize_with = "lenient_string")]
    pub set2_tie_break_score: String,

    #[serde(deserialize_with = "lenient_choice")]
    pub super_tie_break: TieBreakChoice,
    #[serde(deserialize_with = "lenient_string")]
    pub super_tie_break_score: String,
    #[serde(deserialize_with = "lenient_string")]
    pub super_tie_break_winner: String,

    #[serde(deserialize_with = "lenient_string")]
    pub tie_break: String,
    #[serde(deserialize_with = "lenient_string")]
    pub total_games: String,
    #[serde(deserialize_with = "lenient_string")]
    pub aces_leader: String,
    #[serde(deserialize_with = "lenient_string")]
    pub double_faults: String,
    #[serde(deserialize_with = "lenient_string")]
    pub break_points: String,

    // Derived from winner + result by `apply_set_winners`; read back from
    // stored JSON but never counted as user predictions unless asked.
    #[serde(deserialize_with = "lenient_string")]
    pub set1_winner: String,
    #[serde(deserialize_with = "lenient_string")]
    pub set2_winner: String,
    #[serde(deserialize_with = "lenient_string")]
    pub set3_winner: String,
    #[serde(deserialize_with = "lenient_string")]
    pub set4_winner: String,
    #[serde(deserialize_with = "lenient_string")]
    pub set5_winner: String,
}

impl PredictionOptions {
    pub fn new(winner: impl Into<String>, match_result: impl Into<String>) -> Self {
        Self {
            winner: winner.into(),
            match_result: match_result.into(),
            ..Self::default()
        }
    }

    /// Every user-entered field as `(name, value)`.
    pub fn fields(&self) -> [(&'static str, &str); 19] {
        [
            ("winner", self.winner.as_str()),
            ("matchResult", self.match_result.as_str()),
            ("set1Score", self.set1_score.as_str()),
            ("set2Score", self.set2_score.as_str()),
            ("set3Score", self.set3_score.as_str()),
            ("set4Score", self.set4_score.as_str()),
            ("set5Score", self.set5_score.as_str()),
            ("set1TieBreak", self.set1_tie_break.as_str()),
            ("set1TieBreakScore", self.set1_tie_break_score.as_str()),
            ("set2TieBreak", self.set2_tie_break.as_str()),
            ("set2TieBreakScore", self.set2_tie_break_score.as_str()),
            ("superTieBreak", self.super_tie_break.as_str()),
            ("superTieBreakScore", self.super_tie_break_score.as_str()),
            ("superTieBreakWinner", self.super_tie_break_winner.as_str()),
            ("tieBreak", self.tie_break.as_str()),
            ("totalGames", self.total_games.as_str()),
            ("acesLeader", self.aces_leader.as_str()),
            ("doubleFaults", self.double_faults.as_str()),
            ("breakPoints", self.break_points.as_str()),
        ]
    }

    /// Derived set winners as `(name, value)`.
    pub fn derived_fields(&self) -> [(&'static str, &str); MAX_SETS] {
        [
            ("set1Winner", self.set1_winner.as_str()),
            ("set2Winner", self.set2_winner.as_str()),
            ("set3Winner", self.set3_winner.as_str()),
            ("set4Winner", self.set4_winner.as_str()),
            ("set5Winner", self.set5_winner.as_str()),
        ]
    }

    /// Populated user-entered fields. Drives the multiplier bonus.
    pub fn prediction_count(&self) -> usize {
        self.fields().iter().filter(|(_, v)| !v.is_empty()).count()
    }

    /// Populated fields, optionally including derived set winners.
    pub fn populated_field_count(&self, include_derived: bool) -> usize {
        let derived = if include_derived {
            self.derived_fields()
                .iter()
                .filter(|(_, v)| !v.is_empty())
                .count()
        } else {
            0
        };
        self.prediction_count() + derived
    }

    pub fn has_predictions(&self) -> bool {
        self.fields().iter().any(|(_, v)| !v.is_empty())
    }

    pub fn set_scores(&self) -> [&str; MAX_SETS] {
        [
            self.set1_score.as_str(),
            self.set2_score.as_str(),
            self.set3_score.as_str(),
            self.set4_score.as_str(),
            self.set5_score.as_str(),
        ]
    }

    pub fn set_score_mut(&mut self, set: usize) -> Option<&mut String> {
        match set {
            1 => Some(&mut self.set1_score),
            2 => Some(&mut self.set2_score),
            3 => Some(&mut self.set3_score),
            4 => Some(&mut self.set4_score),
            5 => Some(&mut self.set5_score),
            _ => None,
        }
    }

    pub fn set_winner_mut(&mut self, set: usize) -> Option<&mut String> {
        match set {
            1 => Some(&mut self.set1_winner),
            2 => Some(&mut self.set2_winner),
            3 => Some(&mut self.set3_winner),
            4 => Some(&mut self.set4_winner),
            5 => Some(&mut self.set5_winner),
            _ => None,
        }
    }

    /// Recompute the derived set-winner slots from winner + result.
    pub fn apply_set_winners(&mut self, player1: &str, player2: &str) -> Result<(), PredictionError> {
        let mut winners = sets::set_winners(&self.match_result, &self.winner, player1, player2)?
            .into_iter();
        for set in 1..=MAX_SETS {
            if let Some(slot) = self.set_winner_mut(set) {
                *slot = winners.next().unwrap_or_default();
            }
        }
        Ok(())
    }

    /// Whether the super tie-break fields apply to this result.
    pub fn super_tie_break_applies(&self, format: MatchFormat) -> bool {
        format == MatchFormat::AmateurSuperTiebreak
            && MatchScore::parse(&self.match_result)
                .map(|score| score.is_deciding_third())
                .unwrap_or(false)
    }

    /// Clear fields that do not apply to the chosen result: set scores past
    /// the number of regular sets, tie-break scores whose flag is not "yes",
    /// and super tie-break fields outside an amateur deciding set.
    pub fn prune_inapplicable(&mut self, format: MatchFormat) -> Result<(), PredictionError> {
        let shown = sets::sets_to_show(&self.match_result, format)? as usize;
        for set in (shown + 1)..=MAX_SETS {
            if let Some(score) = self.set_score_mut(set) {
                score.clear();
            }
        }

        if !self.set1_tie_break.is_yes() {
            self.set1_tie_break_score.clear();
        }
        if !self.set2_tie_break.is_yes() {
            self.set2_tie_break_score.clear();
        }

        if !self.super_tie_break_applies(format) {
            self.super_tie_break = TieBreakChoice::Unset;
            self.super_tie_break_score.clear();
            self.super_tie_break_winner.clear();
        }
        Ok(())
    }
}
