//! Set applicability and derived set winners.

use crate::error::PredictionError;
use crate::prediction::options::MAX_SETS;
use serde::{Deserialize, Serialize};

/// Scoring format of a match
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchFormat {
    #[default]
    Standard,
    /// Amateur format: a 1-1 match is decided by a super tie-break instead of a 3rd set
    AmateurSuperTiebreak,
}

impl MatchFormat {
    pub fn as_str(&self) -> &str {
        match self {
            MatchFormat::Standard => "standard",
            MatchFormat::AmateurSuperTiebreak => "amateur_super_tiebreak",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Some(MatchFormat::Standard),
            "amateur" | "amateur_super_tiebreak" => Some(MatchFormat::AmateurSuperTiebreak),
            _ => None,
        }
    }
}

/// Parsed `<a>-<b>` match result, at most five sets in total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchScore {
    pub first: u32,
    pub second: u32,
}

impl MatchScore {
    pub fn parse(raw: &str) -> Result<Self, PredictionError> {
        let invalid = || PredictionError::InvalidResult(raw.to_string());

        let (a, b) = raw.trim().split_once('-').ok_or_else(invalid)?;
        let (a, b) = (a.trim(), b.trim());
        if a.is_empty()
            || b.is_empty()
            || !a.bytes().all(|c| c.is_ascii_digit())
            || !b.bytes().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let score = Self {
            first: a.parse().map_err(|_| invalid())?,
            second: b.parse().map_err(|_| invalid())?,
        };
        match score.first.checked_add(score.second) {
            Some(total) if total as usize <= MAX_SETS => Ok(score),
            _ => Err(invalid()),
        }
    }

    pub fn total_sets(&self) -> u32 {
        self.first + self.second
    }

    /// Sets won by the match winner. Results are written winner-first
    /// ("2-1") but loser-first entries ("1-2") are accepted too.
    pub fn winner_sets(&self) -> u32 {
        self.first.max(self.second)
    }

    pub fn loser_sets(&self) -> u32 {
        self.first.min(self.second)
    }

    /// 2-1 or 1-2
    pub fn is_deciding_third(&self) -> bool {
        self.winner_sets() == 2 && self.loser_sets() == 1
    }
}

/// Number of regular set scores worth asking for given a result.
///
/// Empty result yields 0. In amateur format a 2-1/1-2 result only has two
/// regular sets; the decider is a super tie-break.
pub fn sets_to_show(match_result: &str, format: MatchFormat) -> Result<u32, PredictionError> {
    if match_result.trim().is_empty() {
        return Ok(0);
    }

    let score = MatchScore::parse(match_result)?;
    if format == MatchFormat::AmateurSuperTiebreak && score.is_deciding_third() {
        return Ok(2);
    }
    Ok(score.total_sets())
}

/// Per-set winners, winner's sets listed first then the loser's.
///
/// This is a display aggregate, not the chronological order of sets.
/// Returns an empty list while either the result or the winner is unset.
pub fn set_winners(
    match_result: &str,
    winner: &str,
    player1: &str,
    player2: &str,
) -> Result<Vec<String>, PredictionError> {
    if match_result.trim().is_empty() || winner.trim().is_empty() {
        return Ok(Vec::new());
    }

    let score = MatchScore::parse(match_result)?;
    let loser = if winner == player1 {
        player2
    } else if winner == player2 {
        player1
    } else {
        return Err(PredictionError::UnknownPlayer(winner.to_string()));
    };

    let mut winners = Vec::with_capacity(score.total_sets() as usize);
    winners.extend((0..score.winner_sets()).map(|_| winner.to_string()));
    winners.extend((0..score.loser_sets()).map(|_| loser.to_string()));
    Ok(winners)
}
