//! Prediction Serializer
//!
//! Canonical storage format is a `" | "`-joined list of labelled segments in
//! a fixed order:
//!
//! ```text
//! Winner: Sinner | Result: 2-1 | Sets: 6-4, 3-6, 7-6 | Set 1 TB: no | Total Games: 32
//! ```
//!
//! Reading is total: JSON objects from older rows, the canonical string and
//! arbitrary free text are all accepted, extracting whatever can be found.

use crate::prediction::options::{PredictionOptions, TieBreakChoice};
use serde::{Deserialize, Serialize};

pub const SEPARATOR: &str = " | ";

const WINNER: &str = "Winner";
const RESULT: &str = "Result";
const SETS: &str = "Sets";
const SET1_TB: &str = "Set 1 TB";
const SET1_TB_SCORE: &str = "Set 1 TB Score";
const SET2_TB: &str = "Set 2 TB";
const SET2_TB_SCORE: &str = "Set 2 TB Score";
const SUPER_TB_WINNER: &str = "Super TB Winner";
const SUPER_TB_SCORE: &str = "Super TB Score";
const TIE_BREAK: &str = "Tie-break";
const TOTAL_GAMES: &str = "Total Games";
const MOST_ACES: &str = "Most Aces";
const DOUBLE_FAULTS: &str = "Double Faults";
const BREAK_POINTS: &str = "Break Points";

/// Build the canonical storage/display string.
pub fn build_prediction_text(opts: &PredictionOptions) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut push = |label: &str, value: &str| {
        if !value.is_empty() {
            parts.push(format!("{}: {}", label, value));
        }
    };

    push(WINNER, &opts.winner);
    push(RESULT, &opts.match_result);

    let sets = opts
        .set_scores()
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ");
    push(SETS, &sets);

    push(SET1_TB, opts.set1_tie_break.as_str());
    if opts.set1_tie_break.is_yes() {
        push(SET1_TB_SCORE, &opts.set1_tie_break_score);
    }
    push(SET2_TB, opts.set2_tie_break.as_str());
    if opts.set2_tie_break.is_yes() {
        push(SET2_TB_SCORE, &opts.set2_tie_break_score);
    }

    if !opts.super_tie_break_winner.is_empty() {
        push(SUPER_TB_WINNER, &opts.super_tie_break_winner);
        push(SUPER_TB_SCORE, &opts.super_tie_break_score);
    }

    push(TIE_BREAK, &opts.tie_break);
    push(TOTAL_GAMES, &opts.total_games);
    push(MOST_ACES, &opts.aces_leader);
    push(DOUBLE_FAULTS, &opts.double_faults);
    push(BREAK_POINTS, &opts.break_points);

    parts.join(SEPARATOR)
}

/// Value following `label:` anywhere in `text`, up to the next `|` or the end.
///
/// Occurrences that are the tail of a longer label (`Super TB Winner:` when
/// looking for `Winner:`) are skipped.
pub fn extract_labelled(text: &str, label: &str) -> Option<String> {
    let needle = format!("{}:", label);
    let mut from = 0;
    while let Some(pos) = text[from..].find(&needle) {
        let start = from + pos;
        if !text[..start].trim_end().ends_with("TB") {
            let rest = &text[start + needle.len()..];
            let value = rest.split('|').next().unwrap_or("").trim();
            return (!value.is_empty()).then(|| value.to_string());
        }
        from = start + needle.len();
    }
    None
}

/// Parse a pipe-delimited prediction. Unknown segments are ignored.
pub fn parse_prediction_text(text: &str) -> PredictionOptions {
    let mut opts = PredictionOptions::default();

    for segment in text.split('|') {
        let Some((label, value)) = segment.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        match label.trim() {
            WINNER => opts.winner = value.to_string(),
            RESULT => opts.match_result = value.to_string(),
            SETS => {
                let scores = value.split(',').map(str::trim).filter(|s| !s.is_empty());
                for (set, score) in (1..).zip(scores) {
                    match opts.set_score_mut(set) {
                        Some(slot) => *slot = score.to_string(),
                        None => break,
                    }
                }
            }
            SET1_TB => opts.set1_tie_break = TieBreakChoice::from(value.to_string()),
            SET1_TB_SCORE => opts.set1_tie_break_score = value.to_string(),
            SET2_TB => opts.set2_tie_break = TieBreakChoice::from(value.to_string()),
            SET2_TB_SCORE => opts.set2_tie_break_score = value.to_string(),
            SUPER_TB_WINNER => {
                opts.super_tie_break = TieBreakChoice::Yes;
                opts.super_tie_break_winner = value.to_string();
            }
            SUPER_TB_SCORE => opts.super_tie_break_score = value.to_string(),
            TIE_BREAK => opts.tie_break = value.to_string(),
            TOTAL_GAMES => opts.total_games = value.to_string(),
            MOST_ACES => opts.aces_leader = value.to_string(),
            DOUBLE_FAULTS => opts.double_faults = value.to_string(),
            BREAK_POINTS => opts.break_points = value.to_string(),
            _ => {}
        }
    }

    // Free text with the labels buried mid-sentence
    if opts.winner.is_empty() {
        if let Some(winner) = extract_labelled(text, WINNER) {
            opts.winner = winner;
        }
    }
    if opts.match_result.is_empty() {
        if let Some(result) = extract_labelled(text, RESULT) {
            opts.match_result = result;
        }
    }

    opts
}

/// A stored prediction: structured going forward, raw text for rows that
/// could not be recognised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Prediction {
    Structured(PredictionOptions),
    LegacyText(String),
}

impl Prediction {
    /// Classify a stored `prediction` column. Never fails.
    pub fn from_stored(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with('{') {
            if let Ok(opts) = serde_json::from_str::<PredictionOptions>(trimmed) {
                return Prediction::Structured(opts);
            }
        }

        if is_canonical(trimmed) {
            return Prediction::Structured(parse_prediction_text(trimmed));
        }
        Prediction::LegacyText(raw.to_string())
    }

    /// Best-effort structured view.
    pub fn normalize(&self) -> PredictionOptions {
        match self {
            Prediction::Structured(opts) => opts.clone(),
            Prediction::LegacyText(text) => parse_prediction_text(text),
        }
    }

    /// Text written to the `prediction` column.
    pub fn to_storage(&self) -> String {
        match self {
            Prediction::Structured(opts) => build_prediction_text(opts),
            Prediction::LegacyText(text) => text.clone(),
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Prediction::LegacyText(_))
    }
}

impl From<PredictionOptions> for Prediction {
    fn from(opts: PredictionOptions) -> Self {
        Prediction::Structured(opts)
    }
}

fn is_canonical(text: &str) -> bool {
    const LABELS: [&str; 14] = [
        WINNER,
        RESULT,
        SETS,
        SET1_TB,
        SET1_TB_SCORE,
        SET2_TB,
        SET2_TB_SCORE,
        SUPER_TB_WINNER,
        SUPER_TB_SCORE,
        TIE_BREAK,
        TOTAL_GAMES,
        MOST_ACES,
        DOUBLE_FAULTS,
        BREAK_POINTS,
    ];

    !text.is_empty()
        && text.split('|').all(|segment| {
            segment
                .split_once(':')
                .map_or(false, |(label, value)| {
                    LABELS.contains(&label.trim()) && !value.trim().is_empty()
                })
        })
}
