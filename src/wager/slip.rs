//! Betting slip
//!
//! Validates a submission against the match and prices it. Everything here
//! runs before any balance is touched, so a rejected slip leaves no state.

use crate::config::EngineConfig;
use crate::error::PredictionError;
use crate::odds::{calculate_multiplier_with, PlayerOdds};
use crate::prediction::{build_prediction_text, MatchFormat, PredictionOptions};
use crate::wager::lifecycle::Wager;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Upcoming,
    Live,
    Finished,
    Cancelled,
}

/// Match as supplied by the match provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub id: String,
    pub player1: PlayerOdds,
    pub player2: PlayerOdds,
    pub status: MatchStatus,
    pub is_locked: bool,
    #[serde(default)]
    pub format: Option<MatchFormat>,
}

impl MatchSnapshot {
    /// Open for predictions: not locked and not started
    pub fn accepts_wagers(&self) -> bool {
        !self.is_locked && self.status == MatchStatus::Upcoming
    }

    pub fn title(&self) -> String {
        format!("{} vs {}", self.player1.name, self.player2.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WagerRequest {
    pub user_id: String,
    pub prediction: PredictionOptions,
    pub bet_amount: u64,
}

/// Validate and price a submission into an active, not yet persisted wager.
///
/// Inapplicable fields are pruned and set winners derived before counting,
/// so stale form state cannot inflate the bonus.
pub fn prepare_wager(
    request: &WagerRequest,
    snapshot: &MatchSnapshot,
    config: &EngineConfig,
) -> Result<Wager, PredictionError> {
    if !snapshot.accepts_wagers() {
        return Err(PredictionError::MatchLocked(snapshot.id.clone()));
    }

    let limits = &config.betting;
    if !limits.allows(request.bet_amount) {
        return Err(PredictionError::InvalidBetAmount {
            amount: request.bet_amount,
            min: limits.min_bet,
            max: limits.max_bet,
        });
    }

    snapshot.player1.validate()?;
    snapshot.player2.validate()?;

    let format = snapshot.format.unwrap_or(config.default_format);
    let mut prediction = request.prediction.clone();
    prediction.prune_inapplicable(format)?;
    if !prediction.has_predictions() {
        return Err(PredictionError::EmptyPrediction);
    }
    prediction.apply_set_winners(&snapshot.player1.name, &snapshot.player2.name)?;

    let count = prediction.populated_field_count(config.count_derived_fields);
    let multiplier = calculate_multiplier_with(
        &config.multiplier,
        &prediction.winner,
        &snapshot.player1,
        &snapshot.player2,
        count,
    )?;

    Ok(Wager::new(
        request.user_id.clone(),
        Some(snapshot.id.clone()),
        build_prediction_text(&prediction),
        request.bet_amount,
        multiplier,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::TieBreakChoice;
    use crate::wager::lifecycle::WagerStatus;

    fn snapshot() -> MatchSnapshot {
        MatchSnapshot {
            id: "m-42".to_string(),
            player1: PlayerOdds::new("Sinner", 1.85),
            player2: PlayerOdds::new("Alcaraz", 2.10),
            status: MatchStatus::Upcoming,
            is_locked: false,
            format: None,
        }
    }

    fn request(prediction: PredictionOptions) -> WagerRequest {
        WagerRequest {
            user_id: "u-1".to_string(),
            prediction,
            bet_amount: 100,
        }
    }

    #[test]
    fn test_prepare_prices_with_selected_winner() {
        let mut prediction = PredictionOptions::new("Alcaraz", "2-1");
        prediction.set1_score = "6-4".to_string();
        prediction.set2_score = "4-6".to_string();
        prediction.set3_score = "6-3".to_string();

        let wager = prepare_wager(&request(prediction), &snapshot(), &EngineConfig::default())
            .unwrap();

        // 5 fields -> +0.15 on Alcaraz's 2.10
        assert_eq!(wager.multiplier, 2.25);
        assert_eq!(wager.potential_winnings, 225);
        assert_eq!(wager.status, WagerStatus::Active);
        assert_eq!(wager.match_id.as_deref(), Some("m-42"));
        assert_eq!(
            wager.prediction,
            "Winner: Alcaraz | Result: 2-1 | Sets: 6-4, 4-6, 6-3"
        );
    }

    #[test]
    fn test_locked_or_started_match_rejected() {
        let prediction = PredictionOptions::new("Sinner", "2-0");

        let mut locked = snapshot();
        locked.is_locked = true;
        assert_eq!(
            prepare_wager(&request(prediction.clone()), &locked, &EngineConfig::default())
                .unwrap_err(),
            PredictionError::MatchLocked("m-42".to_string())
        );

        let mut live = snapshot();
        live.status = MatchStatus::Live;
        assert!(prepare_wager(&request(prediction), &live, &EngineConfig::default()).is_err());
    }

    #[test]
    fn test_empty_prediction_rejected() {
        let err = prepare_wager(
            &request(PredictionOptions::default()),
            &snapshot(),
            &EngineConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, PredictionError::EmptyPrediction);
    }

    #[test]
    fn test_bet_amount_limits() {
        let mut req = request(PredictionOptions::new("Sinner", "2-0"));
        req.bet_amount = 0;
        let err = prepare_wager(&req, &snapshot(), &EngineConfig::default()).unwrap_err();
        assert_eq!(err.reason(), "invalid_bet_amount");
    }

    #[test]
    fn test_invalid_odds_rejected() {
        let mut snap = snapshot();
        snap.player2.odds = 0.9;
        let err = prepare_wager(
            &request(PredictionOptions::new("Sinner", "2-0")),
            &snap,
            &EngineConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.reason(), "invalid_odds");
    }

    #[test]
    fn test_stale_fields_do_not_inflate_bonus() {
        let mut prediction = PredictionOptions::new("Sinner", "2-0");
        // Left over from an earlier "2-1" selection
        prediction.set3_score = "6-2".to_string();
        prediction.set1_tie_break = TieBreakChoice::No;
        prediction.set1_tie_break_score = "7-4".to_string();

        let wager = prepare_wager(&request(prediction), &snapshot(), &EngineConfig::default())
            .unwrap();

        // winner, result, set1TieBreak -> 3 fields -> +0.10
        assert_eq!(wager.multiplier, 1.95);
        assert_eq!(wager.prediction, "Winner: Sinner | Result: 2-0 | Set 1 TB: no");
    }

    #[test]
    fn test_counting_derived_fields_is_opt_in() {
        let prediction = PredictionOptions::new("Sinner", "2-0");
        let mut config = EngineConfig::default();

        let plain = prepare_wager(&request(prediction.clone()), &snapshot(), &config).unwrap();
        assert_eq!(plain.multiplier, 1.95);

        config.count_derived_fields = true;
        let inflated = prepare_wager(&request(prediction), &snapshot(), &config).unwrap();
        // 2 user fields + 2 set winners -> +0.15
        assert_eq!(inflated.multiplier, 2.00);
    }

    #[test]
    fn test_unknown_winner_rejected() {
        let err = prepare_wager(
            &request(PredictionOptions::new("Federer", "2-0")),
            &snapshot(),
            &EngineConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, PredictionError::UnknownPlayer("Federer".to_string()));
    }
}
