//! Payout Multiplier
//! Mission: price a prediction from the backed player's odds plus a bonus for
//! predicting more of the match
//!
//! multiplier = winner_odds + bonus(prediction_count), rounded to 2 decimals.
//! The multiplier is fixed when a wager is created and never re-derived.

use crate::error::PredictionError;
use serde::{Deserialize, Serialize};

/// Decimal (European) odds for one side of a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerOdds {
    pub name: String,
    pub odds: f64,
}

impl PlayerOdds {
    pub fn new(name: impl Into<String>, odds: f64) -> Self {
        Self {
            name: name.into(),
            odds,
        }
    }

    /// Odds must be finite and >= 1.0 to be used for a payout.
    pub fn validate(&self) -> Result<(), PredictionError> {
        if !self.odds.is_finite() || self.odds < 1.0 {
            return Err(PredictionError::InvalidOdds {
                name: self.name.clone(),
                odds: self.odds,
            });
        }
        Ok(())
    }
}

/// Bonus granted once a prediction reaches `min_predictions` populated fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusTier {
    pub min_predictions: usize,
    pub bonus: f64,
}

/// Bonus schedule; the highest reached tier applies, tiers do not stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplierConfig {
    #[serde(default = "default_tiers")]
    pub tiers: Vec<BonusTier>,
}

fn default_tiers() -> Vec<BonusTier> {
    vec![
        BonusTier { min_predictions: 8, bonus: 0.30 },
        BonusTier { min_predictions: 6, bonus: 0.20 },
        BonusTier { min_predictions: 4, bonus: 0.15 },
        BonusTier { min_predictions: 2, bonus: 0.10 },
    ]
}

impl Default for MultiplierConfig {
    fn default() -> Self {
        Self {
            tiers: default_tiers(),
        }
    }
}

impl MultiplierConfig {
    /// Bonus for a prediction with `prediction_count` populated fields
    pub fn bonus_for(&self, prediction_count: usize) -> f64 {
        self.tiers
            .iter()
            .filter(|tier| prediction_count >= tier.min_predictions)
            .max_by_key(|tier| tier.min_predictions)
            .map_or(0.0, |tier| tier.bonus)
    }

    /// Reject schedules that would pay less for predicting more.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut sorted: Vec<&BonusTier> = self.tiers.iter().collect();
        sorted.sort_by_key(|tier| tier.min_predictions);

        let mut previous = 0.0;
        for tier in sorted {
            if !tier.bonus.is_finite() || tier.bonus < 0.0 {
                anyhow::bail!(
                    "bonus for {} predictions must be a non-negative number",
                    tier.min_predictions
                );
            }
            if tier.bonus < previous {
                anyhow::bail!(
                    "bonus for {} predictions ({}) is lower than a smaller tier ({})",
                    tier.min_predictions,
                    tier.bonus,
                    previous
                );
            }
            previous = tier.bonus;
        }
        Ok(())
    }
}

/// Round half up to 2 decimal places.
///
/// Scaled values sitting one ulp under a `.5` boundary (1.005 * 100 is
/// 100.49999999999999) are nudged up by a relative epsilon first.
pub fn round2(value: f64) -> f64 {
    (value * 100.0 * (1.0 + f64::EPSILON)).round() / 100.0
}

/// Multiplier with the default bonus schedule.
///
/// Odds are not validated here; callers reject odds < 1.0 upstream
/// (see [`PlayerOdds::validate`]).
pub fn calculate_multiplier(
    selected_winner: &str,
    player1: &PlayerOdds,
    player2: &PlayerOdds,
    prediction_count: usize,
) -> Result<f64, PredictionError> {
    calculate_multiplier_with(
        &MultiplierConfig::default(),
        selected_winner,
        player1,
        player2,
        prediction_count,
    )
}

pub fn calculate_multiplier_with(
    config: &MultiplierConfig,
    selected_winner: &str,
    player1: &PlayerOdds,
    player2: &PlayerOdds,
    prediction_count: usize,
) -> Result<f64, PredictionError> {
    let winner_odds = if selected_winner == player1.name {
        player1.odds
    } else if selected_winner == player2.name {
        player2.odds
    } else {
        return Err(PredictionError::UnknownPlayer(selected_winner.to_string()));
    };

    Ok(round2(winner_odds + config.bonus_for(prediction_count)))
}

/// One row of the multiplier preview shown on the betting slip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplierOption {
    pub value: f64,
    pub label: String,
    pub description: String,
}

/// Prediction counts previewed on the betting slip
pub const PREVIEW_COUNTS: [usize; 5] = [1, 2, 4, 6, 8];

/// Preview of the multiplier at 1, 2, 4, 6 and 8 predictions, based on the
/// shorter of the two odds. Display only; never use it to price a wager.
pub fn multiplier_options(player1: &PlayerOdds, player2: &PlayerOdds) -> Vec<MultiplierOption> {
    multiplier_options_with(&MultiplierConfig::default(), player1, player2)
}

pub fn multiplier_options_with(
    config: &MultiplierConfig,
    player1: &PlayerOdds,
    player2: &PlayerOdds,
) -> Vec<MultiplierOption> {
    let base = player1.odds.min(player2.odds);

    PREVIEW_COUNTS
        .iter()
        .map(|&count| {
            let bonus = config.bonus_for(count);
            let value = round2(base + bonus);
            let description = if bonus > 0.0 {
                format!("{:.2} base odds + {:.2} bonus", base, bonus)
            } else {
                format!("{:.2} base odds", base)
            };
            MultiplierOption {
                value,
                label: if count == 1 {
                    "1 prediction".to_string()
                } else {
                    format!("{}+ predictions", count)
                },
                description,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn players() -> (PlayerOdds, PlayerOdds) {
        (PlayerOdds::new("A", 1.85), PlayerOdds::new("B", 2.10))
    }

    #[test]
    fn test_worked_example() {
        let (a, b) = players();
        assert_eq!(calculate_multiplier("A", &a, &b, 5).unwrap(), 2.00);
        assert_eq!(calculate_multiplier("B", &a, &b, 8).unwrap(), 2.40);
        assert_eq!(calculate_multiplier("B", &a, &b, 1).unwrap(), 2.10);
        assert_eq!(calculate_multiplier("A", &a, &b, 2).unwrap(), 1.95);
    }

    #[test]
    fn test_idempotent() {
        let (a, b) = players();
        let first = calculate_multiplier("B", &a, &b, 6).unwrap();
        let second = calculate_multiplier("B", &a, &b, 6).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_monotonic_in_prediction_count() {
        let (a, b) = players();
        let mut previous = 0.0;
        for count in 0..=19 {
            let m = calculate_multiplier("A", &a, &b, count).unwrap();
            assert!(m >= previous, "count {} gave {} < {}", count, m, previous);
            previous = m;
        }
    }

    #[test]
    fn test_unknown_player() {
        let (a, b) = players();
        assert_eq!(
            calculate_multiplier("C", &a, &b, 3),
            Err(PredictionError::UnknownPlayer("C".to_string()))
        );
    }

    #[test]
    fn test_rounding_half_up() {
        assert_eq!(round2(2.125), 2.13);
        assert_eq!(round2(1.994), 1.99);
        assert_eq!(round2(1.85 + 0.15), 2.0);
        assert_eq!(round2(1.005), 1.01);
        assert_eq!(round2(1.145), 1.15);
        assert_eq!(round2(1.85 + 0.10), 1.95);
    }

    #[test]
    fn test_odds_validation() {
        assert!(PlayerOdds::new("A", 1.0).validate().is_ok());
        assert!(PlayerOdds::new("A", 0.95).validate().is_err());
        assert!(PlayerOdds::new("A", f64::NAN).validate().is_err());
    }

    #[test]
    fn test_multiplier_options_preview() {
        let (a, b) = players();
        let options = multiplier_options(&a, &b);
        let values: Vec<f64> = options.iter().map(|o| o.value).collect();
        assert_eq!(values, vec![1.85, 1.95, 2.00, 2.05, 2.15]);
        assert_eq!(options[0].label, "1 prediction");
        assert_eq!(options[4].label, "8+ predictions");
        assert_eq!(options[0].description, "1.85 base odds");
        assert_eq!(options[2].description, "1.85 base odds + 0.15 bonus");
    }

    #[test]
    fn test_config_validation() {
        assert!(MultiplierConfig::default().validate().is_ok());

        let decreasing = MultiplierConfig {
            tiers: vec![
                BonusTier { min_predictions: 2, bonus: 0.2 },
                BonusTier { min_predictions: 4, bonus: 0.1 },
            ],
        };
        assert!(decreasing.validate().is_err());

        let negative = MultiplierConfig {
            tiers: vec![BonusTier { min_predictions: 2, bonus: -0.1 }],
        };
        assert!(negative.validate().is_err());
    }
}
