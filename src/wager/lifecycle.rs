//! Wager lifecycle
//!
//! active -> won | lost | cancelled. Resolved wagers are immutable.

use crate::error::PredictionError;
use crate::prediction::Prediction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WagerStatus {
    Active,
    Won,
    Lost,
    Cancelled,
}

impl WagerStatus {
    pub fn as_str(&self) -> &str {
        match self {
            WagerStatus::Active => "active",
            WagerStatus::Won => "won",
            WagerStatus::Lost => "lost",
            WagerStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(WagerStatus::Active),
            "won" => Some(WagerStatus::Won),
            "lost" => Some(WagerStatus::Lost),
            "cancelled" | "canceled" => Some(WagerStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self != WagerStatus::Active
    }
}

/// Outcome decided by the settlement process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementOutcome {
    Won,
    Lost,
}

/// Authoritative result of a finished match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub match_id: String,
    pub winner: String,
    /// e.g. "2-1"
    pub result: String,
}

/// Decides whether a stored prediction won against a match outcome.
///
/// Result matching is match-specific and supplied by the settlement process.
pub trait SettlementClassifier: Send + Sync {
    fn classify(&self, outcome: &MatchOutcome, prediction: &Prediction) -> SettlementOutcome;
}

/// Wins when the predicted match winner is the actual winner.
#[derive(Debug, Clone, Copy, Default)]
pub struct WinnerClassifier;

impl SettlementClassifier for WinnerClassifier {
    fn classify(&self, outcome: &MatchOutcome, prediction: &Prediction) -> SettlementOutcome {
        let predicted = prediction.normalize();
        if !predicted.winner.is_empty()
            && predicted.winner.trim().eq_ignore_ascii_case(outcome.winner.trim())
        {
            SettlementOutcome::Won
        } else {
            SettlementOutcome::Lost
        }
    }
}

/// Coins to move back into the user's wallet after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletCredit {
    pub wager_id: Uuid,
    pub status: WagerStatus,
    pub amount: u64,
}

/// Persisted wager ("bet")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wager {
    pub id: Uuid,
    pub user_id: String,
    pub match_id: Option<String>,
    /// Canonical prediction string, or legacy free text for old rows
    pub prediction: String,
    pub bet_amount: u64,
    pub multiplier: f64,
    pub potential_winnings: u64,
    pub winnings_paid: u64,
    pub status: WagerStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// round(bet_amount * multiplier)
pub fn potential_winnings(bet_amount: u64, multiplier: f64) -> u64 {
    (bet_amount as f64 * multiplier).round() as u64
}

impl Wager {
    pub fn new(
        user_id: impl Into<String>,
        match_id: Option<String>,
        prediction: String,
        bet_amount: u64,
        multiplier: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            match_id,
            prediction,
            bet_amount,
            multiplier,
            potential_winnings: potential_winnings(bet_amount, multiplier),
            winnings_paid: 0,
            status: WagerStatus::Active,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == WagerStatus::Active
    }

    /// Structured view of the stored prediction
    pub fn parsed_prediction(&self) -> Prediction {
        Prediction::from_stored(&self.prediction)
    }

    fn ensure_active(&self) -> Result<(), PredictionError> {
        if self.status.is_terminal() {
            return Err(PredictionError::ImmutableWager(self.id));
        }
        Ok(())
    }

    /// Resolve as won or lost. A win pays `potential_winnings`.
    pub fn settle(
        &mut self,
        outcome: SettlementOutcome,
        now: DateTime<Utc>,
    ) -> Result<WalletCredit, PredictionError> {
        self.ensure_active()?;

        let (status, paid) = match outcome {
            SettlementOutcome::Won => (WagerStatus::Won, self.potential_winnings),
            SettlementOutcome::Lost => (WagerStatus::Lost, 0),
        };
        self.status = status;
        self.winnings_paid = paid;
        self.resolved_at = Some(now);

        Ok(WalletCredit {
            wager_id: self.id,
            status,
            amount: paid,
        })
    }

    /// Void the wager: full refund of `bet_amount`, no winnings.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<WalletCredit, PredictionError> {
        self.ensure_active()?;

        self.status = WagerStatus::Cancelled;
        self.winnings_paid = 0;
        self.resolved_at = Some(now);

        Ok(WalletCredit {
            wager_id: self.id,
            status: WagerStatus::Cancelled,
            amount: self.bet_amount,
        })
    }
}
