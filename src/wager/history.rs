//! Wager history views: active/resolved split, per-row display items and
//! summary totals.

use crate::prediction::PredictionOptions;
use crate::wager::lifecycle::{Wager, WagerStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row of a user's bet history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetHistoryItem {
    pub id: Uuid,
    pub match_title: String,
    /// `YYYY-MM-DD` (UTC)
    pub date: String,
    /// `HH:MM` (UTC)
    pub time: String,
    pub prediction: PredictionOptions,
    pub status: WagerStatus,
    pub points_earned: u64,
    pub bet_amount: u64,
    pub potential_winnings: u64,
    pub multiplier: f64,
}

impl BetHistoryItem {
    pub fn from_wager(wager: &Wager, match_title: impl Into<String>) -> Self {
        Self {
            id: wager.id,
            match_title: match_title.into(),
            date: wager.created_at.format("%Y-%m-%d").to_string(),
            time: wager.created_at.format("%H:%M").to_string(),
            prediction: wager.parsed_prediction().normalize(),
            status: wager.status,
            points_earned: wager.winnings_paid,
            bet_amount: wager.bet_amount,
            potential_winnings: wager.potential_winnings,
            multiplier: wager.multiplier,
        }
    }
}

/// Split into (active, resolved), keeping input order.
pub fn partition_wagers(wagers: &[Wager]) -> (Vec<&Wager>, Vec<&Wager>) {
    wagers.iter().partition(|w| w.status == WagerStatus::Active)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WagerSummary {
    pub total_wagers: usize,
    pub active_wagers: usize,
    pub total_wagered: u64,
    pub total_winnings: u64,
    pub won: usize,
    pub lost: usize,
    pub cancelled: usize,
}

impl WagerSummary {
    /// Wins over settled (won + lost) wagers; cancelled ones are excluded.
    pub fn win_rate(&self) -> f64 {
        let settled = self.won + self.lost;
        if settled > 0 {
            self.won as f64 / settled as f64
        } else {
            0.0
        }
    }
}

pub fn summarize(wagers: &[Wager]) -> WagerSummary {
    wagers.iter().fold(WagerSummary::default(), |mut acc, w| {
        acc.total_wagers += 1;
        acc.total_wagered += w.bet_amount;
        acc.total_winnings += w.winnings_paid;
        match w.status {
            WagerStatus::Active => acc.active_wagers += 1,
            WagerStatus::Won => acc.won += 1,
            WagerStatus::Lost => acc.lost += 1,
            WagerStatus::Cancelled => acc.cancelled += 1,
        }
        acc
    })
}
