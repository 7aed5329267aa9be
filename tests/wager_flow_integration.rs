//! Integration tests for the wager flow
//!
//! Drives slip -> store -> settlement/cancellation -> history against an
//! on-disk SQLite file, reopening the store to check what actually persisted.

use netprophet_core::odds::PlayerOdds;
use netprophet_core::prediction::{PredictionOptions, TieBreakChoice};
use netprophet_core::wager::{
    partition_wagers, summarize, BetHistoryItem, MatchOutcome, MatchSnapshot, MatchStatus,
    Wager, WagerRequest, WagerStatus, WagerStore, Wallet, WinnerClassifier,
};
use netprophet_core::{EngineConfig, PredictionError};
use tempfile::NamedTempFile;

fn config_for(file: &NamedTempFile) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.database_path = file.path().to_str().unwrap().to_string();
    config.betting.starting_balance = 1_000;
    config
}

fn final_match() -> MatchSnapshot {
    MatchSnapshot {
        id: "rg-final".to_string(),
        player1: PlayerOdds::new("Sinner", 1.85),
        player2: PlayerOdds::new("Alcaraz", 2.10),
        status: MatchStatus::Upcoming,
        is_locked: false,
        format: None,
    }
}

fn detailed_prediction() -> PredictionOptions {
    let mut prediction = PredictionOptions::new("Alcaraz", "3-2");
    prediction.set1_score = "4-6".to_string();
    prediction.set2_score = "6-7".to_string();
    prediction.set3_score = "6-4".to_string();
    prediction.set2_tie_break = TieBreakChoice::Yes;
    prediction.set2_tie_break_score = "7-4".to_string();
    prediction.aces_leader = "Sinner".to_string();
    prediction
}

#[tokio::test]
async fn test_full_settlement_flow() {
    let file = NamedTempFile::new().unwrap();
    let config = config_for(&file);
    let store = WagerStore::from_config(&config).unwrap();

    // 8 populated fields on Alcaraz's 2.10 -> 2.40
    let big = store
        .submit(
            &WagerRequest {
                user_id: "fan-1".to_string(),
                prediction: detailed_prediction(),
                bet_amount: 250,
            },
            &final_match(),
            &config,
        )
        .await
        .unwrap();
    assert_eq!(big.multiplier, 2.40);
    assert_eq!(big.potential_winnings, 600);

    let small = store
        .submit(
            &WagerRequest {
                user_id: "fan-1".to_string(),
                prediction: PredictionOptions::new("Sinner", "3-0"),
                bet_amount: 100,
            },
            &final_match(),
            &config,
        )
        .await
        .unwrap();
    assert_eq!(store.balance("fan-1").await.unwrap(), 650);

    let outcome = MatchOutcome {
        match_id: "rg-final".to_string(),
        winner: "Alcaraz".to_string(),
        result: "3-2".to_string(),
    };
    store.settle_match(&outcome, &WinnerClassifier).await.unwrap();

    // Reopen to read what was committed
    let reopened = WagerStore::from_config(&config).unwrap();
    assert_eq!(reopened.balance("fan-1").await.unwrap(), 1_250);

    let wagers = reopened.wagers_for_user("fan-1").await.unwrap();
    assert_eq!(wagers.len(), 2);
    let (active, resolved) = partition_wagers(&wagers);
    assert!(active.is_empty());
    assert_eq!(resolved.len(), 2);

    let summary = summarize(&wagers);
    assert_eq!(summary.total_wagered, 350);
    assert_eq!(summary.total_winnings, 600);
    assert_eq!(summary.won, 1);
    assert_eq!(summary.lost, 1);

    let big_row = wagers.iter().find(|w| w.id == big.id).unwrap();
    let item = BetHistoryItem::from_wager(big_row, final_match().title());
    assert_eq!(item.match_title, "Sinner vs Alcaraz");
    assert_eq!(item.status, WagerStatus::Won);
    assert_eq!(item.points_earned, 600);
    assert_eq!(item.prediction.set2_tie_break_score, "7-4");
    assert_eq!(item.prediction.aces_leader, "Sinner");

    let small_row = wagers.iter().find(|w| w.id == small.id).unwrap();
    assert_eq!(small_row.status, WagerStatus::Lost);
    assert_eq!(small_row.winnings_paid, 0);
}

#[tokio::test]
async fn test_voided_match_refunds_everyone() {
    let file = NamedTempFile::new().unwrap();
    let config = config_for(&file);
    let store = WagerStore::from_config(&config).unwrap();

    for (user, amount) in [("fan-1", 300), ("fan-2", 1_000)] {
        store
            .submit(
                &WagerRequest {
                    user_id: user.to_string(),
                    prediction: PredictionOptions::new("Sinner", "3-1"),
                    bet_amount: amount,
                },
                &final_match(),
                &config,
            )
            .await
            .unwrap();
    }
    assert_eq!(store.balance("fan-2").await.unwrap(), 0);

    let credits = store.cancel_match("rg-final").await.unwrap();
    assert_eq!(credits.len(), 2);
    assert!(credits.iter().all(|c| c.status == WagerStatus::Cancelled));

    assert_eq!(store.balance("fan-1").await.unwrap(), 1_000);
    assert_eq!(store.balance("fan-2").await.unwrap(), 1_000);

    for wager in store.wagers_for_match("rg-final").await.unwrap() {
        assert_eq!(wager.status, WagerStatus::Cancelled);
        assert_eq!(wager.winnings_paid, 0);
        assert!(wager.resolved_at.is_some());

        let err = store.cancel_wager(wager.id).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<PredictionError>(),
            Some(&PredictionError::ImmutableWager(wager.id))
        );
    }

    // Refund is not paid twice
    assert!(store.cancel_match("rg-final").await.unwrap().is_empty());
    assert_eq!(store.balance("fan-1").await.unwrap(), 1_000);
}

#[tokio::test]
async fn test_legacy_rows_stay_readable() {
    let file = NamedTempFile::new().unwrap();
    let config = config_for(&file);
    let store = WagerStore::from_config(&config).unwrap();

    let mut legacy = Wager::new(
        "fan-3",
        None,
        r#"{"winner":"Sinner","matchResult":"2-0","totalGames":19}"#.to_string(),
        50,
        1.95,
    );
    store.place_wager(&legacy).await.unwrap();
    legacy.prediction = "Sinner in two, Result: 2-0".to_string();
    legacy.id = uuid::Uuid::new_v4();
    store.place_wager(&legacy).await.unwrap();

    let wagers = store.wagers_for_user("fan-3").await.unwrap();
    assert_eq!(wagers.len(), 2);
    for wager in &wagers {
        let item = BetHistoryItem::from_wager(wager, "");
        assert_eq!(item.prediction.match_result, "2-0");
    }
    let json_row = wagers
        .iter()
        .find(|w| w.prediction.starts_with('{'))
        .unwrap();
    let item = BetHistoryItem::from_wager(json_row, "");
    assert_eq!(item.prediction.winner, "Sinner");
    assert_eq!(item.prediction.total_games, "19");
}
