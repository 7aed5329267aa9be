//! Wager Store
//! Mission: persist wallets and wagers so that a debit and its wager land
//! together or not at all
//!
//! SQLite behind a single async mutex. Every state change runs in one
//! transaction; balance updates are guarded so they never go negative.

use crate::config::EngineConfig;
use crate::error::PredictionError;
use crate::wager::lifecycle::{
    MatchOutcome, SettlementClassifier, SettlementOutcome, Wager, WagerStatus, WalletCredit,
};
use crate::wager::slip::{prepare_wager, MatchSnapshot, WagerRequest};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Coin wallet used around wager creation and settlement
#[async_trait]
pub trait Wallet: Send + Sync {
    async fn balance(&self, user_id: &str) -> Result<u64>;

    /// Fails with [`PredictionError::InsufficientFunds`] when the balance is short.
    async fn debit(&self, user_id: &str, amount: u64) -> Result<()>;

    async fn credit(&self, user_id: &str, amount: u64) -> Result<()>;
}

const WAGER_COLUMNS: &str = "id, user_id, match_id, prediction, bet_amount, multiplier, \
     potential_winnings, winnings_paid, status, created_at, resolved_at";

#[derive(Clone)]
pub struct WagerStore {
    conn: Arc<Mutex<Connection>>,
    starting_balance: u64,
}

impl WagerStore {
    /// Open (or create) the store at `db_path`.
    pub fn new(db_path: &str, starting_balance: u64) -> Result<Self> {
        let conn = Connection::open(db_path).context("open wager db")?;
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();
        Self::init(conn, starting_balance)
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::new(&config.database_path, config.betting.starting_balance)
    }

    pub fn open_in_memory(starting_balance: u64) -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory wager db")?;
        Self::init(conn, starting_balance)
    }

    fn init(conn: Connection, starting_balance: u64) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS wallets (
                user_id TEXT PRIMARY KEY,
                balance INTEGER NOT NULL CHECK (balance >= 0),
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS wagers (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                match_id TEXT,
                prediction TEXT NOT NULL,
                bet_amount INTEGER NOT NULL,
                multiplier REAL NOT NULL,
                potential_winnings INTEGER NOT NULL,
                winnings_paid INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'active',
                created_at TEXT NOT NULL,
                resolved_at TEXT
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_wagers_user ON wagers(user_id, created_at DESC)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_wagers_match ON wagers(match_id, status)",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            starting_balance,
        })
    }

    /// Validate, price and persist a submission in one step.
    pub async fn submit(
        &self,
        request: &WagerRequest,
        snapshot: &MatchSnapshot,
        config: &EngineConfig,
    ) -> Result<Wager> {
        let wager = prepare_wager(request, snapshot, config).map_err(|e| {
            warn!(
                "Rejected wager from {} on {}: {}",
                request.user_id, snapshot.id, e
            );
            e
        })?;
        self.place_wager(&wager).await?;
        Ok(wager)
    }

    /// Debit `bet_amount` and insert the wager in a single transaction.
    pub async fn place_wager(&self, wager: &Wager) -> Result<()> {
        if wager.status != WagerStatus::Active {
            return Err(PredictionError::ImmutableWager(wager.id).into());
        }

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        ensure_wallet(&tx, &wager.user_id, self.starting_balance)?;
        debit_wallet(&tx, &wager.user_id, wager.bet_amount)?;

        tx.execute(
            &format!(
                "INSERT INTO wagers ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                WAGER_COLUMNS
            ),
            params![
                wager.id.to_string(),
                wager.user_id,
                wager.match_id,
                wager.prediction,
                sql_amount(wager.bet_amount)?,
                wager.multiplier,
                sql_amount(wager.potential_winnings)?,
                sql_amount(wager.winnings_paid)?,
                wager.status.as_str(),
                wager.created_at.to_rfc3339(),
                wager.resolved_at.map(|t| t.to_rfc3339()),
            ],
        )
        .context("insert wager")?;

        tx.commit()?;

        info!(
            "Wager {} placed: user={} match={:?} amount={} multiplier={:.2}",
            wager.id, wager.user_id, wager.match_id, wager.bet_amount, wager.multiplier
        );
        Ok(())
    }

    pub async fn get_wager(&self, id: Uuid) -> Result<Option<Wager>> {
        let conn = self.conn.lock().await;
        load_wager(&conn, id)
    }

    /// Newest first
    pub async fn wagers_for_user(&self, user_id: &str) -> Result<Vec<Wager>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM wagers WHERE user_id = ?1 ORDER BY created_at DESC",
            WAGER_COLUMNS
        ))?;
        let wagers = stmt
            .query_map([user_id], wager_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(wagers)
    }

    pub async fn wagers_for_match(&self, match_id: &str) -> Result<Vec<Wager>> {
        let conn = self.conn.lock().await;
        query_match_wagers(&conn, match_id, false)
    }

    /// Settle one active wager.
    pub async fn resolve_wager(&self, id: Uuid, outcome: SettlementOutcome) -> Result<WalletCredit> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let mut wager = load_wager(&tx, id)?.ok_or(PredictionError::WagerNotFound(id))?;
        let credit = wager.settle(outcome, Utc::now())?;
        apply_transition(&tx, &wager, &credit)?;

        tx.commit()?;
        info!(
            "Wager {} resolved as {} (paid {})",
            id,
            credit.status.as_str(),
            credit.amount
        );
        Ok(credit)
    }

    /// Void one active wager with a full refund.
    pub async fn cancel_wager(&self, id: Uuid) -> Result<WalletCredit> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let mut wager = load_wager(&tx, id)?.ok_or(PredictionError::WagerNotFound(id))?;
        let credit = wager.cancel(Utc::now())?;
        apply_transition(&tx, &wager, &credit)?;

        tx.commit()?;
        info!("Wager {} cancelled, refunded {}", id, credit.amount);
        Ok(credit)
    }

    /// Settle every active wager on a finished match.
    pub async fn settle_match(
        &self,
        outcome: &MatchOutcome,
        classifier: &dyn SettlementClassifier,
    ) -> Result<Vec<WalletCredit>> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let now = Utc::now();
        let mut credits = Vec::new();
        for mut wager in query_match_wagers(&tx, &outcome.match_id, true)? {
            let result = classifier.classify(outcome, &wager.parsed_prediction());
            let credit = wager.settle(result, now)?;
            apply_transition(&tx, &wager, &credit)?;
            credits.push(credit);
        }

        tx.commit()?;

        let won = credits
            .iter()
            .filter(|c| c.status == WagerStatus::Won)
            .count();
        info!(
            "Settled match {}: {} wagers ({} won, winner {})",
            outcome.match_id,
            credits.len(),
            won,
            outcome.winner
        );
        Ok(credits)
    }

    /// Void a match: every active wager on it is cancelled and refunded.
    pub async fn cancel_match(&self, match_id: &str) -> Result<Vec<WalletCredit>> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let now = Utc::now();
        let mut credits = Vec::new();
        for mut wager in query_match_wagers(&tx, match_id, true)? {
            let credit = wager.cancel(now)?;
            apply_transition(&tx, &wager, &credit)?;
            credits.push(credit);
        }

        tx.commit()?;

        let refunded: u64 = credits.iter().map(|c| c.amount).sum();
        info!(
            "Cancelled match {}: {} wagers refunded ({} coins)",
            match_id,
            credits.len(),
            refunded
        );
        Ok(credits)
    }
}

#[async_trait]
impl Wallet for WagerStore {
    async fn balance(&self, user_id: &str) -> Result<u64> {
        let conn = self.conn.lock().await;
        ensure_wallet(&conn, user_id, self.starting_balance)?;
        read_balance(&conn, user_id)
    }

    async fn debit(&self, user_id: &str, amount: u64) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        ensure_wallet(&tx, user_id, self.starting_balance)?;
        debit_wallet(&tx, user_id, amount)?;
        tx.commit()?;
        Ok(())
    }

    async fn credit(&self, user_id: &str, amount: u64) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        ensure_wallet(&tx, user_id, self.starting_balance)?;
        credit_wallet(&tx, user_id, amount)?;
        tx.commit()?;
        Ok(())
    }
}

fn ensure_wallet(conn: &Connection, user_id: &str, starting_balance: u64) -> Result<()> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO wallets (user_id, balance, updated_at) VALUES (?1, ?2, ?3)",
        params![user_id, sql_amount(starting_balance)?, Utc::now().to_rfc3339()],
    )?;
    if inserted > 0 {
        debug!("Opened wallet for {} with {} coins", user_id, starting_balance);
    }
    Ok(())
}

fn read_balance(conn: &Connection, user_id: &str) -> Result<u64> {
    let balance: i64 = conn
        .query_row(
            "SELECT balance FROM wallets WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )
        .context("read wallet balance")?;
    Ok(balance.max(0) as u64)
}

/// Coin amount as an SQLite integer. Amounts past `i64::MAX` are rejected.
fn sql_amount(amount: u64) -> Result<i64> {
    i64::try_from(amount).with_context(|| format!("amount {} exceeds storable range", amount))
}

fn debit_wallet(conn: &Connection, user_id: &str, amount: u64) -> Result<()> {
    // A stored balance never exceeds i64::MAX, so a larger debit can never be covered
    let updated = match i64::try_from(amount) {
        Ok(sql) => conn.execute(
            "UPDATE wallets SET balance = balance - ?1, updated_at = ?2
             WHERE user_id = ?3 AND balance >= ?1",
            params![sql, Utc::now().to_rfc3339(), user_id],
        )?,
        Err(_) => 0,
    };
    if updated == 0 {
        let balance = read_balance(conn, user_id)?;
        return Err(PredictionError::InsufficientFunds {
            balance,
            requested: amount,
        }
        .into());
    }
    Ok(())
}

fn credit_wallet(conn: &Connection, user_id: &str, amount: u64) -> Result<()> {
    let balance = read_balance(conn, user_id)?;
    let updated = balance
        .checked_add(amount)
        .and_then(|b| i64::try_from(b).ok())
        .with_context(|| {
            format!(
                "credit of {} would overflow wallet {} (balance {})",
                amount, user_id, balance
            )
        })?;
    conn.execute(
        "UPDATE wallets SET balance = ?1, updated_at = ?2 WHERE user_id = ?3",
        params![updated, Utc::now().to_rfc3339(), user_id],
    )?;
    Ok(())
}

/// Persist a transition already applied to `wager` and pay out `credit`.
fn apply_transition(conn: &Connection, wager: &Wager, credit: &WalletCredit) -> Result<()> {
    let updated = conn.execute(
        "UPDATE wagers SET status = ?1, winnings_paid = ?2, resolved_at = ?3
         WHERE id = ?4 AND status = 'active'",
        params![
            wager.status.as_str(),
            sql_amount(wager.winnings_paid)?,
            wager.resolved_at.map(|t| t.to_rfc3339()),
            wager.id.to_string(),
        ],
    )?;
    if updated == 0 {
        return Err(PredictionError::ImmutableWager(wager.id).into());
    }

    if credit.amount > 0 {
        ensure_wallet(conn, &wager.user_id, 0)?;
        credit_wallet(conn, &wager.user_id, credit.amount)?;
    }
    Ok(())
}

fn load_wager(conn: &Connection, id: Uuid) -> Result<Option<Wager>> {
    let wager = conn
        .query_row(
            &format!("SELECT {} FROM wagers WHERE id = ?1", WAGER_COLUMNS),
            [id.to_string()],
            wager_from_row,
        )
        .optional()?;
    Ok(wager)
}

fn query_match_wagers(conn: &Connection, match_id: &str, active_only: bool) -> Result<Vec<Wager>> {
    let sql = if active_only {
        format!(
            "SELECT {} FROM wagers WHERE match_id = ?1 AND status = 'active' ORDER BY created_at ASC",
            WAGER_COLUMNS
        )
    } else {
        format!(
            "SELECT {} FROM wagers WHERE match_id = ?1 ORDER BY created_at ASC",
            WAGER_COLUMNS
        )
    };
    let mut stmt = conn.prepare_cached(&sql)?;
    let wagers = stmt
        .query_map([match_id], wager_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(wagers)
}

fn conversion_error(idx: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn wager_from_row(row: &Row<'_>) -> rusqlite::Result<Wager> {
    let id: String = row.get(0)?;
    let status: String = row.get(8)?;
    let created_at: String = row.get(9)?;
    let resolved_at: Option<String> = row.get(10)?;

    Ok(Wager {
        id: Uuid::parse_str(&id).map_err(|e| conversion_error(0, e))?,
        user_id: row.get(1)?,
        match_id: row.get(2)?,
        prediction: row.get(3)?,
        bet_amount: row.get::<_, i64>(4)?.max(0) as u64,
        multiplier: row.get(5)?,
        potential_winnings: row.get::<_, i64>(6)?.max(0) as u64,
        winnings_paid: row.get::<_, i64>(7)?.max(0) as u64,
        // Unknown legacy statuses are treated as resolved-lost so they stay immutable
        status: WagerStatus::from_str(&status).unwrap_or(WagerStatus::Lost),
        created_at: parse_ts(9, &created_at)?,
        resolved_at: resolved_at.as_deref().map(|t| parse_ts(10, t)).transpose()?,
    })
}
