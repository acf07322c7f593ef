use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{RoundCounters, RoundResult, Side};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to an in-memory database would see its own copy.
        let max_connections = if sqlite_path(database_url).is_some() { 5 } else { 1 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn load_state(&self) -> Result<RoundCounters> {
        let row = sqlx::query(
            "SELECT round, position, left_pulls, right_pulls FROM game_state WHERE id = 1",
        )
        .fetch_one(&self.pool)
        .await
        .context("failed to load game state")?;
        counters_from_row(&row)
    }

    /// Applies one pull atomically and returns the counters after it.
    pub async fn record_pull(&self, side: Side) -> Result<RoundCounters> {
        let (left, right) = match side {
            Side::Left => (1_i64, 0_i64),
            Side::Right => (0, 1),
        };
        let row = sqlx::query(
            r#"
            UPDATE game_state
            SET position = position + ?,
                left_pulls = left_pulls + ?,
                right_pulls = right_pulls + ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = 1
            RETURNING round, position, left_pulls, right_pulls
            "#,
        )
        .bind(side.step())
        .bind(left)
        .bind(right)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to record {} pull", side.as_str()))?;
        counters_from_row(&row)
    }

    /// Records the finished round and starts the next one from zero.
    pub async fn finish_round(&self, winner: Side) -> Result<(RoundResult, RoundCounters)> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(
            "SELECT round, position, left_pulls, right_pulls FROM game_state WHERE id = 1",
        )
        .fetch_one(&mut *tx)
        .await
        .context("failed to load finishing round")?;
        let finished = counters_from_row(&row)?;
        let finished_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO round_results (round, winner, left_pulls, right_pulls, finished_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(finished.round)
        .bind(winner.as_str())
        .bind(to_column(finished.left_pulls)?)
        .bind(to_column(finished.right_pulls)?)
        .bind(finished_at)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to record result of round {}", finished.round))?;

        let next_row = sqlx::query(
            r#"
            UPDATE game_state
            SET round = round + 1,
                position = 0,
                left_pulls = 0,
                right_pulls = 0,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = 1
            RETURNING round, position, left_pulls, right_pulls
            "#,
        )
        .fetch_one(&mut *tx)
        .await
        .context("failed to reset counters for next round")?;
        let next = counters_from_row(&next_row)?;
        tx.commit().await?;

        Ok((
            RoundResult {
                round: finished.round,
                winner,
                left_pulls: finished.left_pulls,
                right_pulls: finished.right_pulls,
                finished_at,
            },
            next,
        ))
    }

    /// Overwrites the live counters without touching round history.
    pub async fn write_state(&self, counters: RoundCounters) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE game_state
            SET round = ?, position = ?, left_pulls = ?, right_pulls = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = 1
            "#,
        )
        .bind(counters.round)
        .bind(counters.position)
        .bind(to_column(counters.left_pulls)?)
        .bind(to_column(counters.right_pulls)?)
        .execute(&self.pool)
        .await
        .context("failed to write game state")?;
        Ok(())
    }

    /// Most recent results first.
    pub async fn list_results(&self, limit: u32) -> Result<Vec<RoundResult>> {
        let rows = sqlx::query(
            r#"
            SELECT round, winner, left_pulls, right_pulls, finished_at
            FROM round_results
            ORDER BY round DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .context("failed to list round results")?;

        rows.into_iter()
            .map(|row| -> Result<RoundResult> {
                let winner: String = row.try_get("winner")?;
                let finished_at: DateTime<Utc> = row.try_get("finished_at")?;
                Ok(RoundResult {
                    round: row.try_get("round")?,
                    winner: winner.parse::<Side>().map_err(|err| anyhow!(err))?,
                    left_pulls: from_column(row.try_get("left_pulls")?)?,
                    right_pulls: from_column(row.try_get("right_pulls")?)?,
                    finished_at,
                })
            })
            .collect()
    }
}

fn counters_from_row(row: &SqliteRow) -> Result<RoundCounters> {
    Ok(RoundCounters {
        round: row.try_get("round")?,
        position: row.try_get("position")?,
        left_pulls: from_column(row.try_get("left_pulls")?)?,
        right_pulls: from_column(row.try_get("right_pulls")?)?,
    })
}

fn from_column(value: i64) -> Result<u64> {
    u64::try_from(value).with_context(|| format!("negative pull count {value} in storage"))
}

fn to_column(value: u64) -> Result<i64> {
    i64::try_from(value).with_context(|| format!("pull count {value} exceeds storage range"))
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
