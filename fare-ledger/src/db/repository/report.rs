//! Report Repository

use super::{RepoError, RepoResult};
use shared::models::{Report, ReportCreate};
use sqlx::SqlitePool;

const COLUMNS: &str = "id, username, timetable, partial_tickets, partial_cash, final_cash, status, total_cash, total_tickets, total_gold, total_gold_cash, total_null, total_null_cash, total_regular, total_regular_cash, partial_closed_at, closed_at, created_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Report>> {
    let report = sqlx::query_as::<_, Report>(&format!("SELECT {COLUMNS} FROM reports WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(report)
}

/// Create an open report with zeroed counters.
///
/// The single-open index turns a concurrent second open into `Duplicate`.
pub async fn create(pool: &SqlitePool, data: ReportCreate) -> RepoResult<Report> {
    if data.username.trim().is_empty() {
        return Err(RepoError::Validation("username is required".into()));
    }
    let now = shared::util::now_millis();
    let report = sqlx::query_as::<_, Report>(&format!(
        "INSERT INTO reports (username, timetable, status, created_at) VALUES (?1, ?2, 1, ?3) RETURNING {COLUMNS}"
    ))
    .bind(&data.username)
    .bind(data.timetable.as_str())
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => RepoError::Duplicate("A report is already open".into()),
        other => other,
    })?;
    Ok(report)
}

/// The open or pending (partially closed) report, if any
pub async fn find_open(pool: &SqlitePool) -> RepoResult<Option<Report>> {
    let report = sqlx::query_as::<_, Report>(&format!(
        "SELECT {COLUMNS} FROM reports WHERE status = 1 ORDER BY id DESC LIMIT 1"
    ))
    .fetch_optional(pool)
    .await?;
    Ok(report)
}

/// Stamp `partial_closed_at`. Applies once, and only to an open report.
pub async fn mark_partially_closed(pool: &SqlitePool, id: i64, at: i64) -> RepoResult<Report> {
    sqlx::query_as::<_, Report>(&format!(
        "UPDATE reports SET partial_closed_at = ?1 WHERE id = ?2 AND status = 1 AND partial_closed_at IS NULL RETURNING {COLUMNS}"
    ))
    .bind(at)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| {
        RepoError::NotFound(format!(
            "Report {id} not found, closed or already partially closed"
        ))
    })
}

/// Terminal close: status off, `closed_at` stamped, counted cash recorded
pub async fn close(pool: &SqlitePool, id: i64, final_cash: i64, at: i64) -> RepoResult<Report> {
    if final_cash < 0 {
        return Err(RepoError::Validation(format!(
            "Counted cash cannot be negative: {final_cash}"
        )));
    }
    sqlx::query_as::<_, Report>(&format!(
        "UPDATE reports SET status = 0, closed_at = ?1, final_cash = ?2 WHERE id = ?3 AND status = 1 RETURNING {COLUMNS}"
    ))
    .bind(at)
    .bind(final_cash)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| RepoError::NotFound(format!("Report {id} not found or already closed")))
}

/// The two most recent closed reports of an operator, newest first
pub async fn find_latest_closed_by_username(
    pool: &SqlitePool,
    username: &str,
) -> RepoResult<Vec<Report>> {
    let reports = sqlx::query_as::<_, Report>(&format!(
        "SELECT {COLUMNS} FROM reports WHERE username = ? AND status = 0 ORDER BY created_at DESC, id DESC LIMIT 2"
    ))
    .bind(username)
    .fetch_all(pool)
    .await?;
    Ok(reports)
}

pub async fn find_all(pool: &SqlitePool, limit: i64, offset: i64) -> RepoResult<Vec<Report>> {
    let reports = sqlx::query_as::<_, Report>(&format!(
        "SELECT {COLUMNS} FROM reports ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(reports)
}
