//! Ticket Repository

use super::{RepoError, RepoResult};
use crate::db::aggregates;
use shared::models::{Ticket, TicketCreate, TicketUpdate};
use sqlx::SqlitePool;

const COLUMNS: &str = "id, departure, destination, username, stop, time, fare, is_gold, is_null, id_number, report_id, created_at, updated_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Ticket>> {
    let ticket = sqlx::query_as::<_, Ticket>(&format!("SELECT {COLUMNS} FROM tickets WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(ticket)
}

pub async fn find_by_report(pool: &SqlitePool, report_id: i64) -> RepoResult<Vec<Ticket>> {
    let tickets = sqlx::query_as::<_, Ticket>(&format!(
        "SELECT {COLUMNS} FROM tickets WHERE report_id = ? ORDER BY created_at, id"
    ))
    .bind(report_id)
    .fetch_all(pool)
    .await?;
    Ok(tickets)
}

/// Insert a batch of active tickets stamped with the current time
pub async fn insert_batch(pool: &SqlitePool, items: &[TicketCreate]) -> RepoResult<Vec<Ticket>> {
    insert_batch_at(pool, items, shared::util::now_millis()).await
}

/// Insert a batch of active tickets stamped `created_at = now`.
///
/// Each insert is followed by the issued rule on the same transaction; any
/// failure rolls back every ticket and counter change of the batch.
pub async fn insert_batch_at(
    pool: &SqlitePool,
    items: &[TicketCreate],
    now: i64,
) -> RepoResult<Vec<Ticket>> {
    let mut tx = pool.begin().await?;
    let mut created = Vec::with_capacity(items.len());

    for item in items {
        if let Some(field) = item.invalid_field() {
            return Err(RepoError::Validation(format!("Invalid ticket field: {field}")));
        }
        let ticket = sqlx::query_as::<_, Ticket>(&format!(
            "INSERT INTO tickets (departure, destination, username, stop, time, fare, is_gold, is_null, id_number, report_id, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?9, ?10) RETURNING {COLUMNS}"
        ))
        .bind(&item.departure)
        .bind(&item.destination)
        .bind(&item.username)
        .bind(&item.stop)
        .bind(&item.time)
        .bind(item.fare)
        .bind(item.is_gold)
        .bind(&item.id_number)
        .bind(item.report_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        aggregates::apply_ticket_issued(&mut tx, &ticket).await?;
        created.push(ticket);
    }

    tx.commit().await?;
    Ok(created)
}

/// Update descriptive fields of several tickets. Fails whole if any id is unknown.
pub async fn update_batch(pool: &SqlitePool, items: &[TicketUpdate]) -> RepoResult<Vec<Ticket>> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;
    let mut updated = Vec::with_capacity(items.len());

    for item in items {
        let ticket = sqlx::query_as::<_, Ticket>(&format!(
            "UPDATE tickets SET departure = COALESCE(?1, departure), destination = COALESCE(?2, destination), \
             stop = COALESCE(?3, stop), time = COALESCE(?4, time), id_number = COALESCE(?5, id_number), updated_at = ?6 \
             WHERE id = ?7 RETURNING {COLUMNS}"
        ))
        .bind(&item.departure)
        .bind(&item.destination)
        .bind(&item.stop)
        .bind(&item.time)
        .bind(&item.id_number)
        .bind(now)
        .bind(item.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Ticket {} not found", item.id)))?;
        updated.push(ticket);
    }

    tx.commit().await?;
    Ok(updated)
}

/// Delete several tickets. Report aggregates are left untouched.
pub async fn delete_batch(pool: &SqlitePool, ids: &[i64]) -> RepoResult<u64> {
    let mut tx = pool.begin().await?;
    let mut deleted = 0;

    for id in ids {
        let rows = sqlx::query("DELETE FROM tickets WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if rows.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("Ticket {id} not found")));
        }
        deleted += rows.rows_affected();
    }

    tx.commit().await?;
    Ok(deleted)
}

/// Flip `is_null` from false to true and apply the voided rule.
///
/// Returns `None` when no active ticket with this id exists.
pub async fn nullify(pool: &SqlitePool, id: i64) -> RepoResult<Option<Ticket>> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;

    let Some(ticket) = sqlx::query_as::<_, Ticket>(&format!(
        "UPDATE tickets SET is_null = 1, updated_at = ?1 WHERE id = ?2 AND is_null = 0 RETURNING {COLUMNS}"
    ))
    .bind(now)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    else {
        return Ok(None);
    };

    aggregates::apply_ticket_voided(&mut tx, &ticket).await?;
    tx.commit().await?;
    Ok(Some(ticket))
}
