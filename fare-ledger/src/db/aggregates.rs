//! Report aggregate maintenance
//!
//! Both rules run on the caller's connection, inside the transaction that
//! performs the triggering ticket write, so a reader never observes a ticket
//! change without its counter change or the reverse.

use super::repository::{RepoError, RepoResult};
use shared::models::Ticket;
use sqlx::SqliteConnection;

/// Fold a freshly inserted (active) ticket into its report.
///
/// Only open reports accept tickets; when the report is missing or closed the
/// write is rejected and the caller must roll back.
pub async fn apply_ticket_issued(conn: &mut SqliteConnection, ticket: &Ticket) -> RepoResult<()> {
    let rows = sqlx::query(
        "UPDATE reports SET \
            total_cash = total_cash + ?1, \
            total_tickets = total_tickets + 1, \
            total_gold = total_gold + CASE WHEN ?2 THEN 1 ELSE 0 END, \
            total_gold_cash = total_gold_cash + CASE WHEN ?2 THEN ?1 ELSE 0 END, \
            total_regular = total_regular + CASE WHEN ?2 THEN 0 ELSE 1 END, \
            total_regular_cash = total_regular_cash + CASE WHEN ?2 THEN 0 ELSE ?1 END, \
            partial_tickets = partial_tickets + CASE WHEN partial_closed_at IS NOT NULL THEN 1 ELSE 0 END, \
            partial_cash = partial_cash + CASE WHEN partial_closed_at IS NOT NULL THEN ?1 ELSE 0 END \
         WHERE id = ?3 AND status = 1",
    )
    .bind(ticket.fare)
    .bind(ticket.is_gold)
    .bind(ticket.report_id)
    .execute(&mut *conn)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Report {} not found or already closed",
            ticket.report_id
        )));
    }
    Ok(())
}

/// Move a ticket that just became void out of the active totals.
///
/// The partial-window subtotal is reversed only for tickets sold after the
/// partial close, which are the only ones that contributed to it.
pub async fn apply_ticket_voided(conn: &mut SqliteConnection, ticket: &Ticket) -> RepoResult<()> {
    let rows = sqlx::query(
        "UPDATE reports SET \
            total_null = total_null + 1, \
            total_null_cash = total_null_cash + ?1, \
            total_tickets = total_tickets - 1, \
            total_cash = total_cash - ?1, \
            total_gold = total_gold - CASE WHEN ?2 THEN 1 ELSE 0 END, \
            total_gold_cash = total_gold_cash - CASE WHEN ?2 THEN ?1 ELSE 0 END, \
            total_regular = total_regular - CASE WHEN ?2 THEN 0 ELSE 1 END, \
            total_regular_cash = total_regular_cash - CASE WHEN ?2 THEN 0 ELSE ?1 END, \
            partial_tickets = partial_tickets - CASE WHEN partial_closed_at IS NOT NULL AND ?3 > partial_closed_at THEN 1 ELSE 0 END, \
            partial_cash = partial_cash - CASE WHEN partial_closed_at IS NOT NULL AND ?3 > partial_closed_at THEN ?1 ELSE 0 END \
         WHERE id = ?4 AND status = 1",
    )
    .bind(ticket.fare)
    .bind(ticket.is_gold)
    .bind(ticket.created_at)
    .bind(ticket.report_id)
    .execute(&mut *conn)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Report {} not found or already closed",
            ticket.report_id
        )));
    }
    Ok(())
}
