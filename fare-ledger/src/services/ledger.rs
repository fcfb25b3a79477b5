//! Ledger Service - report lifecycle and ticket issuance/nullification
//!
//! The only component allowed to author business-level transitions on the
//! ledger. Report state machine:
//!
//! ```text
//! OPEN --partial_close--> PENDING --total_close--> CLOSED
//!   \__________________total_close_________________/
//! ```
//!
//! Ticket state machine: `ACTIVE --nullify--> VOID` (terminal). A ticket of a
//! partially closed report is voidable only when it was sold strictly after
//! the partial close.

use crate::db::DbService;
use crate::db::repository::{RepoError, report, ticket};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Report, ReportCreate, Ticket, TicketCreate, TicketUpdate, Timetable};
use sqlx::SqlitePool;
use std::collections::BTreeSet;

/// Log and convert a storage failure
fn storage_error(op: &'static str, err: RepoError) -> AppError {
    tracing::error!(operation = op, error = %err, "Ledger storage failure");
    AppError::from(err).with_detail("operation", op)
}

fn rejected(err: AppError) -> AppError {
    tracing::warn!(code = err.code.code(), "{}", err.message);
    err
}

#[derive(Clone)]
pub struct LedgerService {
    pool: SqlitePool,
}

impl LedgerService {
    pub fn new(db: &DbService) -> Self {
        Self {
            pool: db.pool.clone(),
        }
    }

    // ========== Reports ==========

    /// Open a new shift report with zeroed counters.
    ///
    /// Fails with `ReportAlreadyOpen` while another report is open or pending.
    pub async fn start_report(&self, username: &str, timetable: Timetable) -> AppResult<Report> {
        if username.trim().is_empty() {
            return Err(rejected(
                AppError::validation("Username is required").with_detail("field", "username"),
            ));
        }

        if let Some(open) = report::find_open(&self.pool)
            .await
            .map_err(|e| storage_error("start_report", e))?
        {
            return Err(rejected(
                AppError::new(ErrorCode::ReportAlreadyOpen).with_detail("report_id", open.id),
            ));
        }

        let data = ReportCreate {
            username: username.to_string(),
            timetable,
        };
        let created = match report::create(&self.pool, data).await {
            Ok(r) => r,
            // Lost a race against another start
            Err(RepoError::Duplicate(_)) => {
                return Err(rejected(AppError::new(ErrorCode::ReportAlreadyOpen)));
            }
            Err(e) => return Err(storage_error("start_report", e)),
        };

        tracing::info!(report_id = created.id, username = %created.username, timetable = created.timetable.as_str(), "Report started");
        Ok(created)
    }

    /// The report currently open or pending, if there is one
    pub async fn find_open_or_pending_report(&self) -> AppResult<Report> {
        report::find_open(&self.pool)
            .await
            .map_err(|e| storage_error("find_open_or_pending_report", e))?
            .ok_or_else(|| AppError::with_message(ErrorCode::ReportNotFound, "No open report"))
    }

    /// Mid-shift cash count. Sets `partial_closed_at` exactly once.
    ///
    /// `counted_cash` is only reported back against the running totals; it
    /// never feeds the aggregates.
    pub async fn partial_close(&self, report_id: i64, counted_cash: i64) -> AppResult<Report> {
        if counted_cash < 0 {
            return Err(rejected(AppError::validation("Counted cash cannot be negative")));
        }
        let current = self.open_report(report_id, "partial_close").await?;
        if current.is_partially_closed() {
            return Err(rejected(
                AppError::new(ErrorCode::ReportAlreadyPartiallyClosed).with_detail("report_id", report_id),
            ));
        }

        let now = shared::util::now_millis();
        let updated = report::mark_partially_closed(&self.pool, report_id, now)
            .await
            .map_err(|e| storage_error("partial_close", e))?;

        tracing::info!(
            report_id,
            counted_cash,
            total_cash = updated.total_cash,
            difference = counted_cash - updated.total_cash,
            "Report partially closed"
        );
        Ok(updated)
    }

    /// End of shift. Terminal: the report accepts no further tickets.
    pub async fn total_close(&self, report_id: i64, counted_cash: i64) -> AppResult<Report> {
        if counted_cash < 0 {
            return Err(rejected(AppError::validation("Counted cash cannot be negative")));
        }
        self.open_report(report_id, "total_close").await?;

        let now = shared::util::now_millis();
        let closed = report::close(&self.pool, report_id, counted_cash, now)
            .await
            .map_err(|e| storage_error("total_close", e))?;

        tracing::info!(
            report_id,
            counted_cash,
            total_cash = closed.total_cash,
            difference = counted_cash - closed.total_cash,
            "Report closed"
        );
        Ok(closed)
    }

    /// Load a report that must still be open or pending
    async fn open_report(&self, report_id: i64, op: &'static str) -> AppResult<Report> {
        let current = report::find_by_id(&self.pool, report_id)
            .await
            .map_err(|e| storage_error(op, e))?
            .ok_or_else(|| rejected(AppError::report_not_found(report_id)))?;
        if !current.is_open() {
            return Err(rejected(
                AppError::new(ErrorCode::ReportClosed).with_detail("report_id", report_id),
            ));
        }
        Ok(current)
    }

    pub async fn get_report(&self, report_id: i64) -> AppResult<Report> {
        report::find_by_id(&self.pool, report_id)
            .await
            .map_err(|e| storage_error("get_report", e))?
            .ok_or_else(|| AppError::report_not_found(report_id))
    }

    /// The operator's two most recent closed reports, newest first
    pub async fn latest_closed_reports(&self, username: &str) -> AppResult<Vec<Report>> {
        report::find_latest_closed_by_username(&self.pool, username)
            .await
            .map_err(|e| storage_error("latest_closed_reports", e))
    }

    pub async fn list_reports(&self, limit: i64, offset: i64) -> AppResult<Vec<Report>> {
        report::find_all(&self.pool, limit.clamp(1, 500), offset.max(0))
            .await
            .map_err(|e| storage_error("list_reports", e))
    }

    // ========== Tickets ==========

    /// Issue a batch of tickets. All-or-nothing.
    pub async fn issue_tickets(&self, items: Vec<TicketCreate>) -> AppResult<Vec<Ticket>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        for (index, item) in items.iter().enumerate() {
            if let Some(field) = item.invalid_field() {
                return Err(rejected(
                    AppError::validation(format!("Invalid ticket: {field} is missing or negative"))
                        .with_detail("field", field)
                        .with_detail("index", index),
                ));
            }
        }

        let report_ids: BTreeSet<i64> = items.iter().map(|t| t.report_id).collect();
        for report_id in &report_ids {
            self.open_report(*report_id, "issue_tickets").await?;
        }

        let created = ticket::insert_batch(&self.pool, &items)
            .await
            .map_err(|e| storage_error("issue_tickets", e))?;

        let total_fare: i64 = created.iter().map(|t| t.fare).sum();
        tracing::info!(count = created.len(), total_fare, reports = ?report_ids, "Tickets issued");
        Ok(created)
    }

    /// Void one ticket of a report, subject to the partial-close window
    pub async fn nullify_ticket(&self, ticket_id: i64, report_id: i64) -> AppResult<()> {
        let current = self.get_ticket(ticket_id).await.map_err(rejected)?;
        let owner = report::find_by_id(&self.pool, report_id)
            .await
            .map_err(|e| storage_error("nullify_ticket", e))?
            .ok_or_else(|| rejected(AppError::report_not_found(report_id)))?;

        if current.report_id != owner.id {
            return Err(rejected(
                AppError::new(ErrorCode::TicketNotInReport)
                    .with_detail("ticket_id", ticket_id)
                    .with_detail("report_id", report_id),
            ));
        }
        if !owner.is_open() {
            return Err(rejected(
                AppError::new(ErrorCode::ReportClosed).with_detail("report_id", report_id),
            ));
        }
        if current.is_null {
            return Err(rejected(
                AppError::new(ErrorCode::TicketAlreadyNullified).with_detail("ticket_id", ticket_id),
            ));
        }
        if !owner.accepts_void_for(current.created_at) {
            return Err(rejected(
                AppError::new(ErrorCode::TicketAlreadyClosed).with_detail("ticket_id", ticket_id),
            ));
        }

        match ticket::nullify(&self.pool, ticket_id).await {
            Ok(Some(voided)) => {
                tracing::info!(ticket_id, report_id, fare = voided.fare, "Ticket nullified");
                Ok(())
            }
            // Voided concurrently between the guard and the write
            Ok(None) => Err(rejected(
                AppError::new(ErrorCode::TicketAlreadyNullified).with_detail("ticket_id", ticket_id),
            )),
            Err(e) => Err(storage_error("nullify_ticket", e)),
        }
    }

    /// Update descriptive fields of several tickets. All-or-nothing.
    pub async fn update_tickets(&self, items: Vec<TicketUpdate>) -> AppResult<Vec<Ticket>> {
        for item in &items {
            let blank = [&item.departure, &item.destination, &item.stop, &item.time]
                .into_iter()
                .flatten()
                .any(|v| v.trim().is_empty());
            if blank {
                return Err(rejected(
                    AppError::validation("Ticket fields cannot be blank").with_detail("ticket_id", item.id),
                ));
            }
        }

        match ticket::update_batch(&self.pool, &items).await {
            Ok(updated) => {
                tracing::info!(count = updated.len(), "Tickets updated");
                Ok(updated)
            }
            Err(RepoError::NotFound(msg)) => Err(rejected(AppError::with_message(ErrorCode::TicketNotFound, msg))),
            Err(e) => Err(storage_error("update_tickets", e)),
        }
    }

    /// Delete several tickets. All-or-nothing; aggregates are not adjusted.
    pub async fn delete_tickets(&self, ids: &[i64]) -> AppResult<u64> {
        match ticket::delete_batch(&self.pool, ids).await {
            Ok(deleted) => {
                tracing::info!(count = deleted, "Tickets deleted");
                Ok(deleted)
            }
            Err(RepoError::NotFound(msg)) => Err(rejected(AppError::with_message(ErrorCode::TicketNotFound, msg))),
            Err(e) => Err(storage_error("delete_tickets", e)),
        }
    }

    pub async fn get_ticket(&self, ticket_id: i64) -> AppResult<Ticket> {
        ticket::find_by_id(&self.pool, ticket_id)
            .await
            .map_err(|e| storage_error("get_ticket", e))?
            .ok_or_else(|| AppError::ticket_not_found(ticket_id))
    }

    pub async fn tickets_for_report(&self, report_id: i64) -> AppResult<Vec<Ticket>> {
        self.get_report(report_id).await?;
        ticket::find_by_report(&self.pool, report_id)
            .await
            .map_err(|e| storage_error("tickets_for_report", e))
    }
}
