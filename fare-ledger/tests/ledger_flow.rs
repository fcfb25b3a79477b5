//! Ledger flows against an on-disk database

use fare_ledger::{DbService, ErrorCode, LedgerService};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::models::{Report, TicketCreate, Timetable};
use std::time::Duration;

async fn open(dir: &tempfile::TempDir) -> DbService {
    let path = dir.path().join("ledger.db");
    DbService::new(path.to_str().unwrap(), 4, Duration::from_secs(5))
        .await
        .unwrap()
}

fn ticket(report_id: i64, fare: i64, is_gold: bool) -> TicketCreate {
    TicketCreate {
        departure: "Central".into(),
        destination: "Harbor".into(),
        username: "alice".into(),
        stop: "Market".into(),
        time: "08:30".into(),
        fare,
        is_gold,
        id_number: String::new(),
        report_id,
    }
}

fn assert_balanced(report: &Report) {
    assert_eq!(report.total_tickets, report.total_gold + report.total_regular);
    assert_eq!(
        report.total_cash,
        report.total_gold_cash + report.total_regular_cash
    );
    for counter in [
        report.total_cash,
        report.total_tickets,
        report.total_gold,
        report.total_gold_cash,
        report.total_regular,
        report.total_regular_cash,
        report.total_null,
        report.total_null_cash,
        report.partial_tickets,
        report.partial_cash,
    ] {
        assert!(counter >= 0);
    }
}

#[tokio::test]
async fn randomized_issue_and_void_keeps_counters_balanced() {
    let dir = tempfile::tempdir().unwrap();
    let db = open(&dir).await;
    let ledger = LedgerService::new(&db);
    let mut rng = StdRng::seed_from_u64(0x5eed);

    let report = ledger.start_report("alice", Timetable::Regular).await.unwrap();
    let mut issued = Vec::new();
    let mut voided_cash = 0;

    for _ in 0..20 {
        let batch: Vec<_> = (0..rng.gen_range(1..5))
            .map(|_| ticket(report.id, rng.gen_range(0..500), rng.gen_bool(0.3)))
            .collect();
        issued.extend(ledger.issue_tickets(batch).await.unwrap());

        if rng.gen_bool(0.4) {
            let candidate = &issued[rng.gen_range(0..issued.len())];
            match ledger.nullify_ticket(candidate.id, report.id).await {
                Ok(()) => voided_cash += candidate.fare,
                Err(e) => assert_eq!(e.code, ErrorCode::TicketAlreadyNullified),
            }
        }

        assert_balanced(&ledger.get_report(report.id).await.unwrap());
    }

    let report = ledger.get_report(report.id).await.unwrap();
    let tickets = ledger.tickets_for_report(report.id).await.unwrap();
    let active: Vec<_> = tickets.iter().filter(|t| !t.is_null).collect();

    assert_eq!(tickets.len(), issued.len());
    assert_eq!(report.total_null + report.total_tickets, issued.len() as i64);
    assert_eq!(report.total_tickets, active.len() as i64);
    assert_eq!(report.total_cash, active.iter().map(|t| t.fare).sum::<i64>());
    assert_eq!(report.total_null_cash, voided_cash);
}

#[tokio::test]
async fn ledger_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    let report_id = {
        let db = open(&dir).await;
        let ledger = LedgerService::new(&db);
        let report = ledger.start_report("alice", Timetable::Holiday).await.unwrap();
        ledger
            .issue_tickets(vec![ticket(report.id, 120, false), ticket(report.id, 80, true)])
            .await
            .unwrap();
        db.close().await;
        report.id
    };

    let db = open(&dir).await;
    let ledger = LedgerService::new(&db);
    let open = ledger.find_open_or_pending_report().await.unwrap();
    assert_eq!(open.id, report_id);
    assert_eq!(open.timetable, Timetable::Holiday);
    assert_eq!(open.total_cash, 200);
    assert_eq!(open.total_gold, 1);

    let err = ledger.start_report("bob", Timetable::Regular).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ReportAlreadyOpen);
}

#[tokio::test]
async fn full_shift_with_partial_close() {
    let dir = tempfile::tempdir().unwrap();
    let db = open(&dir).await;
    let ledger = LedgerService::new(&db);

    let report = ledger.start_report("alice", Timetable::Regular).await.unwrap();
    let before = ledger
        .issue_tickets(vec![ticket(report.id, 100, false)])
        .await
        .unwrap();

    // Millisecond timestamps: make sure later sales land after the count
    tokio::time::sleep(Duration::from_millis(5)).await;
    let pending = ledger.partial_close(report.id, 100).await.unwrap();
    assert!(pending.is_open());
    assert!(pending.is_partially_closed());
    tokio::time::sleep(Duration::from_millis(5)).await;

    let after = ledger
        .issue_tickets(vec![ticket(report.id, 40, true), ticket(report.id, 60, false)])
        .await
        .unwrap();

    let err = ledger
        .nullify_ticket(before[0].id, report.id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::TicketAlreadyClosed);

    ledger.nullify_ticket(after[1].id, report.id).await.unwrap();

    let report = ledger.get_report(report.id).await.unwrap();
    assert_balanced(&report);
    assert_eq!(report.partial_tickets, 1);
    assert_eq!(report.partial_cash, 40);
    assert_eq!(report.total_cash, 140);
    assert_eq!(report.total_null_cash, 60);

    let closed = ledger.total_close(report.id, 140).await.unwrap();
    assert!(!closed.is_open());
    assert_eq!(closed.final_cash, 140);

    let err = ledger
        .nullify_ticket(after[0].id, closed.id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ReportClosed);

    let latest = ledger.latest_closed_reports("alice").await.unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].id, closed.id);

    // The next shift can start once the previous one is closed
    ledger.start_report("bob", Timetable::Regular).await.unwrap();
}
