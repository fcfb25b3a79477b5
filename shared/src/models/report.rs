//! Report Model (one operator shift)

use serde::{Deserialize, Serialize};

/// Which timetable the shift runs on. Informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum Timetable {
    #[default]
    #[serde(alias = "normal")]
    Regular,
    Holiday,
}

impl Timetable {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Holiday => "holiday",
        }
    }
}

impl std::str::FromStr for Timetable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "regular" | "normal" => Ok(Self::Regular),
            "holiday" => Ok(Self::Holiday),
            other => Err(format!("unknown timetable: {other}")),
        }
    }
}

/// Report entity with its running aggregates
///
/// Counters are only written by the ledger maintenance rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Report {
    pub id: i64,
    /// Operator who owns the shift
    pub username: String,
    pub timetable: Timetable,
    /// Tickets sold after the partial close
    pub partial_tickets: i64,
    /// Cash collected after the partial close
    pub partial_cash: i64,
    /// Cash counted at total close
    pub final_cash: i64,
    /// true = open or partially closed, false = fully closed
    pub status: bool,
    pub total_cash: i64,
    pub total_tickets: i64,
    pub total_gold: i64,
    pub total_gold_cash: i64,
    pub total_null: i64,
    pub total_null_cash: i64,
    pub total_regular: i64,
    pub total_regular_cash: i64,
    pub partial_closed_at: Option<i64>,
    pub closed_at: Option<i64>,
    pub created_at: i64,
}

impl Report {
    /// Open or pending (partially closed) report
    pub fn is_open(&self) -> bool {
        self.status
    }

    pub fn is_partially_closed(&self) -> bool {
        self.partial_closed_at.is_some()
    }

    /// Whether a ticket created at `created_at` may still be voided.
    ///
    /// Tickets sold at or before the partial close are locked into that count.
    pub fn accepts_void_for(&self, created_at: i64) -> bool {
        match self.partial_closed_at {
            None => true,
            Some(boundary) => created_at > boundary,
        }
    }
}

/// Create report payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportCreate {
    pub username: String,
    #[serde(default)]
    pub timetable: Timetable,
}
