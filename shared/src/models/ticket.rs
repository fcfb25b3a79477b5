//! Ticket Model (one fare sale)

use serde::{Deserialize, Serialize};

/// Ticket entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Ticket {
    pub id: i64,
    pub departure: String,
    pub destination: String,
    /// Operator who sold the ticket
    pub username: String,
    pub stop: String,
    /// Departure time as shown on the timetable (HH:MM)
    pub time: String,
    /// Integer currency units
    pub fare: i64,
    pub is_gold: bool,
    /// Voided
    pub is_null: bool,
    /// Rider identifier
    pub id_number: String,
    /// Owning report, never changes
    pub report_id: i64,
    pub created_at: i64,
    pub updated_at: Option<i64>,
}

/// Issue ticket payload. Tickets are always created active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketCreate {
    pub departure: String,
    pub destination: String,
    pub username: String,
    pub stop: String,
    pub time: String,
    pub fare: i64,
    #[serde(default)]
    pub is_gold: bool,
    #[serde(default)]
    pub id_number: String,
    pub report_id: i64,
}

impl TicketCreate {
    /// Check the fields a ticket cannot be issued without.
    ///
    /// Returns the name of the first offending field.
    pub fn invalid_field(&self) -> Option<&'static str> {
        if self.fare < 0 {
            return Some("fare");
        }
        [
            ("departure", &self.departure),
            ("destination", &self.destination),
            ("username", &self.username),
            ("stop", &self.stop),
        ]
        .into_iter()
        .find(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| name)
    }
}

/// Update ticket payload
///
/// Only descriptive fields. Fare, gold flag, void flag and owning report
/// are immutable so the report aggregates never drift.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketUpdate {
    pub id: i64,
    pub departure: Option<String>,
    pub destination: Option<String>,
    pub stop: Option<String>,
    pub time: Option<String>,
    pub id_number: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create() -> TicketCreate {
        TicketCreate {
            departure: "Central".into(),
            destination: "Harbor".into(),
            username: "alice".into(),
            stop: "Market".into(),
            time: "08:30".into(),
            fare: 100,
            is_gold: false,
            id_number: String::new(),
            report_id: 1,
        }
    }

    #[test]
    fn test_valid_ticket_create() {
        assert_eq!(create().invalid_field(), None);
    }

    #[test]
    fn test_invalid_ticket_create() {
        let mut t = create();
        t.fare = -1;
        assert_eq!(t.invalid_field(), Some("fare"));

        let mut t = create();
        t.stop = "  ".into();
        assert_eq!(t.invalid_field(), Some("stop"));
    }

    #[test]
    fn test_ticket_create_defaults() {
        let json = r#"{"departure":"A","destination":"B","username":"u","stop":"S","time":"07:00","fare":50,"report_id":3}"#;
        let t: TicketCreate = serde_json::from_str(json).unwrap();
        assert!(!t.is_gold);
        assert!(t.id_number.is_empty());
    }
}
