//! Route Model (reference data, remote-authoritative)

use serde::{Deserialize, Serialize};

/// A stop along a route with its fares
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stop {
    pub name: String,
    pub code: String,
    pub fare: i64,
    pub gold_fare: i64,
    #[serde(default)]
    pub is_main: bool,
}

/// A departure time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Route entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    #[serde(alias = "_id", default)]
    pub id: String,
    pub departure: String,
    pub destination: String,
    #[serde(default)]
    pub stops: Vec<Stop>,
    #[serde(default)]
    pub timetable: Vec<TimeOfDay>,
    #[serde(default)]
    pub holiday_timetable: Vec<TimeOfDay>,
}

impl Route {
    /// A route missing its endpoints, stops or either timetable is unusable
    pub fn is_empty(&self) -> bool {
        self.departure.trim().is_empty()
            || self.destination.trim().is_empty()
            || self.stops.is_empty()
            || self.timetable.is_empty()
            || self.holiday_timetable.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route() -> Route {
        Route {
            id: "r1".into(),
            departure: "Central".into(),
            destination: "Harbor".into(),
            stops: vec![Stop {
                name: "Market".into(),
                code: "MK".into(),
                fare: 100,
                gold_fare: 50,
                is_main: true,
            }],
            timetable: vec![TimeOfDay { hour: 8, minute: 30 }],
            holiday_timetable: vec![TimeOfDay { hour: 9, minute: 0 }],
        }
    }

    #[test]
    fn test_route_is_empty() {
        assert!(!route().is_empty());

        let mut r = route();
        r.holiday_timetable.clear();
        assert!(r.is_empty());

        let mut r = route();
        r.departure = String::new();
        assert!(r.is_empty());

        let mut r = route();
        r.stops.clear();
        assert!(r.is_empty());
    }

    #[test]
    fn test_route_accepts_document_id() {
        let json = r#"{"_id":"abc","departure":"A","destination":"B"}"#;
        let r: Route = serde_json::from_str(json).unwrap();
        assert_eq!(r.id, "abc");
        assert!(r.is_empty());
    }

    #[test]
    fn test_time_of_day_display() {
        assert_eq!(TimeOfDay { hour: 7, minute: 5 }.to_string(), "07:05");
    }
}
