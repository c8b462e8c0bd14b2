//! Workout plan - the per-user document of dated sessions

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Ordered sessions as loaded from the plan document
pub type WorkoutPlan = Vec<Session>;

/// One dated entry of the plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: String,
    /// Stored as `workout` in the plan document
    #[serde(rename = "workout", default)]
    pub groups: Vec<Group>,
}

/// Named collection of exercises with a target completion count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub title: String,
    #[serde(default = "default_frequency")]
    pub frequency: u32,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

fn default_frequency() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub series: u32,
    pub repetitions: u32,
    pub weight: Weight,
}

/// Weight is free-form in the document: `20`, `12.5` or `"bodyweight"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Weight {
    Number(f64),
    Text(String),
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weight::Number(n) => write!(f, "{}", n),
            Weight::Text(s) => f.write_str(s),
        }
    }
}

impl Session {
    /// Find a group by its title
    pub fn group(&self, title: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.title == title)
    }

    /// Date as shown to the user (`DD-MM-YYYY`)
    pub fn display_date(&self) -> String {
        display_date(self.date)
    }
}

/// Find the session for a date
pub fn find_session(plan: &[Session], date: NaiveDate) -> Option<&Session> {
    plan.iter().find(|s| s.date == date)
}

pub fn display_date(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

/// Parse a plan document
pub fn parse_plan(json: &str) -> serde_json::Result<WorkoutPlan> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {
            "date": "2024-01-01",
            "notes": "Deload week",
            "workout": [
                {
                    "title": "Push",
                    "frequency": 2,
                    "exercises": [
                        { "name": "Bench press", "series": 4, "repetitions": 8, "weight": 60 },
                        { "name": "Dips", "series": 3, "repetitions": 10, "weight": "bodyweight" }
                    ]
                },
                { "title": "Pull", "exercises": [] }
            ]
        },
        { "date": "2024-02-01", "workout": [] }
    ]"#;

    #[test]
    fn test_parse_plan_document() {
        let plan = parse_plan(SAMPLE).unwrap();
        assert_eq!(plan.len(), 2);

        let first = &plan[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(first.notes, "Deload week");
        assert_eq!(first.groups.len(), 2);
        assert_eq!(first.groups[0].frequency, 2);
        assert_eq!(first.groups[0].exercises[1].weight, Weight::Text("bodyweight".into()));
    }

    #[test]
    fn test_missing_frequency_defaults_to_one() {
        let plan = parse_plan(SAMPLE).unwrap();
        assert_eq!(plan[0].groups[1].frequency, 1);
    }

    #[test]
    fn test_missing_notes_default_to_empty() {
        let plan = parse_plan(SAMPLE).unwrap();
        assert!(plan[1].notes.is_empty());
        assert!(plan[1].groups.is_empty());
    }

    #[test]
    fn test_weight_display() {
        assert_eq!(Weight::Number(60.0).to_string(), "60");
        assert_eq!(Weight::Number(12.5).to_string(), "12.5");
        assert_eq!(Weight::Text("bodyweight".into()).to_string(), "bodyweight");
    }

    #[test]
    fn test_find_session_and_group() {
        let plan = parse_plan(SAMPLE).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let session = find_session(&plan, date).unwrap();
        assert_eq!(session.group("Pull").unwrap().title, "Pull");
        assert!(session.group("Legs").is_none());
        assert!(find_session(&plan, NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()).is_none());
    }

    #[test]
    fn test_display_date_format() {
        let plan = parse_plan(SAMPLE).unwrap();
        assert_eq!(plan[0].display_date(), "01-01-2024");
    }

    #[test]
    fn test_malformed_document_is_error() {
        assert!(parse_plan("{\"not\": \"a list\"}").is_err());
        assert!(parse_plan("[{\"date\": \"yesterday\"}]").is_err());
    }
}
