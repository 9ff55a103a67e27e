use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::extract::Row;

/// Statistics reported after an export. Never written to the CSV.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSummary {
    pub count: usize,
    /// Earliest and latest date, compared as strings.
    pub first_date: Option<String>,
    pub last_date: Option<String>,
    /// Distinct names across the home and away columns.
    pub distinct_teams: usize,
    /// Sum of numeric goal cells; nulls count as nothing.
    pub total_goals: f64,
    /// Mean over rows with a numeric attendance; `None` if there are none.
    pub mean_attendance: Option<f64>,
}

pub fn summarize<R: Row>(rows: &[R]) -> ExportSummary {
    let mut teams = BTreeSet::new();
    let mut first_date: Option<String> = None;
    let mut last_date: Option<String> = None;
    let mut total_goals = 0.0;
    let mut attendance_sum = 0.0;
    let mut attendance_count = 0usize;

    for row in rows {
        if let Some(date) = row.date().as_key() {
            if first_date.as_ref().map_or(true, |d| date < *d) {
                first_date = Some(date.clone());
            }
            if last_date.as_ref().map_or(true, |d| date > *d) {
                last_date = Some(date);
            }
        }
        for team in [row.home_team(), row.away_team()] {
            if let Some(name) = team.as_key() {
                teams.insert(name);
            }
        }
        total_goals += row.home_goals().as_f64().unwrap_or(0.0);
        total_goals += row.away_goals().as_f64().unwrap_or(0.0);
        if let Some(attendance) = row.attendance().and_then(|a| a.as_f64()) {
            attendance_sum += attendance;
            attendance_count += 1;
        }
    }

    ExportSummary {
        count: rows.len(),
        first_date,
        last_date,
        distinct_teams: teams.len(),
        total_goals,
        mean_attendance: if attendance_count == 0 {
            None
        } else {
            Some(attendance_sum / attendance_count as f64)
        },
    }
}

impl fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total matches: {}", self.count)?;
        match (&self.first_date, &self.last_date) {
            (Some(first), Some(last)) => writeln!(f, "Date range: {} to {}", first, last)?,
            _ => writeln!(f, "Date range: n/a")?,
        }
        writeln!(f, "Total teams: {}", self.distinct_teams)?;
        writeln!(f, "Total goals: {}", self.total_goals)?;
        match self.mean_attendance {
            Some(mean) => write!(f, "Average attendance: {:.0}", mean),
            None => write!(f, "Average attendance: n/a"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{FixtureRow, MatchRow, Scalar};

    fn text(s: &str) -> Scalar {
        Scalar::Text(s.to_owned())
    }

    fn cbf(date: &str, home: &str, away: &str, goals: (i64, i64), attendance: Scalar) -> MatchRow {
        MatchRow {
            date: text(date),
            round: Scalar::Integer(1),
            home_team: text(home),
            away_team: text(away),
            home_goals: Scalar::Integer(goals.0),
            away_goals: Scalar::Integer(goals.1),
            stadium: text("Maracanã"),
            city: text("Rio de Janeiro"),
            state: text("RJ"),
            referee: text("Raphael Claus"),
            attendance,
            revenue: Scalar::Decimal(1000.0),
        }
    }

    #[test]
    fn test_summary_statistics() {
        let rows = vec![
            cbf("2023-05-01", "Flamengo", "Palmeiras", (2, 1), Scalar::Integer(40000)),
            cbf("2023-04-15", "Palmeiras", "Santos", (0, 0), Scalar::Integer(20000)),
            cbf("2023-12-06", "Santos", "Flamengo", (1, 3), Scalar::Null),
        ];
        let summary = summarize(&rows);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.first_date.as_deref(), Some("2023-04-15"));
        assert_eq!(summary.last_date.as_deref(), Some("2023-12-06"));
        assert_eq!(summary.distinct_teams, 3);
        assert_eq!(summary.total_goals, 7.0);
        assert_eq!(summary.mean_attendance, Some(30000.0));
    }

    #[test]
    fn test_dates_compare_lexically() {
        // Not calendar aware: "2023-4-9" sorts after "2023-12-01"
        let rows = vec![
            cbf("2023-4-9", "A", "B", (0, 0), Scalar::Null),
            cbf("2023-12-01", "A", "B", (0, 0), Scalar::Null),
        ];
        let summary = summarize(&rows);
        assert_eq!(summary.first_date.as_deref(), Some("2023-12-01"));
        assert_eq!(summary.last_date.as_deref(), Some("2023-4-9"));
    }

    #[test]
    fn test_decimal_goals_are_counted() {
        let mut row = cbf("2023-04-15", "Flamengo", "Palmeiras", (0, 1), Scalar::Null);
        row.home_goals = Scalar::Decimal(2.5);
        let summary = summarize(&[row]);
        assert_eq!(summary.total_goals, 3.5);
        assert!(summary.to_string().contains("Total goals: 3.5"));
    }

    #[test]
    fn test_summary_serializes_for_structured_logs() {
        let rows = vec![cbf("2023-04-15", "Flamengo", "Palmeiras", (2, 1), Scalar::Integer(100))];
        let json = serde_json::to_value(summarize(&rows)).unwrap();
        assert_eq!(json["count"], 1);
        assert_eq!(json["total_goals"], 3.0);
        assert_eq!(json["mean_attendance"], 100.0);
    }

    #[test]
    fn test_numeric_team_names_count() {
        let mut row = cbf("2023-04-15", "Flamengo", "x", (0, 0), Scalar::Null);
        row.away_team = Scalar::Integer(1860);
        assert_eq!(summarize(&[row]).distinct_teams, 2);
    }

    #[test]
    fn test_empty_summary() {
        let summary = summarize::<MatchRow>(&[]);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.first_date, None);
        assert_eq!(summary.mean_attendance, None);
        assert!(summary.to_string().contains("Date range: n/a"));
    }

    #[test]
    fn test_fixture_rows_have_no_attendance() {
        let rows = vec![FixtureRow {
            date: text("2023-04-15"),
            home_team: text("Flamengo"),
            away_team: text("Palmeiras"),
            home_goals: Scalar::Null,
            away_goals: Scalar::Null,
            venue: text("Maracanã"),
        }];
        let summary = summarize(&rows);
        assert_eq!(summary.total_goals, 0.0);
        assert_eq!(summary.distinct_teams, 2);
        assert_eq!(summary.mean_attendance, None);
        assert!(summary.to_string().ends_with("Average attendance: n/a"));
    }
}
