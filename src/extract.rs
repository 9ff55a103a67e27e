use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{ExportError, Result};

/// One cell of an exported row.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    Decimal(f64),
    /// Key present with a `null` value, e.g. goals of an unplayed fixture.
    Null,
}

impl Scalar {
    /// Converts a JSON value; arrays and objects are not cells.
    ///
    /// Strings are classified exactly as [`Scalar::from_cell`] classifies the CSV
    /// field they are written as, so an export and its re-read hold equal cells.
    pub fn from_json(value: &Value) -> Option<Scalar> {
        match value {
            Value::Null => Some(Scalar::Null),
            Value::Bool(b) => Some(Scalar::Text(b.to_string())),
            Value::String(s) => Some(Scalar::from_cell(s)),
            Value::Number(n) => Some(match n.as_i64() {
                Some(i) => Scalar::Integer(i),
                None => Scalar::from_f64(n.as_f64()?),
            }),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Whole numbers in `i64` range are integers, e.g. a goal count sent as `2.0`.
    fn from_f64(f: f64) -> Scalar {
        if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
            Scalar::Integer(f as i64)
        } else {
            Scalar::Decimal(f)
        }
    }

    /// Classifies a CSV field written by [`crate::writer::write_csv`].
    ///
    /// A number is only recognised in the exact form it would be written in, so
    /// text such as `"007"` or `"1.50"` stays text.
    pub fn from_cell(cell: &str) -> Scalar {
        if cell.is_empty() {
            return Scalar::Null;
        }
        if let Ok(i) = cell.parse::<i64>() {
            if i.to_string() == cell {
                return Scalar::Integer(i);
            }
        }
        // "nan" and "inf" parse as floats but are team-name territory
        if cell.bytes().any(|b| b.is_ascii_digit()) {
            if let Ok(f) = cell.parse::<f64>() {
                if f.is_finite() && f.fract() != 0.0 && f.to_string() == cell {
                    return Scalar::Decimal(f);
                }
            }
        }
        Scalar::Text(cell.to_owned())
    }

    /// The cell as written, `None` for null. Used where any scalar acts as a name or key.
    pub fn as_key(&self) -> Option<String> {
        match self {
            Scalar::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Integer(i) => Some(*i as f64),
            Scalar::Decimal(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => f.write_str(s),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Decimal(d) => write!(f, "{}", d),
            Scalar::Null => Ok(()),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Scalar::Text(s) => serializer.serialize_str(s),
            Scalar::Integer(i) => serializer.serialize_i64(*i),
            Scalar::Decimal(d) => serializer.collect_str(d),
            Scalar::Null => serializer.serialize_none(),
        }
    }
}

/// A flat, fixed-column export row built from one upstream match record.
pub trait Row: Serialize + Sized {
    /// Header row, in column order.
    const HEADERS: &'static [&'static str];

    /// Builds the row by direct key lookup; any missing key fails the record.
    fn from_record(index: usize, record: &Value) -> Result<Self>;

    /// Rebuilds a row from cells in `HEADERS` order.
    fn from_cells(cells: Vec<Scalar>) -> Option<Self>;

    fn date(&self) -> &Scalar;
    fn home_team(&self) -> &Scalar;
    fn away_team(&self) -> &Scalar;
    fn home_goals(&self) -> &Scalar;
    fn away_goals(&self) -> &Scalar;

    fn attendance(&self) -> Option<&Scalar> {
        None
    }
}

/// Follows `path` through nested objects.
fn lookup<'a>(record: &'a Value, index: usize, path: &[&str]) -> Result<&'a Value> {
    let mut value = record;
    for key in path {
        value = value
            .get(*key)
            .ok_or_else(|| ExportError::malformed(index, path.join(".")))?;
    }
    Ok(value)
}

fn scalar(record: &Value, index: usize, path: &[&str]) -> Result<Scalar> {
    Scalar::from_json(lookup(record, index, path)?)
        .ok_or_else(|| ExportError::malformed(index, path.join(".")))
}

/// A CBF match row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRow {
    #[serde(rename = "data")]
    pub date: Scalar,
    #[serde(rename = "rodada")]
    pub round: Scalar,
    #[serde(rename = "time_casa")]
    pub home_team: Scalar,
    #[serde(rename = "time_visitante")]
    pub away_team: Scalar,
    #[serde(rename = "gols_casa")]
    pub home_goals: Scalar,
    #[serde(rename = "gols_visitante")]
    pub away_goals: Scalar,
    #[serde(rename = "estadio")]
    pub stadium: Scalar,
    #[serde(rename = "cidade")]
    pub city: Scalar,
    #[serde(rename = "estado")]
    pub state: Scalar,
    #[serde(rename = "arbitro")]
    pub referee: Scalar,
    #[serde(rename = "publico")]
    pub attendance: Scalar,
    #[serde(rename = "renda")]
    pub revenue: Scalar,
}

impl Row for MatchRow {
    const HEADERS: &'static [&'static str] = &[
        "data",
        "rodada",
        "time_casa",
        "time_visitante",
        "gols_casa",
        "gols_visitante",
        "estadio",
        "cidade",
        "estado",
        "arbitro",
        "publico",
        "renda",
    ];

    fn from_record(index: usize, record: &Value) -> Result<Self> {
        Ok(MatchRow {
            date: scalar(record, index, &["date"])?,
            round: scalar(record, index, &["round"])?,
            home_team: scalar(record, index, &["home_team", "name"])?,
            away_team: scalar(record, index, &["away_team", "name"])?,
            home_goals: scalar(record, index, &["home_score"])?,
            away_goals: scalar(record, index, &["away_score"])?,
            stadium: scalar(record, index, &["stadium", "name"])?,
            city: scalar(record, index, &["stadium", "city"])?,
            state: scalar(record, index, &["stadium", "state"])?,
            referee: scalar(record, index, &["referee", "name"])?,
            attendance: scalar(record, index, &["attendance"])?,
            revenue: scalar(record, index, &["revenue"])?,
        })
    }

    fn from_cells(cells: Vec<Scalar>) -> Option<Self> {
        let mut cells = cells.into_iter();
        Some(MatchRow {
            date: cells.next()?,
            round: cells.next()?,
            home_team: cells.next()?,
            away_team: cells.next()?,
            home_goals: cells.next()?,
            away_goals: cells.next()?,
            stadium: cells.next()?,
            city: cells.next()?,
            state: cells.next()?,
            referee: cells.next()?,
            attendance: cells.next()?,
            revenue: cells.next()?,
        })
    }

    fn date(&self) -> &Scalar {
        &self.date
    }
    fn home_team(&self) -> &Scalar {
        &self.home_team
    }
    fn away_team(&self) -> &Scalar {
        &self.away_team
    }
    fn home_goals(&self) -> &Scalar {
        &self.home_goals
    }
    fn away_goals(&self) -> &Scalar {
        &self.away_goals
    }
    fn attendance(&self) -> Option<&Scalar> {
        Some(&self.attendance)
    }
}

/// An API-Football fixture row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixtureRow {
    #[serde(rename = "Data")]
    pub date: Scalar,
    #[serde(rename = "Time Casa")]
    pub home_team: Scalar,
    #[serde(rename = "Time Visitante")]
    pub away_team: Scalar,
    #[serde(rename = "Placar Casa")]
    pub home_goals: Scalar,
    #[serde(rename = "Placar Visitante")]
    pub away_goals: Scalar,
    #[serde(rename = "Estádio")]
    pub venue: Scalar,
}

impl Row for FixtureRow {
    const HEADERS: &'static [&'static str] = &[
        "Data",
        "Time Casa",
        "Time Visitante",
        "Placar Casa",
        "Placar Visitante",
        "Estádio",
    ];

    fn from_record(index: usize, record: &Value) -> Result<Self> {
        // "2023-04-15T21:30:00+00:00" -> "2023-04-15"
        let date = match scalar(record, index, &["fixture", "date"])? {
            Scalar::Text(s) => Scalar::Text(s.chars().take(10).collect()),
            _ => return Err(ExportError::malformed(index, "fixture.date")),
        };
        Ok(FixtureRow {
            date,
            home_team: scalar(record, index, &["teams", "home", "name"])?,
            away_team: scalar(record, index, &["teams", "away", "name"])?,
            home_goals: scalar(record, index, &["goals", "home"])?,
            away_goals: scalar(record, index, &["goals", "away"])?,
            venue: scalar(record, index, &["fixture", "venue", "name"])?,
        })
    }

    fn from_cells(cells: Vec<Scalar>) -> Option<Self> {
        let mut cells = cells.into_iter();
        Some(FixtureRow {
            date: cells.next()?,
            home_team: cells.next()?,
            away_team: cells.next()?,
            home_goals: cells.next()?,
            away_goals: cells.next()?,
            venue: cells.next()?,
        })
    }

    fn date(&self) -> &Scalar {
        &self.date
    }
    fn home_team(&self) -> &Scalar {
        &self.home_team
    }
    fn away_team(&self) -> &Scalar {
        &self.away_team
    }
    fn home_goals(&self) -> &Scalar {
        &self.home_goals
    }
    fn away_goals(&self) -> &Scalar {
        &self.away_goals
    }
}

/// Maps every record or none: the first malformed record aborts the whole batch.
pub fn extract_rows<R: Row>(records: &[Value]) -> Result<Vec<R>> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| R::from_record(index, record))
        .collect()
}
