use std::fmt;

use serde::Serialize;

/// A literal value carried by constants and plugin captures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    /// Time of day in seconds since midnight.
    Time(u32),
    /// Calendar date; the year is optional (`june 5`).
    Date {
        year: Option<i32>,
        month: u32,
        day: u32,
    },
    List(Vec<Self>),
}

impl Value {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "\"{}\"", escape(s)),
            Self::Time(secs) => write!(f, "{:02}:{:02}", secs / 3600, secs % 3600 / 60),
            Self::Date {
                year: Some(y),
                month,
                day,
            } => write!(f, "{y:04}-{month:02}-{day:02}"),
            Self::Date {
                year: None,
                month,
                day,
            } => write!(f, "--{month:02}-{day:02}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}
