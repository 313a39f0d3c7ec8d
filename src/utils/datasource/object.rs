use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::AppError;

pub const MIN_ROWS: u8 = 1;
pub const MAX_ROWS: u8 = 20;
pub const DEFAULT_ROWS: u8 = 5;

/// Number of rows a preview may return, always within `MIN_ROWS..=MAX_ROWS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RowCount(u8);

impl RowCount {
    pub fn new(n: i64) -> Result<Self, AppError> {
        if (MIN_ROWS as i64..=MAX_ROWS as i64).contains(&n) {
            Ok(RowCount(n as u8))
        } else {
            Err(AppError::InvalidRowCount(n))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for RowCount {
    fn default() -> Self {
        RowCount(DEFAULT_ROWS)
    }
}

impl fmt::Display for RowCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A table or view, optionally qualified by its schema.
///
/// Accepts `name`, `schema.name` and the bracketed `[schema].[name]` form.
/// Identifiers are never interpolated raw; the dialect quotes each part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectName {
    pub schema: Option<String>,
    pub name: String,
}

impl ObjectName {
    pub fn new(schema: Option<&str>, name: &str) -> Result<Self, AppError> {
        validate_part(name)?;
        if let Some(schema) = schema {
            validate_part(schema)?;
        }
        Ok(ObjectName {
            schema: schema.map(str::to_string),
            name: name.to_string(),
        })
    }

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let raw = raw.trim();
        let parts = split_parts(raw)?;
        match parts.as_slice() {
            [name] => ObjectName::new(None, name),
            [schema, name] => ObjectName::new(Some(schema), name),
            _ => Err(AppError::InvalidObjectName(format!(
                "{:?} has more than two parts",
                raw
            ))),
        }
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(schema) = &self.schema {
            write!(f, "[{}].", schema.replace(']', "]]"))?;
        }
        write!(f, "[{}]", self.name.replace(']', "]]"))
    }
}

impl FromStr for ObjectName {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectName::parse(s)
    }
}

impl TryFrom<String> for ObjectName {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ObjectName::parse(&value)
    }
}

impl From<ObjectName> for String {
    fn from(value: ObjectName) -> Self {
        value.to_string()
    }
}

fn validate_part(part: &str) -> Result<(), AppError> {
    if part.is_empty() {
        return Err(AppError::InvalidObjectName("empty identifier".to_string()));
    }
    if part.chars().any(char::is_control) {
        return Err(AppError::InvalidObjectName(format!(
            "{:?} contains control characters",
            part
        )));
    }
    Ok(())
}

fn split_parts(raw: &str) -> Result<Vec<String>, AppError> {
    let mut parts = Vec::new();
    let mut chars = raw.chars().peekable();

    loop {
        let mut part = String::new();
        match chars.peek() {
            Some('[') | Some('"') => {
                let close = if chars.next() == Some('[') { ']' } else { '"' };
                loop {
                    match chars.next() {
                        Some(c) if c == close => {
                            // Doubled closer is an escaped literal.
                            if chars.peek() == Some(&close) {
                                chars.next();
                                part.push(close);
                            } else {
                                break;
                            }
                        }
                        Some(c) => part.push(c),
                        None => {
                            return Err(AppError::InvalidObjectName(format!(
                                "unterminated identifier in {:?}",
                                raw
                            )))
                        }
                    }
                }
            }
            _ => {
                while let Some(&c) = chars.peek() {
                    if c == '.' {
                        break;
                    }
                    part.push(c);
                    chars.next();
                }
            }
        }
        parts.push(part);

        match chars.next() {
            Some('.') => continue,
            None => break,
            Some(c) => {
                return Err(AppError::InvalidObjectName(format!(
                    "unexpected {:?} in {:?}",
                    c, raw
                )))
            }
        }
    }

    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_count_bounds() {
        assert!(RowCount::new(0).is_err());
        assert!(RowCount::new(21).is_err());
        assert_eq!(RowCount::new(1).unwrap().get(), 1);
        assert_eq!(RowCount::new(20).unwrap().get(), 20);
        assert_eq!(RowCount::default().get(), 5);
    }

    #[test]
    fn test_parse_forms() {
        let plain = ObjectName::parse("V_Customers").unwrap();
        assert_eq!(plain.schema, None);
        assert_eq!(plain.name, "V_Customers");

        let dotted = ObjectName::parse("dmd.V_Customers").unwrap();
        assert_eq!(dotted.schema.as_deref(), Some("dmd"));

        let bracketed = ObjectName::parse("[dmd].[V BI Inv.Lines]").unwrap();
        assert_eq!(bracketed.schema.as_deref(), Some("dmd"));
        assert_eq!(bracketed.name, "V BI Inv.Lines");

        let quoted = ObjectName::parse(r#""odd""name""#).unwrap();
        assert_eq!(quoted.name, r#"odd"name"#);
    }

    #[test]
    fn test_display_round_trips_escaped_brackets() {
        let name = ObjectName::new(Some("dmd"), "weird]name").unwrap();
        assert_eq!(name.to_string(), "[dmd].[weird]]name]");
        assert_eq!(ObjectName::parse(&name.to_string()).unwrap(), name);
    }

    #[test]
    fn test_rejects_malformed_names() {
        assert!(ObjectName::parse("").is_err());
        assert!(ObjectName::parse("a.b.c").is_err());
        assert!(ObjectName::parse("[dmd].[open").is_err());
        assert!(ObjectName::parse("dmd.").is_err());
        assert!(ObjectName::parse("[x]y").is_err());
        assert!(ObjectName::parse("bad\nname").is_err());
    }
}
