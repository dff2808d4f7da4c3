use regex::RegexBuilder;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{Record, Value};
use crate::query::ast::{Condition, Operator, Predicate};

/// Record matcher - evaluates WHERE predicates against a record
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordMatcher;

impl RecordMatcher {
    pub fn new() -> Self {
        RecordMatcher
    }

    /// Check if record satisfies the predicate.
    /// AND stops at the first false child, OR at the first true one.
    pub fn matches(&self, record: &Record, predicate: &Predicate) -> Result<bool> {
        match predicate {
            Predicate::Compare(condition) => self.matches_condition(record, condition),

            Predicate::And(children) => {
                for child in children {
                    if !self.matches(record, child)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }

            Predicate::Or(children) => {
                for child in children {
                    if self.matches(record, child)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Optional predicate: no filter matches everything
    pub fn accepts(&self, record: &Record, predicate: Option<&Predicate>) -> Result<bool> {
        match predicate {
            Some(predicate) => self.matches(record, predicate),
            None => Ok(true),
        }
    }

    pub fn matches_condition(&self, record: &Record, condition: &Condition) -> Result<bool> {
        let field = record.get(&condition.column);

        match condition.operator {
            Operator::Eq => Ok(display(field) == condition.value),
            Operator::Ne => Ok(display(field) != condition.value),
            Operator::Like => self.matches_like(field, &condition.value),
            op => {
                let left = numeric_operand(field, condition)?;
                let right = condition.value.trim().parse::<f64>().map_err(|_| {
                    Error::new(
                        ErrorKind::Evaluation,
                        format!(
                            "Cannot compare '{}' using {}: '{}' is not a number",
                            condition.column, op, condition.value
                        ),
                    )
                })?;
                Ok(match op {
                    Operator::Gt => left > right,
                    Operator::Lt => left < right,
                    Operator::Gte => left >= right,
                    Operator::Lte => left <= right,
                    _ => unreachable!("non-numeric operators handled above"),
                })
            }
        }
    }

    /// SQL LIKE: `%` any run, `_` one character, case-insensitive
    fn matches_like(&self, field: Option<&Value>, pattern: &str) -> Result<bool> {
        let Some(value) = field else { return Ok(false) };

        let mut regex_pattern = String::with_capacity(pattern.len() + 8);
        regex_pattern.push('^');
        for ch in pattern.chars() {
            match ch {
                '%' => regex_pattern.push_str(".*"),
                '_' => regex_pattern.push('.'),
                c => regex_pattern.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
            }
        }
        regex_pattern.push('$');

        let regex = RegexBuilder::new(&regex_pattern)
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| Error::new(ErrorKind::Evaluation, format!("Invalid LIKE pattern: {}", e)))?;
        Ok(regex.is_match(&value.to_string()))
    }
}

fn display(field: Option<&Value>) -> String {
    field.map(Value::to_string).unwrap_or_default()
}

fn numeric_operand(field: Option<&Value>, condition: &Condition) -> Result<f64> {
    let value = field.ok_or_else(|| {
        Error::new(
            ErrorKind::Evaluation,
            format!(
                "Cannot compare '{}' using {}: column has no value",
                condition.column, condition.operator
            ),
        )
    })?;
    value.as_number().ok_or_else(|| {
        Error::new(
            ErrorKind::Evaluation,
            format!(
                "Cannot compare '{}' using {}: '{}' is not a number",
                condition.column, condition.operator, value
            ),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Record {
        [
            ("id", Value::Integer(1)),
            ("name", Value::text("Alice")),
            ("score", Value::Float(1.0)),
            ("age", Value::text("41")),
        ]
        .into_iter()
        .collect()
    }

    fn check(column: &str, operator: Operator, value: &str) -> Result<bool> {
        RecordMatcher::new().matches_condition(&record(), &Condition::new(column, operator, value))
    }

    #[test]
    fn test_equality_is_string_based() {
        assert!(check("id", Operator::Eq, "1").unwrap());
        assert!(!check("score", Operator::Eq, "1").unwrap());
        assert!(check("score", Operator::Eq, "1.0").unwrap());
        assert!(check("name", Operator::Ne, "Bob").unwrap());
        assert!(!check("missing", Operator::Eq, "x").unwrap());
        assert!(check("missing", Operator::Ne, "x").unwrap());
    }

    #[test]
    fn test_numeric_comparisons_parse_text() {
        assert!(check("age", Operator::Gt, "40").unwrap());
        assert!(check("age", Operator::Lte, "41").unwrap());
        assert!(!check("id", Operator::Lt, "1").unwrap());
    }

    #[test]
    fn test_numeric_comparison_errors_propagate() {
        assert_eq!(check("missing", Operator::Gt, "1").unwrap_err().kind, ErrorKind::Evaluation);
        assert_eq!(check("name", Operator::Gt, "1").unwrap_err().kind, ErrorKind::Evaluation);
        assert_eq!(check("id", Operator::Gt, "abc").unwrap_err().kind, ErrorKind::Evaluation);
    }

    #[test]
    fn test_like_patterns() {
        assert!(check("name", Operator::Like, "a%").unwrap());
        assert!(check("name", Operator::Like, "_lic_").unwrap());
        assert!(!check("name", Operator::Like, "ali").unwrap());
        assert!(!check("missing", Operator::Like, "%").unwrap());
        assert!(check("score", Operator::Like, "1.%").unwrap());
    }

    #[test]
    fn test_or_short_circuits_before_error() {
        let predicate = Predicate::Or(vec![
            Condition::new("id", Operator::Eq, "1").into(),
            Condition::new("missing", Operator::Gt, "3").into(),
        ]);
        assert!(RecordMatcher::new().matches(&record(), &predicate).unwrap());

        let predicate = Predicate::And(vec![
            Condition::new("id", Operator::Eq, "2").into(),
            Condition::new("missing", Operator::Gt, "3").into(),
        ]);
        assert!(!RecordMatcher::new().matches(&record(), &predicate).unwrap());
    }
}
