//! Parameter interpolation
//!
//! Bound parameters are spliced back into the SQL template so the statement
//! parser sees literal values. Substitution follows a fixed contract:
//!
//! - parameters are applied in the order supplied
//! - each parameter replaces only the first remaining match of its
//!   placeholder (`:name` or `?`)
//! - placeholders without a value, and values without a placeholder, are
//!   left alone: the result degrades silently and is never an error
//!
//! The output is only ever fed to the parser. It is never executed.

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::{NoExpand, Regex};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

/// Timestamp layout used when rendering date/time parameters
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A bound parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Rendered as a `','` joined fragment for IN-lists
    List(Vec<ParamValue>),
    Timestamp(NaiveDateTime),
}

impl ParamValue {
    /// Literal text substituted for the placeholder
    ///
    /// Text is inserted unquoted; templates are expected to carry their own
    /// quotes around string placeholders.
    pub fn render(&self) -> String {
        match self {
            ParamValue::Null => "NULL".to_string(),
            ParamValue::Bool(true) => "1".to_string(),
            ParamValue::Bool(false) => "0".to_string(),
            ParamValue::Int(v) => v.to_string(),
            ParamValue::Float(v) => v.to_string(),
            ParamValue::Text(v) => v.clone(),
            ParamValue::List(items) => items
                .iter()
                .map(ParamValue::render)
                .collect::<Vec<_>>()
                .join("','"),
            ParamValue::Timestamp(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Convert a JSON value; objects are kept as their JSON text
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => ParamValue::Null,
            JsonValue::Bool(b) => ParamValue::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => ParamValue::Int(i),
                None => ParamValue::Float(n.as_f64().unwrap_or_default()),
            },
            JsonValue::String(s) => ParamValue::Text(s.clone()),
            JsonValue::Array(items) => {
                ParamValue::List(items.iter().map(ParamValue::from_json).collect())
            }
            JsonValue::Object(_) => ParamValue::Text(value.to_string()),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(i64::from(v))
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<NaiveDateTime> for ParamValue {
    fn from(v: NaiveDateTime) -> Self {
        ParamValue::Timestamp(v)
    }
}

impl From<DateTime<Utc>> for ParamValue {
    fn from(v: DateTime<Utc>) -> Self {
        ParamValue::Timestamp(v.naive_utc())
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(ParamValue::Null)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(v: Vec<T>) -> Self {
        ParamValue::List(v.into_iter().map(Into::into).collect())
    }
}

/// Parameters bound to a statement
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// `:name` placeholders, applied in insertion order
    Named(Vec<(String, ParamValue)>),
    /// `?` placeholders, applied left to right
    Positional(Vec<ParamValue>),
}

impl Params {
    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParamValue>,
    {
        Params::Named(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        Params::Positional(values.into_iter().map(Into::into).collect())
    }

    /// JSON object → named, JSON array → positional, anything else → `None`
    ///
    /// Object keys keep their document order.
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Object(map) => Some(Params::Named(
                map.iter()
                    .map(|(k, v)| (k.clone(), ParamValue::from_json(v)))
                    .collect(),
            )),
            JsonValue::Array(items) => Some(Params::Positional(
                items.iter().map(ParamValue::from_json).collect(),
            )),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Params::Named(pairs) => pairs.is_empty(),
            Params::Positional(values) => values.is_empty(),
        }
    }
}

/// Substitute parameter values into `sql`
pub fn interpolate(sql: &str, params: &Params) -> String {
    let mut query = sql.to_string();
    let mut unmatched = 0usize;

    match params {
        Params::Named(pairs) => {
            for (name, value) in pairs {
                let name = name.trim_start_matches(':');
                let pattern = match Regex::new(&format!(r":{}\b", regex::escape(name))) {
                    Ok(pattern) => pattern,
                    Err(e) => {
                        warn!(param = %name, error = %e, "Skipping parameter with unusable name");
                        unmatched += 1;
                        continue;
                    }
                };

                if pattern.is_match(&query) {
                    query = pattern
                        .replacen(&query, 1, NoExpand(&value.render()))
                        .into_owned();
                } else {
                    unmatched += 1;
                }
            }
        }
        Params::Positional(values) => {
            for value in values {
                match query.find('?') {
                    Some(pos) => query.replace_range(pos..pos + 1, &value.render()),
                    None => unmatched += 1,
                }
            }
        }
    }

    if unmatched > 0 {
        warn!(unmatched, "Parameters without a matching placeholder were ignored");
    }
    debug!(sql = %query, "Interpolated statement");

    query
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_named_integer() {
        let sql = interpolate("WHERE id = :id", &Params::named([("id", 5)]));
        assert_eq!(sql, "WHERE id = 5");
    }

    #[test]
    fn test_named_null() {
        let sql = interpolate("WHERE id = :id", &Params::named([("id", ParamValue::Null)]));
        assert_eq!(sql, "WHERE id = NULL");
    }

    #[test]
    fn test_list_renders_in_list_fragment() {
        let sql = interpolate(
            "WHERE id IN (':ids')",
            &Params::named([("ids", vec![1, 2, 3])]),
        );
        assert_eq!(sql, "WHERE id IN ('1','2','3')");
        assert_eq!(ParamValue::from(vec![1, 2, 3]).render(), "1','2','3");
    }

    #[test]
    fn test_timestamp_renders_as_datetime() {
        let ts = NaiveDate::from_ymd_opt(2017, 1, 29)
            .unwrap()
            .and_hms_opt(14, 29, 5)
            .unwrap();
        let sql = interpolate("SET at = ':at'", &Params::named([("at", ts)]));
        assert_eq!(sql, "SET at = '2017-01-29 14:29:05'");
    }

    #[test]
    fn test_text_is_unquoted() {
        let sql = interpolate("SET name = ':name'", &Params::named([("name", "Bob")]));
        assert_eq!(sql, "SET name = 'Bob'");
    }

    #[test]
    fn test_named_replaces_first_match_only() {
        let sql = interpolate("a = :v OR b = :v", &Params::named([("v", 1)]));
        assert_eq!(sql, "a = 1 OR b = :v");
    }

    #[test]
    fn test_named_does_not_touch_longer_names() {
        let sql = interpolate(
            "a = :id_parent AND b = :id",
            &Params::named([("id", 1), ("id_parent", 2)]),
        );
        assert_eq!(sql, "a = 2 AND b = 1");
    }

    #[test]
    fn test_named_accepts_colon_prefixed_keys() {
        let sql = interpolate("WHERE id = :id", &Params::named([(":id", 9)]));
        assert_eq!(sql, "WHERE id = 9");
    }

    #[test]
    fn test_positional_in_order() {
        let sql = interpolate(
            "INSERT INTO t (a, b) VALUES (?, '?')",
            &Params::positional([ParamValue::from(1), ParamValue::from("x")]),
        );
        assert_eq!(sql, "INSERT INTO t (a, b) VALUES (1, 'x')");
    }

    #[test]
    fn test_count_mismatch_degrades_silently() {
        let fewer = interpolate("VALUES (?, ?, ?)", &Params::positional([1, 2]));
        assert_eq!(fewer, "VALUES (1, 2, ?)");

        let more = interpolate("VALUES (?)", &Params::positional([1, 2, 3]));
        assert_eq!(more, "VALUES (1)");

        let missing = interpolate("WHERE id = :id", &Params::named([("other", 1)]));
        assert_eq!(missing, "WHERE id = :id");
    }

    #[test]
    fn test_regex_metacharacters_in_values_are_literal() {
        let sql = interpolate("SET v = ':v'", &Params::named([("v", "$1 ${name}")]));
        assert_eq!(sql, "SET v = '$1 ${name}'");
    }

    #[test]
    fn test_params_from_json() {
        let named = Params::from_json(&json!({"id": 5, "name": null})).unwrap();
        assert!(matches!(named, Params::Named(ref pairs) if pairs.len() == 2));

        let positional = Params::from_json(&json!([1, "a", [1, 2], true])).unwrap();
        assert_eq!(
            positional,
            Params::Positional(vec![
                ParamValue::Int(1),
                ParamValue::Text("a".to_string()),
                ParamValue::List(vec![ParamValue::Int(1), ParamValue::Int(2)]),
                ParamValue::Bool(true),
            ])
        );

        assert!(Params::from_json(&json!("nope")).is_none());
    }

    #[test]
    fn test_json_object_applies_in_document_order() {
        let value: JsonValue = serde_json::from_str(r#"{"zeta": ":alpha", "alpha": "1"}"#).unwrap();
        let params = Params::from_json(&value).unwrap();

        let Params::Named(ref pairs) = params else {
            panic!("expected named parameters");
        };
        let names: Vec<&str> = pairs.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["zeta", "alpha"]);

        assert_eq!(interpolate("a = :zeta", &params), "a = 1");
    }
}
