//! Model schema declaration and record (de)serialization.
//!
//! A model type declares its remote resource name, URL template and field
//! schema by implementing [`Model`]. Deserialization iterates the declared
//! schema, not arbitrary JSON keys: each [`FieldDef`] names a field and
//! carries a getter plus a setter that may transform the raw value (dates,
//! nested lookups). The raw record as last received from the server is kept
//! in [`ModelState`] so partial updates can send a delta only.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::resource::ResourceSet;

/// One declared field: name, getter, setter.
///
/// The setter receives the raw value and the whole record, mirroring
/// transform hooks that need sibling fields for context.
pub struct FieldDef<M> {
    pub name: &'static str,
    pub get: fn(&M) -> Option<Value>,
    pub set: fn(&mut M, &Value, &Map<String, Value>) -> Result<()>,
}

impl<M> FieldDef<M> {
    pub fn new(
        name: &'static str,
        get: fn(&M) -> Option<Value>,
        set: fn(&mut M, &Value, &Map<String, Value>) -> Result<()>,
    ) -> Self {
        Self { name, get, set }
    }
}

/// Per-instance bookkeeping: the record as last received from the server.
/// Embed one of these in every model struct and return it from
/// [`Model::state`] / [`Model::state_mut`].
#[derive(Debug, Clone, Default)]
pub struct ModelState {
    pub(crate) initial: Option<Map<String, Value>>,
}

impl ModelState {
    /// The server baseline used for delta computation, if the instance was
    /// ever deserialized.
    pub fn initial(&self) -> Option<&Map<String, Value>> {
        self.initial.as_ref()
    }
}

pub trait Model: Default + Clone + 'static {
    /// Lowercase singular resource name, e.g. `"book"`.
    fn resource_name() -> &'static str;

    /// The declared field schema.
    fn fields() -> &'static [FieldDef<Self>];

    fn state(&self) -> &ModelState;
    fn state_mut(&mut self) -> &mut ModelState;

    /// Whether [`Model::save`] is allowed at all. Defaults to read-only.
    fn can_save() -> bool {
        false
    }

    /// Resource collection URL. Override to insert `{key}` placeholders that
    /// filter values are substituted into, e.g.
    /// `format!("{}books/{{author_pk}}/reviews/", config.base_url)`.
    fn url(config: &ClientConfig) -> String {
        format!("{}{}s/", config.base_url, Self::resource_name())
    }

    /// Hook run over serialized payloads before POST/PATCH. Identity by
    /// default.
    fn validate(data: Map<String, Value>) -> Result<Map<String, Value>> {
        Ok(data)
    }

    /// The primary-key-like identifier; `None` or a falsy value means the
    /// record was never persisted. Defaults to the declared `id` field.
    fn pk(&self) -> Option<Value> {
        Self::fields()
            .iter()
            .find(|field| field.name == "id")
            .and_then(|field| (field.get)(self))
    }

    /// Apply a raw server record through the declared schema, recording it
    /// as the baseline for later delta computation.
    fn deserialize(&mut self, data: &Map<String, Value>) -> Result<()> {
        self.state_mut().initial = Some(data.clone());
        for field in Self::fields() {
            if let Some(value) = data.get(field.name) {
                (field.set)(self, value, data)?;
            }
        }
        Ok(())
    }

    /// Collect all declared fields that currently hold a value.
    fn serialize(&self) -> Map<String, Value> {
        let mut data = Map::new();
        for field in Self::fields() {
            if let Some(value) = (field.get)(self) {
                data.insert(field.name.to_string(), value);
            }
        }
        data
    }

    /// The delta against the server baseline, for PATCH requests.
    ///
    /// A field counts as changed when the baseline value is absent or falsy,
    /// or differs from the current value. Server baselines arrive as
    /// loosely-typed JSON, so the rule is deliberately loose.
    fn serialize_changed(&self) -> Map<String, Value> {
        let current = self.serialize();
        let Some(initial) = self.state().initial.clone() else {
            return current;
        };
        current
            .into_iter()
            .filter(|(key, value)| match initial.get(key) {
                Some(baseline) => is_falsy(baseline) || baseline != value,
                None => true,
            })
            .collect()
    }

    /// Persist this record: POST when it has no identifier, PATCH of the
    /// delta otherwise. Errors unless the model is marked persistable.
    fn save(&mut self, config: &ClientConfig) -> Result<()> {
        if !Self::can_save() {
            return Err(Error::CantSave(Self::resource_name()));
        }
        ResourceSet::<Self>::new(config.clone()).save(self)
    }

    fn delete(&self, config: &ClientConfig) -> Result<()> {
        ResourceSet::<Self>::new(config.clone()).delete(self)
    }
}

/// Python-style truthiness over JSON values; the delta rule and identifier
/// checks both use it.
pub(crate) fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(m) => m.is_empty(),
    }
}

/// Render a JSON value as URL/display text: strings unquoted, everything
/// else in JSON notation.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse a server datetime string, anchoring naive values to the given
/// timezone. Accepts RFC 3339 plus the common naive formats development
/// servers emit.
pub fn parse_datetime_in(tz: Tz, raw: &str) -> Result<DateTime<Tz>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&tz));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN)));
    match naive {
        Ok(naive) => naive
            .and_local_timezone(tz)
            .earliest()
            .ok_or_else(|| Error::field("datetime", format!("{:?} is not a valid local time", raw))),
        Err(_) => Err(Error::field(
            "datetime",
            format!("unrecognized datetime {:?}", raw),
        )),
    }
}

/// Like [`parse_datetime_in`] with naive values anchored to UTC.
pub fn parse_datetime(raw: &str) -> Result<DateTime<Utc>> {
    parse_datetime_in(chrono_tz::UTC, raw).map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use serde_json::json;

    #[derive(Debug, Clone, Default)]
    struct Book {
        id: Option<i64>,
        name: Option<String>,
        rating: Option<i64>,
        state: ModelState,
    }

    impl Model for Book {
        fn resource_name() -> &'static str {
            "book"
        }

        fn can_save() -> bool {
            true
        }

        fn fields() -> &'static [FieldDef<Self>] {
            static FIELDS: Lazy<Vec<FieldDef<Book>>> = Lazy::new(|| {
                vec![
                    FieldDef::new(
                        "id",
                        |m| m.id.map(Value::from),
                        |m, v, _| {
                            m.id = v.as_i64();
                            Ok(())
                        },
                    ),
                    FieldDef::new(
                        "name",
                        |m| m.name.clone().map(Value::from),
                        |m, v, _| {
                            m.name = v.as_str().map(str::to_string);
                            Ok(())
                        },
                    ),
                    FieldDef::new(
                        "rating",
                        |m| m.rating.map(Value::from),
                        |m, v, _| {
                            m.rating = v.as_i64();
                            Ok(())
                        },
                    ),
                ]
            });
            &FIELDS
        }

        fn state(&self) -> &ModelState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut ModelState {
            &mut self.state
        }
    }

    fn record(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn deserialize_applies_declared_fields_only() {
        let mut book = Book::default();
        book.deserialize(&record(json!({
            "id": 3,
            "name": "Dune",
            "publisher": "ignored, not in the schema"
        })))
        .unwrap();
        assert_eq!(book.id, Some(3));
        assert_eq!(book.name.as_deref(), Some("Dune"));
        assert_eq!(book.rating, None);
        assert!(book.state().initial().unwrap().contains_key("publisher"));
    }

    #[test]
    fn unmodified_record_has_empty_delta() {
        let mut book = Book::default();
        book.deserialize(&record(json!({"id": 3, "name": "Dune", "rating": 5})))
            .unwrap();
        assert!(book.serialize_changed().is_empty());
    }

    #[test]
    fn delta_contains_only_the_mutated_field() {
        let mut book = Book::default();
        book.deserialize(&record(json!({"id": 3, "name": "Dune", "rating": 5})))
            .unwrap();
        book.name = Some("Dune Messiah".to_string());
        let delta = book.serialize_changed();
        assert_eq!(delta.len(), 1);
        assert_eq!(delta["name"], json!("Dune Messiah"));
    }

    #[test]
    fn never_deserialized_record_serializes_fully() {
        let book = Book {
            name: Some("Dune".to_string()),
            rating: Some(5),
            ..Book::default()
        };
        let delta = book.serialize_changed();
        assert_eq!(delta.len(), 2);
        assert!(!delta.contains_key("id"));
    }

    #[test]
    fn falsy_baseline_counts_as_changed() {
        let mut book = Book::default();
        book.deserialize(&record(json!({"id": 3, "rating": 0})))
            .unwrap();
        // rating baseline is falsy, so it re-appears in the delta even
        // though the value is identical
        assert_eq!(book.serialize_changed()["rating"], json!(0));
    }

    #[test]
    fn pk_defaults_to_the_id_field() {
        let mut book = Book::default();
        assert!(book.pk().is_none());
        book.id = Some(9);
        assert_eq!(book.pk(), Some(json!(9)));
    }

    #[test]
    fn falsy_values() {
        for value in [json!(null), json!(false), json!(0), json!(""), json!([]), json!({})] {
            assert!(is_falsy(&value), "{value} should be falsy");
        }
        for value in [json!(true), json!(1), json!("x"), json!([0]), json!({"a": 0})] {
            assert!(!is_falsy(&value), "{value} should be truthy");
        }
    }

    #[test]
    fn datetime_parsing_accepts_common_shapes() {
        let tz = chrono_tz::Europe::London;
        assert!(parse_datetime_in(tz, "2024-06-01T12:30:00Z").is_ok());
        assert!(parse_datetime_in(tz, "2024-06-01T12:30:00+02:00").is_ok());
        assert!(parse_datetime_in(tz, "2024-06-01T12:30:00").is_ok());
        assert!(parse_datetime_in(tz, "2024-06-01 12:30:00").is_ok());
        assert!(parse_datetime_in(tz, "2024-06-01").is_ok());
        assert!(parse_datetime_in(tz, "junk").is_err());
    }

    #[test]
    fn naive_datetimes_anchor_to_the_zone() {
        let parsed = parse_datetime_in(chrono_tz::Europe::London, "2024-01-15T09:00:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-01-15T09:00:00+00:00");
    }
}
