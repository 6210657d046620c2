/// The accumulating output object of a generator call
use serde::Serialize;
use serde_json::{Map, Value};

/// Field name reserved for the accumulated tag list
pub const TAGS_KEY: &str = "tags";

/// A composed result: the accumulated tags plus one field per source
///
/// Serializes to a flat JSON object with `tags` first and the remaining
/// fields in the order they were first assigned.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    pub tags: Vec<String>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Record {
    /// Create an empty record (`{"tags": []}`)
    pub fn new() -> Self {
        Record::default()
    }

    /// Build a record from an arbitrary JSON value
    ///
    /// A non-object value yields an empty record. A `tags` field that is not
    /// an array is reset to an empty list; non-string entries of a `tags`
    /// array are dropped. Every other field is kept as-is.
    pub fn from_value(value: Value) -> Self {
        let mut record = Record::new();
        if let Value::Object(map) = value {
            for (key, value) in map {
                record.assign(key, value);
            }
        }
        record
    }

    /// Set a field, builder style
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assign(key.into(), value.into());
        self
    }

    /// Set a field, returning the previous value
    ///
    /// Assigning to `tags` replaces the tag list following the same rules
    /// as [`Record::from_value`].
    pub fn assign(&mut self, key: String, value: Value) -> Option<Value> {
        if key == TAGS_KEY {
            let previous = Value::from(std::mem::take(&mut self.tags));
            self.tags = tags_from_value(value);
            return Some(previous);
        }
        self.fields.insert(key, value)
    }

    /// Get a field by name (`tags` is not a field; use [`Record::tags`])
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Check whether a field has been assigned, even if its value is null
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// The accumulated tags
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Iterate over the non-tag fields in assignment order
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Merge extra fields in; fields the record already has are left untouched
    pub(crate) fn merge_defaults(&mut self, extra: &Map<String, Value>) {
        for (key, value) in extra {
            if key == TAGS_KEY {
                continue;
            }
            self.fields
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }

    /// Remove repeated tags, keeping the first occurrence of each
    pub(crate) fn dedup_tags(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.tags.retain(|tag| seen.insert(tag.clone()));
    }

    /// Convert into a JSON object
    pub fn into_value(self) -> Value {
        let mut map = Map::with_capacity(self.fields.len() + 1);
        map.insert(TAGS_KEY.to_string(), Value::from(self.tags));
        map.extend(self.fields);
        Value::Object(map)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        record.into_value()
    }
}

fn tags_from_value(value: Value) -> Vec<String> {
    match value {
        Value::Array(entries) => entries
            .into_iter()
            .filter_map(|entry| match entry {
                Value::String(tag) => Some(tag),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_resets_bad_tags() {
        let record = Record::from_value(json!({"tags": "oops", "size": "small"}));
        assert!(record.tags().is_empty());
        assert_eq!(record.get("size"), Some(&json!("small")));
    }

    #[test]
    fn test_from_value_keeps_string_tags() {
        let record = Record::from_value(json!({"tags": ["a", 1, "b"]}));
        assert_eq!(record.tags(), ["a", "b"]);
    }

    #[test]
    fn test_from_non_object() {
        assert_eq!(Record::from_value(json!([1, 2])), Record::new());
    }

    #[test]
    fn test_merge_defaults_keeps_existing() {
        let mut record = Record::new().with_field("k", "mine");
        let extra = json!({"k": "theirs", "extra": 1, "tags": ["x"]});
        record.merge_defaults(extra.as_object().unwrap());
        assert_eq!(record.get("k"), Some(&json!("mine")));
        assert_eq!(record.get("extra"), Some(&json!(1)));
        assert!(record.tags().is_empty());
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let mut record = Record::new();
        record.tags = vec!["b".into(), "a".into(), "b".into(), "c".into(), "a".into()];
        record.dedup_tags();
        assert_eq!(record.tags(), ["b", "a", "c"]);
    }

    #[test]
    fn test_serialize_tags_first() {
        let record = Record::new().with_field("size", "large").with_field("color", "red");
        let text = serde_json::to_string(&record).unwrap();
        assert_eq!(text, r#"{"tags":[],"size":"large","color":"red"}"#);
        assert_eq!(record.into_value(), json!({"tags": [], "size": "large", "color": "red"}));
    }
}
