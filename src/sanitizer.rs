/// Sanitizer turns raw JSON source definitions into normalized sources
use crate::record::TAGS_KEY;
use crate::source::{Item, ItemValue, Source};
use serde_json::{Map, Value};
use tracing::debug;

/// The list-valued item fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Not,
    Only,
    Tags,
}

impl ItemField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemField::Not => "not",
            ItemField::Only => "only",
            ItemField::Tags => "tags",
        }
    }
}

/// One step of a JSON path into the definitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Index(usize),
    Key(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SanitizeError {
    SourcesNotArray,
    SourceNotObject {
        source: usize,
    },
    InvalidSourceName {
        source: usize,
    },
    ReservedSourceName {
        source: usize,
    },
    ItemsNotArray {
        source: usize,
    },
    ItemNotObject {
        source: usize,
        item: usize,
    },
    AddNotObject {
        source: usize,
        item: usize,
    },
    FieldNotArray {
        field: ItemField,
        source: usize,
        item: usize,
    },
    TagNotString {
        field: ItemField,
        source: usize,
        item: usize,
        index: usize,
    },
    InvalidWeight {
        source: usize,
        item: usize,
    },
}

impl std::fmt::Display for SanitizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SanitizeError::SourcesNotArray => write!(f, "Sources must be an array"),
            SanitizeError::SourceNotObject { .. } => write!(f, "Each source must be an object"),
            SanitizeError::InvalidSourceName { .. } => {
                write!(f, "Source \"name\" property must be a string or a number")
            }
            SanitizeError::ReservedSourceName { .. } => {
                write!(f, "Source \"name\" property must not be \"{}\"", TAGS_KEY)
            }
            SanitizeError::ItemsNotArray { .. } => {
                write!(f, "Source \"items\" property must be an array")
            }
            SanitizeError::ItemNotObject { .. } => write!(f, "Each item must be an object"),
            SanitizeError::AddNotObject { .. } => {
                write!(f, "Item \"add\" property must be an object")
            }
            SanitizeError::FieldNotArray { field, .. } => {
                write!(f, "Item \"{}\" property must be an array", field.as_str())
            }
            SanitizeError::TagNotString { field, .. } => {
                write!(f, "Item \"{}\" entries must be strings", field.as_str())
            }
            SanitizeError::InvalidWeight { .. } => {
                write!(f, "Item \"weight\" property must be a non-negative number")
            }
        }
    }
}

impl std::error::Error for SanitizeError {}

impl SanitizeError {
    /// Location of the offending value within the definitions
    pub fn path(&self) -> Vec<PathSegment> {
        use PathSegment::{Index, Key};
        match *self {
            SanitizeError::SourcesNotArray => Vec::new(),
            SanitizeError::SourceNotObject { source } => vec![Index(source)],
            SanitizeError::InvalidSourceName { source }
            | SanitizeError::ReservedSourceName { source } => vec![Index(source), Key("name")],
            SanitizeError::ItemsNotArray { source } => vec![Index(source), Key("items")],
            SanitizeError::ItemNotObject { source, item } => {
                vec![Index(source), Key("items"), Index(item)]
            }
            SanitizeError::AddNotObject { source, item } => {
                vec![Index(source), Key("items"), Index(item), Key("add")]
            }
            SanitizeError::FieldNotArray {
                field,
                source,
                item,
            } => vec![Index(source), Key("items"), Index(item), Key(field.as_str())],
            SanitizeError::TagNotString {
                field,
                source,
                item,
                index,
            } => vec![
                Index(source),
                Key("items"),
                Index(item),
                Key(field.as_str()),
                Index(index),
            ],
            SanitizeError::InvalidWeight { source, item } => {
                vec![Index(source), Key("items"), Index(item), Key("weight")]
            }
        }
    }

    /// Render the path as `[0].items[2].only`
    pub fn path_string(&self) -> String {
        let mut out = String::new();
        for segment in self.path() {
            match segment {
                PathSegment::Index(i) => out.push_str(&format!("[{}]", i)),
                PathSegment::Key(k) => {
                    out.push('.');
                    out.push_str(k);
                }
            }
        }
        out
    }
}

/// Validate and normalize raw source definitions
///
/// The input is never modified; the returned sources own copies of
/// everything they need.
pub fn sanitize(definitions: &Value) -> Result<Vec<Source>, SanitizeError> {
    let raw_sources = definitions
        .as_array()
        .ok_or(SanitizeError::SourcesNotArray)?;

    let mut sources = Vec::with_capacity(raw_sources.len());
    for (index, raw) in raw_sources.iter().enumerate() {
        sources.push(sanitize_source(index, raw)?);
    }

    debug!(
        sources = sources.len(),
        items = sources.iter().map(|s| s.items.len()).sum::<usize>(),
        "sanitized source definitions"
    );
    Ok(sources)
}

fn sanitize_source(index: usize, raw: &Value) -> Result<Source, SanitizeError> {
    let object = raw
        .as_object()
        .ok_or(SanitizeError::SourceNotObject { source: index })?;

    let name = match object.get("name") {
        Some(Value::String(name)) => name.clone(),
        Some(Value::Number(number)) => number_key(number),
        _ => return Err(SanitizeError::InvalidSourceName { source: index }),
    };
    if name == TAGS_KEY {
        return Err(SanitizeError::ReservedSourceName { source: index });
    }

    let raw_items = object
        .get("items")
        .and_then(Value::as_array)
        .ok_or(SanitizeError::ItemsNotArray { source: index })?;

    let mut items = Vec::with_capacity(raw_items.len());
    for (item_index, raw_item) in raw_items.iter().enumerate() {
        items.push(sanitize_item(index, item_index, raw_item)?);
    }

    Ok(Source { name, items })
}

fn sanitize_item(source: usize, item: usize, raw: &Value) -> Result<Item, SanitizeError> {
    let object = raw
        .as_object()
        .ok_or(SanitizeError::ItemNotObject { source, item })?;

    let add = match object.get("add") {
        Some(Value::Object(map)) => Some(map.clone()),
        Some(value) if is_truthy(value) => {
            return Err(SanitizeError::AddNotObject { source, item })
        }
        _ => None,
    };

    let not = string_list(object, ItemField::Not, source, item)?;
    let only = string_list(object, ItemField::Only, source, item)?;
    let tags = string_list(object, ItemField::Tags, source, item)?;

    let weight = match object.get("weight") {
        None => 1.0,
        Some(value) => value
            .as_f64()
            .filter(|w| valid_weight(*w))
            .ok_or(SanitizeError::InvalidWeight { source, item })?,
    };

    let value = object.get("value").cloned().unwrap_or(Value::Null);

    Ok(Item {
        value: ItemValue::Literal(value),
        weight,
        tags,
        only,
        not,
        add,
    })
}

fn string_list(
    object: &Map<String, Value>,
    field: ItemField,
    source: usize,
    item: usize,
) -> Result<Vec<String>, SanitizeError> {
    let entries = match object.get(field.as_str()) {
        None => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            return Err(SanitizeError::FieldNotArray {
                field,
                source,
                item,
            })
        }
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            entry
                .as_str()
                .map(str::to_string)
                .ok_or(SanitizeError::TagNotString {
                    field,
                    source,
                    item,
                    index,
                })
        })
        .collect()
}

/// Field key for a numeric source name: whole numbers print without a
/// fractional part (`1.0` and `1e2` become `"1"` and `"100"`)
fn number_key(number: &serde_json::Number) -> String {
    if number.is_i64() || number.is_u64() {
        return number.to_string();
    }
    match number.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => (f as i64).to_string(),
        Some(f) => f.to_string(),
        None => number.to_string(),
    }
}

/// `false`, `0`, `""` and `null` count as an absent value
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn valid_weight(weight: f64) -> bool {
    weight.is_finite() && weight >= 0.0
}

/// Check sources built in code for what their types cannot rule out
pub fn validate(sources: &[Source]) -> Result<(), SanitizeError> {
    for (index, source) in sources.iter().enumerate() {
        if source.name == TAGS_KEY {
            return Err(SanitizeError::ReservedSourceName { source: index });
        }
        for (item_index, item) in source.items.iter().enumerate() {
            if !valid_weight(item.weight) {
                return Err(SanitizeError::InvalidWeight {
                    source: index,
                    item: item_index,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_applies_defaults() {
        let sources = sanitize(&json!([{"name": "size", "items": [{"value": "small"}]}])).unwrap();
        assert_eq!(sources.len(), 1);
        let item = &sources[0].items[0];
        assert_eq!(item.weight, 1.0);
        assert!(item.tags.is_empty() && item.only.is_empty() && item.not.is_empty());
        assert!(item.add.is_none());
    }

    #[test]
    fn test_numeric_name() {
        let sources = sanitize(&json!([{"name": 7, "items": []}])).unwrap();
        assert_eq!(sources[0].name, "7");
    }

    #[test]
    fn test_whole_float_names_print_as_integers() {
        let sources = sanitize(&json!([
            {"name": 1.0, "items": []},
            {"name": 1e2, "items": []},
            {"name": 2.5, "items": []},
            {"name": -0.0, "items": []},
            {"name": -4, "items": []}
        ]))
        .unwrap();
        let names: Vec<&str> = sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["1", "100", "2.5", "0", "-4"]);
    }

    #[test]
    fn test_missing_value_is_null() {
        let sources = sanitize(&json!([{"name": "a", "items": [{"weight": 2}]}])).unwrap();
        assert!(matches!(sources[0].items[0].value, ItemValue::Literal(Value::Null)));
        assert_eq!(sources[0].items[0].weight, 2.0);
    }

    #[test]
    fn test_input_untouched() {
        let definitions = json!([{"name": "a", "items": [{"value": 1}]}]);
        let before = definitions.clone();
        sanitize(&definitions).unwrap();
        assert_eq!(definitions, before);
    }

    #[test]
    fn test_null_add_is_absent() {
        let sources =
            sanitize(&json!([{"name": "a", "items": [{"value": 1, "add": null}]}])).unwrap();
        assert!(sources[0].items[0].add.is_none());
    }

    #[test]
    fn test_error_path() {
        let error =
            sanitize(&json!([{"name": "a", "items": []}, {"name": "b", "items": [{}, {"only": "x"}]}]))
                .unwrap_err();
        assert_eq!(
            error,
            SanitizeError::FieldNotArray {
                field: ItemField::Only,
                source: 1,
                item: 1
            }
        );
        assert_eq!(error.path_string(), "[1].items[1].only");
    }

    #[test]
    fn test_validate_rejects_negative_weight() {
        let sources = vec![Source::new("a").item(Item::new(1).weight(-1.0))];
        assert_eq!(
            validate(&sources),
            Err(SanitizeError::InvalidWeight { source: 0, item: 0 })
        );
    }

    #[test]
    fn test_validate_rejects_tags_name() {
        let sources = vec![Source::new("tags")];
        assert_eq!(
            validate(&sources),
            Err(SanitizeError::ReservedSourceName { source: 0 })
        );
    }
}
