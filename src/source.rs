/// Normalized sources and items, the shape the generator works on
use crate::record::Record;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// A function computing an item's value from the in-progress record
pub type ValueFn = Arc<dyn Fn(&Record) -> Value + Send + Sync>;

/// What an item stores in the record when it is drawn
#[derive(Clone)]
pub enum ItemValue {
    Literal(Value),
    Computed(ValueFn),
}

impl ItemValue {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Record) -> Value + Send + Sync + 'static,
    {
        ItemValue::Computed(Arc::new(f))
    }

    /// Produce the value to store, given the record as it stands
    pub fn resolve(&self, record: &Record) -> Value {
        match self {
            ItemValue::Literal(value) => value.clone(),
            ItemValue::Computed(f) => f(record),
        }
    }

    /// Short human-readable form, used in traces
    pub fn preview(&self) -> String {
        match self {
            ItemValue::Literal(Value::String(s)) => s.clone(),
            ItemValue::Literal(value) => value.to_string(),
            ItemValue::Computed(_) => "<computed>".to_string(),
        }
    }
}

impl fmt::Debug for ItemValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemValue::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            ItemValue::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl Default for ItemValue {
    fn default() -> Self {
        ItemValue::Literal(Value::Null)
    }
}

/// A weighted candidate within a source
#[derive(Debug, Clone)]
pub struct Item {
    pub value: ItemValue,
    pub weight: f64,
    pub tags: Vec<String>,
    pub only: Vec<String>,
    pub not: Vec<String>,
    pub add: Option<Map<String, Value>>,
}

impl Item {
    /// Create an item with a literal value and default weight 1
    pub fn new(value: impl Into<Value>) -> Self {
        Item::with_value(ItemValue::Literal(value.into()))
    }

    /// Create an item whose value is computed from the in-progress record
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Record) -> Value + Send + Sync + 'static,
    {
        Item::with_value(ItemValue::computed(f))
    }

    pub fn with_value(value: ItemValue) -> Self {
        Item {
            value,
            weight: 1.0,
            tags: Vec::new(),
            only: Vec::new(),
            not: Vec::new(),
            add: None,
        }
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn only<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn not<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.not = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Attach an extra field merged into the record when this item is drawn
    pub fn add(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }
}

/// A named weighted-choice table
#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub items: Vec<Item>,
}

impl Source {
    pub fn new(name: impl Into<String>) -> Self {
        Source {
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    /// Find the first item whose value equals `value`
    ///
    /// Computed values are evaluated against an empty record.
    pub fn find_item(&self, value: &Value) -> Option<&Item> {
        let empty = Record::new();
        self.items
            .iter()
            .find(|item| item.value.resolve(&empty) == *value)
    }
}
