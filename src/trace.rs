/// Trace of a generator call, for debugging and visualizing compositions
use serde::{Deserialize, Serialize};

/// Represents a single step in the composition trace
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceNode {
    /// Human-readable description of the step
    pub operation: String,

    /// The value produced by this step, as text
    pub result: String,

    /// Child traces (one per source for the root)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<TraceNode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<OperationType>,

    /// Tags accumulated before this step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags_before: Option<Vec<String>>,

    /// Items that survived the tag filter (preview of each value)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_items: Option<Vec<String>>,

    /// Number of items removed by the tag filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filtered_out: Option<usize>,

    /// Index of the drawn item within the source's items
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_index: Option<usize>,

    /// Tags contributed by the drawn item
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags_added: Option<Vec<String>>,
}

/// Types of operations that can be traced
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// A whole generator call
    Root,

    /// Drawing from one source
    SourcePick,
}

impl TraceNode {
    /// Create a new trace node
    pub fn new(operation: String, result: String) -> Self {
        TraceNode {
            operation,
            result,
            children: Vec::new(),
            operation_type: None,
            tags_before: None,
            available_items: None,
            filtered_out: None,
            selected_index: None,
            tags_added: None,
        }
    }

    pub fn with_type(mut self, op_type: OperationType) -> Self {
        self.operation_type = Some(op_type);
        self
    }

    pub fn add_child(&mut self, child: TraceNode) {
        self.children.push(child);
    }

    pub fn with_tags_before(mut self, tags: Vec<String>) -> Self {
        self.tags_before = Some(tags);
        self
    }

    /// Set available items for a selection
    pub fn with_available_items(mut self, items: Vec<String>) -> Self {
        self.available_items = Some(items);
        self
    }

    pub fn with_filtered_out(mut self, count: usize) -> Self {
        self.filtered_out = Some(count);
        self
    }
}
