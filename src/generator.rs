//! The composition loop
//!
//! A [`Generator`] holds normalized sources and, on each call, walks them in
//! order: filter by the tags gathered so far, draw one item, store its value
//! under the source name, then fold in the item's tags and `add` fields.

use rand::Rng;
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

use crate::filter::filter_eligible;
use crate::record::Record;
use crate::sanitizer::{sanitize, validate, SanitizeError};
use crate::source::Source;
use crate::trace::{OperationType, TraceNode};
use crate::weighted::pick_weighted;

/// A reusable, immutable composition of sources
///
/// Cloning is cheap; the sources are shared. Randomness is supplied on each
/// call, so one generator can serve many threads.
#[derive(Debug, Clone)]
pub struct Generator {
    sources: Arc<[Source]>,
}

impl Generator {
    /// Build a generator from sources constructed in code
    pub fn new(sources: Vec<Source>) -> Result<Self, SanitizeError> {
        validate(&sources)?;
        Ok(Generator {
            sources: sources.into(),
        })
    }

    /// Build a generator from JSON source definitions
    pub fn from_json(definitions: &Value) -> Result<Self, SanitizeError> {
        Generator::new(sanitize(definitions)?)
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Compose a fresh record
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Record {
        self.generate_into(Record::new(), rng)
    }

    /// Compose on top of an existing record
    ///
    /// Fields already present are overwritten by same-named sources but take
    /// precedence over `add` fields. Existing tags take part in filtering.
    pub fn generate_into<R: Rng + ?Sized>(&self, record: Record, rng: &mut R) -> Record {
        Composer::new(&self.sources, rng, false).compose(record).0
    }

    /// Compose on top of `record`, also returning a trace of every draw
    pub fn generate_traced<R: Rng + ?Sized>(
        &self,
        record: Record,
        rng: &mut R,
    ) -> (Record, TraceNode) {
        let (record, trace) = Composer::new(&self.sources, rng, true).compose(record);
        let trace = trace.unwrap_or_else(|| TraceNode::new(String::new(), String::new()));
        (record, trace)
    }
}

struct Composer<'a, R: Rng + ?Sized> {
    sources: &'a [Source],
    rng: &'a mut R,
    trace: Option<TraceNode>,
}

impl<'a, R: Rng + ?Sized> Composer<'a, R> {
    fn new(sources: &'a [Source], rng: &'a mut R, trace_enabled: bool) -> Self {
        let trace = trace_enabled.then(|| {
            TraceNode::new("Generate record".to_string(), String::new())
                .with_type(OperationType::Root)
        });
        Composer {
            sources,
            rng,
            trace,
        }
    }

    fn compose(mut self, mut record: Record) -> (Record, Option<TraceNode>) {
        for source in self.sources {
            self.pick_source(source, &mut record);
        }
        record.dedup_tags();

        if let Some(root) = self.trace.as_mut() {
            root.result = serde_json::to_string(&record).unwrap_or_default();
        }
        (record, self.trace)
    }

    fn pick_source(&mut self, source: &Source, record: &mut Record) {
        let eligible = filter_eligible(&source.items, &record.tags);
        let mut node = self.trace.is_some().then(|| {
            TraceNode::new(format!("[{}]", source.name), String::new())
                .with_type(OperationType::SourcePick)
                .with_tags_before(record.tags.clone())
                .with_available_items(eligible.iter().map(|item| item.value.preview()).collect())
                .with_filtered_out(source.items.len() - eligible.len())
        });

        match pick_weighted(&eligible, &mut *self.rng) {
            Some((_, item)) => {
                let value = item.value.resolve(record);
                trace!(source = %source.name, %value, "picked item");

                if let Some(n) = node.as_mut() {
                    n.selected_index = source
                        .items
                        .iter()
                        .position(|candidate| std::ptr::eq(candidate, *item));
                    n.tags_added = Some(item.tags.clone());
                    n.result = value.to_string();
                }

                record.assign(source.name.clone(), value);
                record.tags.extend(item.tags.iter().cloned());
                if let Some(add) = &item.add {
                    record.merge_defaults(add);
                }
            }
            None => {
                trace!(source = %source.name, "no eligible item");
                if let Some(n) = node.as_mut() {
                    n.result = Value::Null.to_string();
                }
                record.assign(source.name.clone(), Value::Null);
            }
        }

        if let (Some(root), Some(node)) = (self.trace.as_mut(), node) {
            root.add_child(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Item;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn size_and_color() -> Generator {
        Generator::new(vec![
            Source::new("size")
                .item(Item::new("small"))
                .item(Item::new("large").tags(["big"])),
            Source::new("color")
                .item(Item::new("red").only(["big"]))
                .item(Item::new("blue")),
        ])
        .unwrap()
    }

    #[test]
    fn test_later_sources_see_earlier_tags() {
        let generator = size_and_color();
        let mut rng = StdRng::seed_from_u64(42);
        let mut saw_red = false;
        for _ in 0..200 {
            let record = generator.generate(&mut rng);
            match record.get("size") {
                Some(v) if v == "small" => {
                    assert_eq!(record.get("color"), Some(&json!("blue")));
                    assert!(record.tags().is_empty());
                }
                Some(v) if v == "large" => {
                    assert_eq!(record.tags(), ["big"]);
                    saw_red |= record.get("color") == Some(&json!("red"));
                }
                other => panic!("unexpected size {:?}", other),
            }
        }
        assert!(saw_red);
    }

    #[test]
    fn test_empty_source_yields_null() {
        let generator = Generator::new(vec![Source::new("nothing")]).unwrap();
        let record = generator.generate(&mut StdRng::seed_from_u64(1));
        assert!(record.contains("nothing"));
        assert_eq!(record.get("nothing"), Some(&Value::Null));
        assert!(record.tags().is_empty());
    }

    #[test]
    fn test_existing_tags_filter_first_source() {
        let generator = Generator::new(vec![Source::new("mood")
            .item(Item::new("grim").only(["dark"]))
            .item(Item::new("cheerful").not(["dark"]))])
        .unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            let start = Record::new().with_field("tags", json!(["dark"]));
            let record = generator.generate_into(start, &mut rng);
            assert_eq!(record.get("mood"), Some(&json!("grim")));
        }
    }

    #[test]
    fn test_traced_records_every_source() {
        let generator = size_and_color();
        let (record, trace) =
            generator.generate_traced(Record::new(), &mut StdRng::seed_from_u64(9));
        assert_eq!(trace.operation_type, Some(OperationType::Root));
        assert_eq!(trace.children.len(), 2);
        assert_eq!(trace.children[0].operation, "[size]");
        assert_eq!(
            trace.children[0].available_items,
            Some(vec!["small".to_string(), "large".to_string()])
        );
        let size_index = trace.children[0].selected_index.unwrap();
        let expected = if size_index == 0 { "small" } else { "large" };
        assert_eq!(record.get("size"), Some(&json!(expected)));
    }
}
