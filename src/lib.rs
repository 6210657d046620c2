//! Smart Random - constrained weighted-random composition
//!
//! Sources are named tables of weighted items. A generator draws one item
//! from each source in order and merges the picks into a single record.
//! Items can require (`only`) or forbid (`not`) tags contributed by earlier
//! picks, so later choices follow from earlier ones.
//!
//! # Example
//!
//! ```
//! use smart_random::run_with_seed;
//!
//! let sources = r#"[
//!     {"name": "size", "items": [
//!         {"value": "small"},
//!         {"value": "large", "tags": ["big"]}
//!     ]},
//!     {"name": "color", "items": [
//!         {"value": "red", "only": ["big"]},
//!         {"value": "blue"}
//!     ]}
//! ]"#;
//! let record = run_with_seed(sources, 42).unwrap();
//! println!("{}", serde_json::to_string(&record).unwrap());
//! ```
pub mod diagnostic;
pub mod filter;
pub mod generator;
pub mod record;
pub mod sanitizer;
pub mod source;
pub mod span;
pub mod trace;
pub mod weighted;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;

/// Re-export main types for convenience
pub use filter::{filter_eligible, is_eligible};
pub use generator::Generator;
pub use record::Record;
pub use sanitizer::{sanitize, ItemField, SanitizeError};
pub use source::{Item, ItemValue, Source};
pub use trace::{OperationType, TraceNode};
pub use weighted::{pick_weighted, Weighted};

/// Combined error type for the JSON front end
#[derive(Debug)]
pub enum ComposeError {
    Parse(serde_json::Error),
    Sanitize(SanitizeError),
}

impl std::fmt::Display for ComposeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComposeError::Parse(e) => write!(f, "Parse error: {}", e),
            ComposeError::Sanitize(e) => write!(f, "Invalid sources: {}", e),
        }
    }
}

impl std::error::Error for ComposeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ComposeError::Parse(e) => Some(e),
            ComposeError::Sanitize(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for ComposeError {
    fn from(e: serde_json::Error) -> Self {
        ComposeError::Parse(e)
    }
}

impl From<SanitizeError> for ComposeError {
    fn from(e: SanitizeError) -> Self {
        ComposeError::Sanitize(e)
    }
}

/// Options for a generator call
pub struct GenerateOptions<R: Rng> {
    /// Random number generator
    pub rng: R,
    /// Record to compose on top of (defaults to an empty record)
    pub record: Option<Record>,
}

impl<R: Rng> GenerateOptions<R> {
    /// Create new options with provided RNG
    pub fn new(rng: R) -> Self {
        GenerateOptions { rng, record: None }
    }

    /// Start from an existing record
    pub fn with_record(mut self, record: Record) -> Self {
        self.record = Some(record);
        self
    }
}

/// Parse JSON source definitions
pub fn parse(input: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(input)
}

/// Validate source definitions and build a generator from them
///
/// # Example
/// ```
/// use smart_random::build_generator;
/// use serde_json::json;
///
/// let generator = build_generator(&json!([
///     {"name": "animal", "items": [{"value": "dog"}, {"value": "cat", "weight": 2}]}
/// ]))
/// .unwrap();
/// assert_eq!(generator.sources().len(), 1);
///
/// let error = build_generator(&json!({"name": "animal"})).unwrap_err();
/// assert_eq!(error.to_string(), "Sources must be an array");
/// ```
pub fn build_generator(definitions: &Value) -> Result<Generator, SanitizeError> {
    Generator::from_json(definitions)
}

/// Run a generator with options
pub fn generate<R: Rng>(generator: &Generator, mut options: GenerateOptions<R>) -> Record {
    let record = options.record.take().unwrap_or_default();
    generator.generate_into(record, &mut options.rng)
}

/// Parse, build, and run in one step
///
/// # Example
/// ```
/// use smart_random::{run, GenerateOptions, Record};
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let sources = r#"[{"name": "greeting", "items": [{"value": "hello"}]}]"#;
/// let options = GenerateOptions::new(StdRng::seed_from_u64(7))
///     .with_record(Record::new().with_field("greeting", "hi"));
/// let record = run(sources, options).unwrap();
/// assert_eq!(record.get("greeting").unwrap(), "hello");
/// ```
pub fn run<R: Rng>(input: &str, options: GenerateOptions<R>) -> Result<Record, ComposeError> {
    let definitions = parse(input)?;
    let generator = build_generator(&definitions)?;
    Ok(generate(&generator, options))
}

/// Parse, build, and run with a seed
///
/// This is a convenience function for deterministic output.
pub fn run_with_seed(input: &str, seed: u64) -> Result<Record, ComposeError> {
    run(input, GenerateOptions::new(StdRng::seed_from_u64(seed)))
}

/// Parse, build, and run with a seed, also returning the trace
pub fn run_with_seed_and_trace(
    input: &str,
    seed: u64,
) -> Result<(Record, TraceNode), ComposeError> {
    let definitions = parse(input)?;
    let generator = build_generator(&definitions)?;
    let mut rng = StdRng::seed_from_u64(seed);
    Ok(generator.generate_traced(Record::new(), &mut rng))
}
