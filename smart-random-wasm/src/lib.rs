use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use smart_random::{build_generator, parse, Generator, Record};
use wasm_bindgen::prelude::*;

fn load(definitions: &str) -> Result<Generator, String> {
    let value = parse(definitions).map_err(|e| format!("{}", e))?;
    build_generator(&value).map_err(|e| format!("{}", e))
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

// Plain objects rather than JS Maps, so records read naturally from JS
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, String> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| format!("{}", e))
}

/// Compose one record from JSON source definitions
#[wasm_bindgen]
pub fn compose(definitions: &str, seed: Option<u64>) -> Result<JsValue, String> {
    let generator = load(definitions)?;
    let mut rng = rng_for(seed);
    to_js(&generator.generate(&mut rng))
}

/// Compose several records; returns a JS array of objects
#[wasm_bindgen]
pub fn compose_many(definitions: &str, count: u32, seed: Option<u64>) -> Result<JsValue, String> {
    let generator = load(definitions)?;
    let mut rng = rng_for(seed);

    let records: Vec<Record> = (0..count).map(|_| generator.generate(&mut rng)).collect();
    to_js(&records)
}

/// Validate source definitions without generating anything
#[wasm_bindgen]
pub fn validate_sources(definitions: &str) -> Result<(), String> {
    load(definitions).map(|_| ())
}
