use js_sys::{Array, Object, Reflect};
use wasm_bindgen::prelude::*;

use crate::options::{Accuracy, DominantColorOptions};
use crate::pipeline::dominant_swatches;

/// Extract dominant colors from encoded image bytes (PNG, JPEG, ...).
///
/// Returns an array of `{ hex, fraction }` objects, most dominant first.
/// Intended to be called from a worker: large budgets take a while.
#[wasm_bindgen(js_name = dominantColors)]
pub fn dominant_colors_js(
    input: Vec<u8>,
    max_sampled_pixels: Option<u32>,
    accuracy: Option<String>,
    seed: Option<u32>,
    memoize: Option<bool>,
) -> Result<Array, JsValue> {
    // ----------------------
    // 1. Decode the image
    // ----------------------
    let img = image::load_from_memory(&input)
        .map_err(|e| JsValue::from_str(&format!("Unable to decode image: {e}")))?;

    // ----------------------
    // 2. Options
    // ----------------------
    let mut options = DominantColorOptions::default();
    if let Some(max) = max_sampled_pixels {
        options = options.with_max_sampled_pixels(max as usize);
    }
    if let Some(accuracy) = accuracy {
        let accuracy: Accuracy = accuracy
            .parse()
            .map_err(|e| JsValue::from_str(&format!("{e}")))?;
        options = options.with_accuracy(accuracy);
    }
    if let Some(seed) = seed {
        options = options.with_seed(seed as u64);
    }
    if let Some(memoize) = memoize {
        options = options.with_memoized_conversions(memoize);
    }

    // ----------------------
    // 3. Extract and convert to JS types
    // ----------------------
    let swatches = dominant_swatches(&img, &options)
        .map_err(|e| JsValue::from_str(&format!("Dominant color extraction failed: {e}")))?;

    let result = Array::new();
    for swatch in &swatches {
        let entry = Object::new();
        Reflect::set(&entry, &JsValue::from_str("hex"), &JsValue::from_str(&swatch.to_hex()))?;
        Reflect::set(
            &entry,
            &JsValue::from_str("fraction"),
            &JsValue::from_f64(swatch.fraction as f64),
        )?;
        result.push(&entry);
    }
    Ok(result)
}
