//! Summary files
//!
//! A summary file is a JSON array of `CompileTypeSummary` records. Symbols
//! are written as `{"__symbolic__":"symbol","name":..,"path":..,"members":[..]}`
//! with the path mapped to the output file name, and read back through the
//! symbol cache so they compare equal to symbols resolved from metadata.

use super::static_symbol::{with_symbol_cache, StaticSymbolCache, SYMBOL_MARKER};
use crate::compile_metadata::CompileTypeSummary;
use crate::error::{CompilerError, Result};
use serde_json::Value;
use std::rc::Rc;

pub fn serialize_summaries(
    summaries: &[CompileTypeSummary],
    output_file_name: impl Fn(&str) -> String,
) -> Result<String> {
    let mut json = serde_json::to_value(summaries)?;
    map_symbol_paths(&mut json, &output_file_name);
    Ok(serde_json::to_string(&json)?)
}

pub fn deserialize_summaries(
    symbol_cache: &Rc<StaticSymbolCache>,
    summary_file: &str,
    json: &str,
) -> Result<Vec<CompileTypeSummary>> {
    with_symbol_cache(symbol_cache, || serde_json::from_str(json)).map_err(|err| {
        CompilerError::Summary {
            path: summary_file.to_string(),
            message: err.to_string(),
        }
    })
}

fn map_symbol_paths(value: &mut Value, output_file_name: &impl Fn(&str) -> String) {
    match value {
        Value::Array(items) => {
            for item in items {
                map_symbol_paths(item, output_file_name);
            }
        }
        Value::Object(map) => {
            if map.get("__symbolic__").and_then(Value::as_str) == Some(SYMBOL_MARKER) {
                if let Some(Value::String(path)) = map.get_mut("path") {
                    *path = output_file_name(path);
                }
                return;
            }
            for item in map.values_mut() {
                map_symbol_paths(item, output_file_name);
            }
        }
        _ => {}
    }
}
