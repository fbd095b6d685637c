//! Pretty-printer for a dataset's JSON metadata file.
//!
//! ```rust,no_run
//! if !metadata::show_json_metadata("dataset/labels.json") {
//!     eprintln!("metadata unavailable");
//! }
//! ```

pub mod error;

use std::fs;
use std::io;
use std::path::Path;

use pdi_common::utils::{capitalize, display_title};
use serde_json::Value;
use tracing::debug;

pub use error::{MetadataError, Result};

const BANNER_WIDTH: usize = 55;
const FOOTER_WIDTH: usize = 57;

/// Read and parse a JSON document
pub fn load_metadata<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => MetadataError::NotFound { path: path.to_path_buf() },
        _ => MetadataError::Io(e),
    })?;
    serde_json::from_str(&content).map_err(|source| MetadataError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}

/// Render a metadata document for the terminal.
///
/// Every top-level key becomes a section. A `classes` list of objects is
/// shown as an `ID | Class Name` table, other lists as bullets, objects as
/// `- Key: value` lines and anything else as is.
pub fn format_metadata(file_name: &str, value: &Value) -> String {
    let mut lines = vec![
        format!("╔{}╗", "═".repeat(BANNER_WIDTH)),
        format!("{:<width$}║", format!("║ 📊 PROJECT METADATA ({})", file_name), width = BANNER_WIDTH + 1),
        format!("╚{}╝", "═".repeat(BANNER_WIDTH)),
    ];

    match value {
        Value::Object(map) => {
            for (key, section) in map {
                format_section(&mut lines, key, section);
            }
        }
        other => format_section(&mut lines, "value", other),
    }

    lines.push(String::new());
    lines.push("─".repeat(FOOTER_WIDTH));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn format_section(lines: &mut Vec<String>, key: &str, value: &Value) {
    lines.push(String::new());
    lines.push(format!("🔹 {}:", display_title(key)));

    match value {
        Value::Array(items) if key == "classes" && items.iter().all(Value::is_object) => {
            lines.push("    ID | Class Name".to_string());
            lines.push("    ---|-----------".to_string());
            for item in items {
                let id = item.get("id").map(scalar).unwrap_or_else(|| "?".to_string());
                let name = item.get("nome").map(scalar).unwrap_or_else(|| "N/A".to_string());
                lines.push(format!("    {:<2} | {}", id, name));
            }
        }
        Value::Array(items) => {
            lines.extend(items.iter().map(|item| format!("    - {}", scalar(item))));
        }
        Value::Object(map) => {
            lines.extend(
                map.iter()
                    .map(|(sub_key, sub_value)| format!("    - {}: {}", capitalize(sub_key), scalar(sub_value))),
            );
        }
        other => lines.push(format!("    {}", scalar(other))),
    }
}

// Strings print without quotes, everything else as compact JSON
fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Print the formatted metadata of `path` to stdout.
///
/// Returns `false` after printing an `ERROR:` line when the file is missing,
/// unreadable or not valid JSON; never fails otherwise.
pub fn show_json_metadata<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    match load_metadata(path) {
        Ok(value) => {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            print!("{}", format_metadata(&file_name, &value));
            true
        }
        Err(e) => {
            debug!("Metadata error: {:?}", e);
            println!("ERROR: {}", e);
            false
        }
    }
}
