use serde_json::{Map, Value};

/// Parses a configuration dump of `KEY = value` lines into a flat mapping.
///
/// Comment lines (leading `#`) and blank lines are skipped, keys are
/// lower-cased and values trimmed. Later definitions of a key win.
pub fn parse_config_dump(text: &str) -> Map<String, Value> {
    let mut config = Map::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                config.insert(key.trim().to_ascii_lowercase(), Value::String(value.trim().to_string()));
            }
            _ => log::debug!("Skipping config dump line without assignment: {:?}", line),
        }
    }

    config
}
