//! Dotted key expansion.
//!
//! `commandAliases.mv` becomes `commandAliases: { mv: ... }`. Keys sharing a
//! prefix merge into the same nested mapping, and a non-mapping intermediate
//! value is replaced by a fresh mapping.

use serde_json::{Map, Value};

/// Expand every top-level key containing a `.` into nested mapping structure
/// and remove the dotted key. Keys are processed in the map's (sorted) order,
/// so the result is deterministic.
pub fn expand_dotted_keys(config: &mut Map<String, Value>) {
    let dotted: Vec<String> = config
        .keys()
        .filter(|key| key.contains('.'))
        .cloned()
        .collect();

    for key in dotted {
        let Some(value) = config.remove(&key) else {
            continue;
        };
        let segments: Vec<&str> = key.split('.').collect();
        insert_path(config, &segments, value);
    }
}

fn insert_path(map: &mut Map<String, Value>, segments: &[&str], value: Value) {
    match segments {
        [] => {}
        [last] => {
            map.insert((*last).to_string(), value);
        }
        [head, rest @ ..] => {
            let slot = map
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(nested) = slot {
                insert_path(nested, rest, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map_of(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_simple_expansion() {
        let mut config = map_of(json!({"commandAliases.mv": "move"}));
        expand_dotted_keys(&mut config);
        assert_eq!(
            Value::Object(config),
            json!({"commandAliases": {"mv": "move"}})
        );
    }

    #[test]
    fn test_shared_prefix_merges() {
        let mut config = map_of(json!({"a.b": 1, "a.c": 2}));
        expand_dotted_keys(&mut config);
        assert_eq!(Value::Object(config), json!({"a": {"b": 1, "c": 2}}));
    }

    #[test]
    fn test_merges_into_existing_mapping() {
        let mut config = map_of(json!({
            "commandAliases": {"c": "close"},
            "commandAliases.mv": "move"
        }));
        expand_dotted_keys(&mut config);
        assert_eq!(
            Value::Object(config),
            json!({"commandAliases": {"c": "close", "mv": "move"}})
        );
    }

    #[test]
    fn test_non_mapping_intermediate_replaced() {
        let mut config = map_of(json!({"a": "scalar", "a.b": 1}));
        expand_dotted_keys(&mut config);
        assert_eq!(Value::Object(config), json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_deep_path() {
        let mut config = map_of(json!({"a.b.c": true}));
        expand_dotted_keys(&mut config);
        assert_eq!(Value::Object(config), json!({"a": {"b": {"c": true}}}));
    }

    #[test]
    fn test_undotted_keys_untouched() {
        let mut config = map_of(json!({"prefix": "!", "port": 8890}));
        expand_dotted_keys(&mut config);
        assert_eq!(Value::Object(config), json!({"prefix": "!", "port": 8890}));
    }
}
