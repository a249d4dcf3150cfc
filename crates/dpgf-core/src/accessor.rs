//! Dotted-path access into untyped JSON
//!
//! This is the only place that walks `serde_json::Value` by path. Callers pass
//! the default to use when any link of the path is missing, so the
//! substitution policy stays in one place.

use serde_json::Value;

static NULL: Value = Value::Null;

/// Resolve `path` (e.g. `"dpgf_info.nom_projet"`) inside `root`
///
/// Returns `default` as soon as the current value is `null`, a key is absent,
/// or a segment does not apply (a key on a number, a bad array index). Later
/// segments are not evaluated after a short-circuit. A `null` found at the
/// end of the path is returned as-is.
pub fn get<'a>(root: &'a Value, path: &str, default: &'a Value) -> &'a Value {
    let mut current = root;
    for segment in path.split('.') {
        let next = match current {
            Value::Null => return default,
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|idx| items.get(idx)),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return default,
        }
    }
    current
}

/// String leaf, or `default` when missing, `null` or not a string
pub fn get_str<'a>(root: &'a Value, path: &str, default: &'a str) -> &'a str {
    get(root, path, &NULL).as_str().unwrap_or(default)
}

/// Numeric leaf, or `default` when missing, `null` or not a number
pub fn get_f64(root: &Value, path: &str, default: f64) -> f64 {
    get(root, path, &NULL).as_f64().unwrap_or(default)
}

/// Integer leaf, or `default` when missing, `null` or not an integer
pub fn get_i64(root: &Value, path: &str, default: i64) -> i64 {
    get(root, path, &NULL).as_i64().unwrap_or(default)
}

/// Boolean leaf, or `default` when missing, `null` or not a boolean
pub fn get_bool(root: &Value, path: &str, default: bool) -> bool {
    get(root, path, &NULL).as_bool().unwrap_or(default)
}

/// Optional numeric leaf, `None` when the path does not resolve to a number
pub fn get_opt_f64(root: &Value, path: &str) -> Option<f64> {
    get(root, path, &NULL).as_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_link_short_circuits() {
        let root = json!({"a": {"b": null}});
        assert_eq!(get(&root, "a.b.c", &json!("X")), &json!("X"));
    }

    #[test]
    fn test_missing_key_returns_default() {
        assert_eq!(get(&json!({}), "a", &json!("X")), &json!("X"));
    }

    #[test]
    fn test_resolves_deep_value() {
        let root = json!({"a": {"b": {"c": 5}}});
        assert_eq!(get(&root, "a.b.c", &json!("X")), &json!(5));
    }

    #[test]
    fn test_terminal_null_is_returned() {
        let root = json!({"a": {"b": null}});
        assert_eq!(get(&root, "a.b", &json!("X")), &Value::Null);
        assert_eq!(get_str(&root, "a.b", "X"), "X");
    }

    #[test]
    fn test_array_segments() {
        let root = json!({"lots": [{"nom_lot": "Plomberie"}]});
        assert_eq!(get_str(&root, "lots.0.nom_lot", "?"), "Plomberie");
        assert_eq!(get_str(&root, "lots.3.nom_lot", "?"), "?");
        assert_eq!(get_str(&root, "lots.first.nom_lot", "?"), "?");
    }

    #[test]
    fn test_scalar_in_the_middle() {
        let root = json!({"a": 3});
        assert_eq!(get(&root, "a.b", &json!(false)), &json!(false));
    }

    #[test]
    fn test_typed_helpers() {
        let root = json!({
            "dpgf_info": {"nom_projet": "Collège", "id_dpgf": 4},
            "prix_unitaire_ht": 12.5,
            "offre_acceptee": true,
            "unite": 3
        });
        assert_eq!(get_str(&root, "dpgf_info.nom_projet", "Projet non spécifié"), "Collège");
        assert_eq!(get_str(&root, "lot_info.nom_lot", "Lot non spécifié"), "Lot non spécifié");
        assert_eq!(get_str(&root, "unite", "U"), "U");
        assert_eq!(get_f64(&root, "prix_unitaire_ht", 0.0), 12.5);
        assert_eq!(get_i64(&root, "dpgf_info.id_dpgf", 0), 4);
        assert!(get_bool(&root, "offre_acceptee", false));
        assert_eq!(get_opt_f64(&root, "similarity_score"), None);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    proptest! {
        /// Property: arbitrary paths never panic and unknown keys give the default
        #[test]
        fn unknown_paths_fall_back(path in "[a-z0-9.]{0,30}") {
            let root = json!({"known": {"leaf": 1}});
            let default = json!("fallback");
            let found = get(&root, &path, &default);
            if !path.starts_with("known") {
                prop_assert_eq!(found, &default);
            }
        }
    }
}
