use std::collections::BTreeMap;

/// Merge launch-parameter defaults with caller overrides.
///
/// The result holds every key from either map. Where a key is present in
/// both, the override's value wins. Neither input is modified.
pub fn merge_env(
    defaults: &BTreeMap<String, String>,
    overrides: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = defaults.clone();
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }
    merged
}
