//! Display ordering of rate lines within a category.

use std::collections::HashSet;

/// Merges a server-declared key order with a fallback order.
///
/// The preferred sequence is `api_order` when it is non-empty and
/// `fallback_order` otherwise. Keys from it that exist in `available_keys`
/// come first, in that sequence; every remaining available key is appended in
/// the iteration order of `available_keys`. The result is always a
/// permutation of the distinct available keys.
///
/// # Example
///
/// ```
/// use rate_core::resolve_order;
///
/// let api_order = vec!["b".to_string(), "a".to_string()];
/// let ordered = resolve_order(&api_order, ["a", "b", "c"], &["a", "b", "c"]);
///
/// assert_eq!(ordered, vec!["b", "a", "c"]);
/// ```
pub fn resolve_order<'a, I>(
    api_order: &[String],
    available_keys: I,
    fallback_order: &[&str],
) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let available: Vec<&str> = available_keys.into_iter().collect();
    let known: HashSet<&str> = available.iter().copied().collect();

    let preferred: Vec<&str> = if api_order.is_empty() {
        fallback_order.to_vec()
    } else {
        api_order.iter().map(String::as_str).collect()
    };

    let mut placed: HashSet<&str> = HashSet::with_capacity(available.len());
    let mut ordered = Vec::with_capacity(known.len());

    for key in preferred {
        if known.contains(key) && placed.insert(key) {
            ordered.push(key.to_string());
        }
    }
    for key in available {
        if placed.insert(key) {
            ordered.push(key.to_string());
        }
    }

    ordered
}
