//! Named placeholder substitution for route path templates

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":([A-Za-z0-9_]+)").expect("placeholder pattern is valid"));

/// Replace every `:name` in `template` with `params[name]`.
///
/// Placeholders without a matching parameter are left as written.
///
/// ```
/// use std::collections::HashMap;
/// use routeguard_authz::interpolate;
///
/// let params = HashMap::from([("id".to_string(), "7".to_string())]);
/// assert_eq!(interpolate("/foo/:id/edit", &params), "/foo/7/edit");
/// ```
pub fn interpolate(template: &str, params: &HashMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match params.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}
