use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::TemplateError;

// `$$` escape, `$name`, `${name}`.
static RE_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:(\$)|([A-Za-z_][A-Za-z0-9_]*)|\{([A-Za-z_][A-Za-z0-9_]*)\})").unwrap()
});

/// Names of every placeholder referenced by `template`.
pub fn placeholders(template: &str) -> BTreeSet<String> {
    RE_PLACEHOLDER
        .captures_iter(template)
        .filter_map(|caps| placeholder_name(&caps).map(str::to_string))
        .collect()
}

/// Substitute every placeholder of `template` from `substitutions`.
///
/// Fails with [`TemplateError::MissingKey`] listing every unresolved name;
/// nothing is rendered in that case. Unused substitutions are ignored.
pub fn render_template(
    name: &'static str,
    template: &str,
    substitutions: &HashMap<String, String>,
) -> Result<String, TemplateError> {
    let missing: Vec<String> = placeholders(template)
        .into_iter()
        .filter(|key| !substitutions.contains_key(key))
        .collect();
    if !missing.is_empty() {
        return Err(TemplateError::MissingKey {
            template: name,
            keys: missing,
        });
    }

    let rendered = RE_PLACEHOLDER.replace_all(template, |caps: &Captures| {
        match placeholder_name(caps) {
            Some(key) => substitutions.get(key).cloned().unwrap_or_default(),
            None => "$".to_string(),
        }
    });

    Ok(rendered.into_owned())
}

fn placeholder_name<'t>(caps: &Captures<'t>) -> Option<&'t str> {
    caps.get(2).or_else(|| caps.get(3)).map(|m| m.as_str())
}
