//! Placeholder splicing for code skeletons
//!
//! Placeholders are written `{{NAME}}`. Only the skeleton is scanned; substituted
//! values are copied verbatim, so a module body that happens to contain
//! `{{BODY}}` in a string literal is left alone.

use rustc_hash::FxHashSet;

use crate::error::{BundleError, Result};

pub(crate) fn render(skeleton: &str, substitutions: &[(&str, &str)]) -> Result<String> {
    let capacity = skeleton.len() + substitutions.iter().map(|(_, v)| v.len()).sum::<usize>();
    let mut out = String::with_capacity(capacity);
    let mut used = FxHashSet::default();
    let mut rest = skeleton;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let end = after_open.find("}}").ok_or_else(|| {
            BundleError::Internal("unterminated placeholder in code skeleton".to_owned())
        })?;
        let name = &after_open[..end];
        let value = substitutions
            .iter()
            .find_map(|(key, value)| (*key == name).then_some(*value))
            .ok_or_else(|| {
                BundleError::Internal(format!("no value supplied for placeholder {{{{{name}}}}}"))
            })?;
        out.push_str(value);
        used.insert(name);
        rest = &after_open[end + 2..];
    }
    out.push_str(rest);

    if let Some((unused, _)) = substitutions.iter().find(|(key, _)| !used.contains(key)) {
        return Err(BundleError::Internal(format!(
            "placeholder {{{{{unused}}}}} does not occur in code skeleton"
        )));
    }
    Ok(out)
}
