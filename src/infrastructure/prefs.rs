//! Android shared-preferences XML parsing.

use crate::domain::{AppError, Result};

/// Reads the value of the preference entry whose `name` attribute is `name`.
///
/// Entries look like `<int name="default_uin" value="123" />` or, for string
/// preferences, `<string name="...">value</string>`. Exactly one entry must
/// match.
///
/// # Errors
/// Returns a preferences error if the XML is malformed or the entry is
/// missing, duplicated or empty.
pub fn read_preference(xml: &str, name: &str) -> Result<String> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| AppError::Preferences {
        message: format!("Malformed preference file: {e}"),
    })?;

    let mut matches = doc
        .root_element()
        .children()
        .filter(|node| node.is_element() && node.attribute("name") == Some(name));

    let (Some(entry), None) = (matches.next(), matches.next()) else {
        return Err(AppError::Preferences {
            message: format!("Expected exactly one '{name}' entry"),
        });
    };

    let value = entry
        .attribute("value")
        .or_else(|| entry.text())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Preferences {
            message: format!("Entry '{name}' has no value"),
        })?;

    Ok(value.to_string())
}
