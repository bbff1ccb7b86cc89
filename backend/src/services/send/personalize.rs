use crate::error::{ApiError, Result};
use regex::Regex;

pub const DEFAULT_EVENT: &str = "Hackathon 2025";

/// Replaces `{{name}}` and `{{event}}` (spaces inside the braces allowed,
/// case-insensitive). Other placeholders are left as written.
pub fn personalize(template: &str, name: &str, event: &str) -> Result<String> {
    let re = Regex::new(r"(?i)\{\{\s*(name|event)\s*\}\}").map_err(|e| ApiError::internal(e.to_string()))?;
    let out = re.replace_all(template, |caps: &regex::Captures| {
        if caps[1].eq_ignore_ascii_case("name") {
            name.to_string()
        } else {
            event.to_string()
        }
    });
    Ok(out.into_owned())
}
