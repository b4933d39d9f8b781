//! Small HTML helpers shared by node renderers.

use std::collections::HashMap;

use askama::Template;
use once_cell::sync::Lazy;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::{Captures, Regex};

use super::types::RenderError;

pub(crate) const LINE_BREAK: &str = "<br />";

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}").expect("placeholder pattern must compile")
});

/// Everything but RFC 3986 unreserved characters.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Template)]
#[template(source = "{{ text }}", ext = "html")]
struct Escaped<'a> {
    text: &'a str,
}

/// HTML-escape literal text.
pub(crate) fn escape(text: &str) -> Result<String, RenderError> {
    Ok(Escaped { text }.render()?)
}

/// Replace `{{field}}` placeholders with percent-encoded submitted values.
///
/// Placeholders without a matching value are left untouched.
pub fn substitute_placeholders(input: &str, data: &HashMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(input, |caps: &Captures<'_>| match data.get(&caps[1]) {
            Some(value) => utf8_percent_encode(value, COMPONENT).to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Reject script-bearing URL schemes.
pub(crate) fn is_safe_href(href: &str) -> bool {
    let normalized: String = href
        .trim()
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .collect::<String>()
        .to_ascii_lowercase();
    !["javascript:", "vbscript:", "data:"]
        .iter()
        .any(|scheme| normalized.starts_with(scheme))
}

/// Horizontal alignment of a block element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub(crate) fn from_format(format: &str) -> Self {
        match format {
            "center" => Self::Center,
            "right" | "end" => Self::Right,
            "justify" => Self::Justify,
            _ => Self::Left,
        }
    }

    pub(crate) fn class(self) -> &'static str {
        match self {
            Self::Left => "text-left",
            Self::Center => "text-center",
            Self::Right => "text-right",
            Self::Justify => "text-justify",
        }
    }
}
