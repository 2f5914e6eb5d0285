//! Character reference decoding.
//!
//! quick-xml reports `&name;` references as separate events; this module turns
//! them into text. Attribute values are decoded in one pass with
//! [`unescape`].

use std::sync::LazyLock;

use regex::Regex;

/// Pattern for named and numeric character references.
static REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z][a-zA-Z0-9]*);")
        .expect("invalid reference regex")
});

/// Decode a character reference body (the part between `&` and `;`).
///
/// Returns `None` for unknown names and invalid code points.
pub(crate) fn decode_reference(name: &str) -> Option<String> {
    if let Some(numeric) = name.strip_prefix('#') {
        let code = if let Some(hex) = numeric
            .strip_prefix('x')
            .or_else(|| numeric.strip_prefix('X'))
        {
            u32::from_str_radix(hex, 16).ok()
        } else {
            numeric.parse::<u32>().ok()
        };
        return code.and_then(char::from_u32).map(String::from);
    }
    named_entity(name).map(String::from)
}

/// Decode every known character reference in `text`.
///
/// Unknown references are kept verbatim.
pub(crate) fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_owned();
    }
    REFERENCE_PATTERN
        .replace_all(text, |caps: &regex::Captures| {
            decode_reference(&caps[1]).unwrap_or_else(|| caps[0].to_owned())
        })
        .into_owned()
}

/// Map an HTML entity name to its Unicode text.
fn named_entity(name: &str) -> Option<&'static str> {
    Some(match name {
        // XML
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",

        // Common entities
        "nbsp" => "\u{00a0}",
        "shy" => "\u{00ad}",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "bdquo" => "\u{201e}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "bull" => "\u{2022}",
        "hellip" => "\u{2026}",

        // Arrows
        "rarr" => "\u{2192}",
        "larr" => "\u{2190}",
        "harr" => "\u{2194}",
        "uarr" => "\u{2191}",
        "darr" => "\u{2193}",

        // Math symbols
        "le" => "\u{2264}",
        "ge" => "\u{2265}",
        "ne" => "\u{2260}",
        "plusmn" => "\u{00b1}",
        "times" => "\u{00d7}",
        "divide" => "\u{00f7}",

        // Legal symbols
        "copy" => "\u{00a9}",
        "reg" => "\u{00ae}",
        "trade" => "\u{2122}",

        // Currency
        "euro" => "\u{20ac}",
        "pound" => "\u{00a3}",
        "yen" => "\u{00a5}",
        "cent" => "\u{00a2}",

        // Misc symbols
        "deg" => "\u{00b0}",
        "para" => "\u{00b6}",
        "sect" => "\u{00a7}",
        "laquo" => "\u{00ab}",
        "raquo" => "\u{00bb}",
        "middot" => "\u{00b7}",

        // Polish letters
        "oacute" => "\u{00f3}",
        "Oacute" => "\u{00d3}",
        "aogon" => "\u{0105}",
        "eogon" => "\u{0119}",
        "lstrok" => "\u{0142}",
        "Lstrok" => "\u{0141}",

        _ => return None,
    })
}
