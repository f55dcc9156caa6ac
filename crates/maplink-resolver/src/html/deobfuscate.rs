use std::sync::LazyLock;

use regex::{Captures, Regex};

static HEX_ESCAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\x([0-9A-Fa-f]{2})").expect("valid regex"));
static UNICODE_ESCAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\u00([0-9A-Fa-f]{2})").expect("valid regex"));
static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[xX]?[0-9a-fA-F]+|[a-zA-Z]+);").expect("valid regex"));

fn decode_hex_byte(caps: &Captures<'_>) -> String {
    u8::from_str_radix(&caps[1], 16)
        .map(|b| char::from(b).to_string())
        .unwrap_or_else(|_| caps[0].to_string())
}

fn decode_entity(caps: &Captures<'_>) -> String {
    let entity = caps[1].to_ascii_lowercase();
    let decoded = match entity.as_str() {
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "nbsp" => Some(' '),
        _ => {
            let code_point = if let Some(hex) = entity.strip_prefix("#x") {
                u32::from_str_radix(hex, 16).ok()
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok()
            } else {
                None
            };
            code_point.and_then(char::from_u32)
        }
    };
    decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
}

/// Undoes the JS and HTML escaping providers wrap their redirect targets in.
///
/// Handles `\xHH`, `\u00HH`, `\/`, the common named entities and numeric
/// (decimal or hex) character references. Unknown entities are left as is.
#[must_use]
pub fn deobfuscate_html(text: &str) -> String {
    let text = HEX_ESCAPE_RE.replace_all(text, decode_hex_byte);
    let text = UNICODE_ESCAPE_RE.replace_all(&text, decode_hex_byte);
    let text = text.replace("\\/", "/");
    ENTITY_RE.replace_all(&text, decode_entity).into_owned()
}
