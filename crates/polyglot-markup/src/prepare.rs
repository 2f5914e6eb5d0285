//! Rewrites HTML leniencies the XML tokenizer would misread.
//!
//! - a `<` that does not open a tag, comment or declaration becomes `&lt;`;
//! - unquoted attribute values are quoted, so `href=/x/` keeps its trailing
//!   slash instead of reading as a self-closing tag;
//! - comments, declarations, quoted values and `<script>`/`<style>` bodies
//!   are copied untouched.

use crate::parser::is_raw_text;

/// Return `input` with tag syntax the tokenizer accepts.
pub(crate) fn prepare(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pos = 0;

    while let Some(found) = input[pos..].find('<') {
        let lt = pos + found;
        out.push_str(&input[pos..lt]);
        let rest = &input[lt..];

        pos = if rest.starts_with("<!--") {
            copy_through(input, lt, "-->", &mut out)
        } else if rest.starts_with("<![CDATA[") {
            copy_through(input, lt, "]]>", &mut out)
        } else if rest.starts_with("<!") || rest.starts_with("<?") {
            copy_through(input, lt, ">", &mut out)
        } else if opens_tag(rest) {
            let tag = copy_tag(input, lt, &mut out);
            if tag.opens_raw_text {
                copy_raw_text(input, tag.end, &tag.name, &mut out)
            } else {
                tag.end
            }
        } else {
            out.push_str("&lt;");
            lt + 1
        };
    }

    out.push_str(&input[pos..]);
    out
}

/// Whether `rest` (starting at `<`) is a start or end tag.
fn opens_tag(rest: &str) -> bool {
    let bytes = rest.as_bytes();
    match bytes.get(1) {
        Some(b'/') => bytes.get(2).is_some_and(u8::is_ascii_alphabetic),
        Some(b) => b.is_ascii_alphabetic(),
        None => false,
    }
}

/// Copy from `start` through the first `terminator`, or to end of input.
fn copy_through(input: &str, start: usize, terminator: &str, out: &mut String) -> usize {
    let end = input[start..]
        .find(terminator)
        .map_or(input.len(), |i| start + i + terminator.len());
    out.push_str(&input[start..end]);
    end
}

struct Tag {
    name: String,
    end: usize,
    opens_raw_text: bool,
}

/// Copy one tag starting at `start`, quoting unquoted attribute values.
fn copy_tag(input: &str, start: usize, out: &mut String) -> Tag {
    let bytes = input.as_bytes();
    let is_end_tag = bytes.get(start + 1) == Some(&b'/');
    let name_start = if is_end_tag { start + 2 } else { start + 1 };
    let name_end = bytes[name_start..]
        .iter()
        .position(|&b| b.is_ascii_whitespace() || b == b'/' || b == b'>')
        .map_or(input.len(), |i| name_start + i);
    out.push_str(&input[start..name_end]);
    let name = input[name_start..name_end].to_ascii_lowercase();

    let mut pos = name_end;
    let mut closed = false;
    while pos < bytes.len() {
        match bytes[pos] {
            b'>' => {
                out.push('>');
                pos += 1;
                closed = true;
                break;
            }
            quote @ (b'"' | b'\'') => {
                let end = input[pos + 1..]
                    .find(char::from(quote))
                    .map_or(input.len(), |i| pos + 1 + i + 1);
                out.push_str(&input[pos..end]);
                pos = end;
            }
            b'=' => {
                out.push('=');
                pos += 1;
                while bytes.get(pos).is_some_and(u8::is_ascii_whitespace) {
                    pos += 1;
                }
                if matches!(bytes.get(pos), Some(b'"' | b'\'' | b'>') | None) {
                    continue;
                }
                let value_end = bytes[pos..]
                    .iter()
                    .position(|&b| b.is_ascii_whitespace() || b == b'>')
                    .map_or(input.len(), |i| pos + i);
                out.push('"');
                out.push_str(&input[pos..value_end].replace('"', "&quot;"));
                out.push('"');
                pos = value_end;
            }
            _ => {
                let next = bytes[pos..]
                    .iter()
                    .position(|&b| matches!(b, b'>' | b'"' | b'\'' | b'='))
                    .map_or(input.len(), |i| pos + i);
                out.push_str(&input[pos..next]);
                pos = next;
            }
        }
    }

    let self_closing = closed && out.ends_with("/>");
    Tag {
        opens_raw_text: closed && !is_end_tag && !self_closing && is_raw_text(&name),
        name,
        end: pos,
    }
}

/// Copy a raw text body up to (not including) its end tag.
fn copy_raw_text(input: &str, start: usize, name: &str, out: &mut String) -> usize {
    let closing = format!("</{name}");
    let end = input[start..]
        .to_ascii_lowercase()
        .find(&closing)
        .map_or(input.len(), |i| start + i);
    out.push_str(&input[start..end]);
    end
}
