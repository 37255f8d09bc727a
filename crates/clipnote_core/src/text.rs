/// Lead-in of the source-link markup appended to saved notes.
const SOURCE_LINK_PREFIX: &str = "原文链接：[";

/// Removes every `原文链接：[...](...)` fragment and trims the result.
///
/// Idempotent: stripping an already-stripped string is a no-op. An
/// incomplete fragment (prefix without the closing link syntax) is left in
/// place.
pub fn strip_source_links(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find(SOURCE_LINK_PREFIX) {
        let after_prefix = &rest[start + SOURCE_LINK_PREFIX.len()..];
        let complete = after_prefix.find("](").and_then(|mid| {
            after_prefix[mid + 2..]
                .find(')')
                .map(|close| mid + 2 + close + 1)
        });
        match complete {
            Some(end) => {
                out.push_str(&rest[..start]);
                rest = &after_prefix[end..];
            }
            None => {
                out.push_str(&rest[..start + SOURCE_LINK_PREFIX.len()]);
                rest = after_prefix;
            }
        }
    }
    out.push_str(rest);
    out.trim().to_string()
}

/// Builds the source-link line for a page, used when composing saved notes.
pub fn source_link_line(title: Option<&str>, url: &str) -> String {
    let label = match title {
        Some(t) if !t.is_empty() => t,
        _ => url,
    };
    format!("原文链接：[{label}]({url})")
}

/// Normalizes extracted page text: collapses every whitespace/newline run to
/// a single space, strips pre-existing source-link markup, and trims.
pub fn clean_page_text(raw: &str) -> String {
    let mut collapsed = String::with_capacity(raw.len());
    let mut last_was_space = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                collapsed.push(' ');
            }
            last_was_space = true;
        } else {
            collapsed.push(ch);
            last_was_space = false;
        }
    }
    strip_source_links(&collapsed)
}
