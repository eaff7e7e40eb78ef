//! Markup serialization helpers shared by [`VNode`](super::VNode) and the
//! document HTML accessors.

/// Elements that never have children and need no closing tag.
pub const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|void| void.eq_ignore_ascii_case(tag))
}

/// Escape text content.
pub fn escape_text(text: &str) -> String {
    escape(text, false)
}

/// Escape a double-quoted attribute value.
pub fn escape_attribute(value: &str) -> String {
    escape(value, true)
}

fn escape(input: &str, quotes: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if quotes => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Write `<tag a="1" b="2">`.
pub(crate) fn write_open_tag<'a>(
    out: &mut String,
    tag: &str,
    attributes: impl IntoIterator<Item = (&'a str, &'a str)>,
) {
    out.push('<');
    out.push_str(tag);
    for (name, value) in attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_attribute(value));
        out.push('"');
    }
    out.push('>');
}

pub(crate) fn write_close_tag(out: &mut String, tag: &str) {
    if !is_void(tag) {
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape_text("a < b & \"c\""), "a &lt; b &amp; \"c\"");
        assert_eq!(escape_attribute("say \"hi\""), "say &quot;hi&quot;");
    }

    #[test]
    fn test_tags() {
        let mut out = String::new();
        write_open_tag(&mut out, "a", [("href", "/x?a=1&b=2")]);
        out.push_str("go");
        write_close_tag(&mut out, "a");
        assert_eq!(out, r#"<a href="/x?a=1&amp;b=2">go</a>"#);

        let mut out = String::new();
        write_open_tag(&mut out, "br", std::iter::empty::<(&str, &str)>());
        write_close_tag(&mut out, "br");
        assert_eq!(out, "<br>");
    }
}
