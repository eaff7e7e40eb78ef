//! Markup parser.
//!
//! Turns render output into raw elements and text. The grammar is deliberately
//! small and strict:
//! - `<tag attr="v" attr='v' flag>...</tag>` and self-closing `<tag/>`
//! - void elements (`br`, `img`, `input`, ...) without a closing tag
//! - `<!-- comments -->`, skipped
//! - character references in text and attribute values
//!
//! Anything else is a [`Error::Markup`] carrying the byte offset.

use crate::error::{Error, Result};
use super::serialize::is_void;

// =============================================================================
// Types
// =============================================================================

/// A parsed node before keys and placeholders are resolved.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RawNode {
    Element(RawElement),
    Text { text: String, offset: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawElement {
    pub tag: String,
    /// Attributes in source order, names unique.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<RawNode>,
    /// Byte offset of the opening `<`.
    pub offset: usize,
}

impl RawNode {
    pub fn offset(&self) -> usize {
        match self {
            Self::Element(element) => element.offset,
            Self::Text { offset, .. } => *offset,
        }
    }

    pub fn is_blank_text(&self) -> bool {
        matches!(self, Self::Text { text, .. } if text.trim().is_empty())
    }
}

// =============================================================================
// Parser
// =============================================================================

/// Parse a markup fragment into its top-level nodes.
pub(crate) fn parse(input: &str) -> Result<Vec<RawNode>> {
    let mut parser = Parser { src: input, pos: 0 };
    parser.parse_nodes(None)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(Error::markup(self.pos, format!("expected `{expected}`, found `{c}`"))),
            None => Err(Error::markup(self.pos, format!("expected `{expected}`, found end of input"))),
        }
    }

    /// Parse sibling nodes until the closing tag of `parent` (or end of input at top level).
    fn parse_nodes(&mut self, parent: Option<(&str, usize)>) -> Result<Vec<RawNode>> {
        let mut nodes = Vec::new();
        loop {
            if self.eof() {
                return match parent {
                    Some((tag, offset)) => Err(Error::markup(offset, format!("unclosed <{tag}>"))),
                    None => Ok(nodes),
                };
            }

            let rest = self.rest();
            if rest.starts_with("<!--") {
                self.skip_comment()?;
            } else if rest.starts_with("</") {
                let offset = self.pos;
                let name = self.parse_closing_tag()?;
                return match parent {
                    Some((tag, _)) if tag == name => Ok(nodes),
                    Some((tag, _)) => Err(Error::markup(
                        offset,
                        format!("expected </{tag}>, found </{name}>"),
                    )),
                    None => Err(Error::markup(offset, format!("unexpected </{name}>"))),
                };
            } else if rest.starts_with('<') {
                nodes.push(RawNode::Element(self.parse_element()?));
            } else {
                let offset = self.pos;
                let end = rest.find('<').map_or(self.src.len(), |i| self.pos + i);
                let raw = &self.src[self.pos..end];
                self.pos = end;
                nodes.push(RawNode::Text {
                    text: decode_entities(raw),
                    offset,
                });
            }
        }
    }

    fn skip_comment(&mut self) -> Result<()> {
        let start = self.pos;
        match self.rest()[4..].find("-->") {
            Some(end) => {
                self.pos += 4 + end + 3;
                Ok(())
            }
            None => Err(Error::markup(start, "unterminated comment")),
        }
    }

    fn parse_closing_tag(&mut self) -> Result<String> {
        self.pos += 2;
        let name = self.parse_tag_name()?;
        self.skip_whitespace();
        self.expect('>')?;
        Ok(name)
    }

    fn parse_element(&mut self) -> Result<RawElement> {
        let offset = self.pos;
        self.expect('<')?;
        let tag = self.parse_tag_name()?;
        let mut attributes: Vec<(String, String)> = Vec::new();

        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.starts_with("/>") {
                self.pos += 2;
                return Ok(RawElement { tag, attributes, children: Vec::new(), offset });
            }
            if rest.starts_with('>') {
                self.pos += 1;
                if is_void(&tag) {
                    return Ok(RawElement { tag, attributes, children: Vec::new(), offset });
                }
                let children = self.parse_nodes(Some((tag.as_str(), offset)))?;
                return Ok(RawElement { tag, attributes, children, offset });
            }
            if self.eof() {
                return Err(Error::markup(offset, format!("unterminated tag <{tag}")));
            }

            let name_offset = self.pos;
            let (name, value) = self.parse_attribute()?;
            if attributes.iter().any(|(existing, _)| *existing == name) {
                return Err(Error::markup(
                    name_offset,
                    format!("duplicate attribute `{name}` on <{tag}>"),
                ));
            }
            attributes.push((name, value));
        }
    }

    fn parse_tag_name(&mut self) -> Result<String> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() => {}
            Some(c) => return Err(Error::markup(start, format!("invalid tag name start `{c}`"))),
            None => return Err(Error::markup(start, "expected tag name, found end of input")),
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
        {
            self.bump();
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn parse_attribute(&mut self) -> Result<(String, String)> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| !c.is_whitespace() && !matches!(c, '/' | '>' | '=' | '"' | '\'' | '<'))
        {
            self.bump();
        }
        if self.pos == start {
            let found = self.peek().map_or_else(|| "end of input".to_string(), |c| format!("`{c}`"));
            return Err(Error::markup(start, format!("expected attribute name, found {found}")));
        }
        let name = self.src[start..self.pos].to_string();

        self.skip_whitespace();
        if self.peek() != Some('=') {
            return Ok((name, String::new()));
        }
        self.bump();
        self.skip_whitespace();

        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                let open = self.pos;
                self.bump();
                let Some(len) = self.rest().find(quote) else {
                    return Err(Error::markup(open, "unterminated attribute value"));
                };
                let raw = &self.src[self.pos..self.pos + len];
                self.pos += len + 1;
                decode_entities(raw)
            }
            Some(_) => {
                let value_start = self.pos;
                while let Some(c) = self.peek() {
                    if c.is_whitespace() || c == '>' || self.rest().starts_with("/>") {
                        break;
                    }
                    if matches!(c, '"' | '\'' | '<' | '=' | '`') {
                        return Err(Error::markup(self.pos, format!("`{c}` in unquoted attribute value")));
                    }
                    self.bump();
                }
                if self.pos == value_start {
                    return Err(Error::markup(value_start, format!("missing value for attribute `{name}`")));
                }
                decode_entities(&self.src[value_start..self.pos])
            }
            None => return Err(Error::markup(self.pos, "expected attribute value, found end of input")),
        };
        Ok((name, value))
    }
}

// =============================================================================
// Character references
// =============================================================================

/// Decode character references. Unknown references are kept literally.
pub(crate) fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_reference(&rest[1..semi]).map(|c| (c, semi)));

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn element(node: &RawNode) -> &RawElement {
        match node {
            RawNode::Element(element) => element,
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn test_self_closing() {
        let nodes = parse("<div/>").unwrap();
        assert_eq!(nodes.len(), 1);
        let div = element(&nodes[0]);
        assert_eq!(div.tag, "div");
        assert!(div.children.is_empty());
    }

    #[test]
    fn test_nested_with_text() {
        let nodes = parse("<div><button>b</button></div>").unwrap();
        let div = element(&nodes[0]);
        let button = element(&div.children[0]);
        assert_eq!(button.tag, "button");
        assert_eq!(
            button.children,
            vec![RawNode::Text { text: "b".into(), offset: 13 }]
        );
    }

    #[test]
    fn test_attributes() {
        let nodes = parse(r#"<a href="/x" title='it&apos;s' hidden data-n=3/>"#).unwrap();
        let a = element(&nodes[0]);
        assert_eq!(
            a.attributes,
            vec![
                ("href".to_string(), "/x".to_string()),
                ("title".to_string(), "it's".to_string()),
                ("hidden".to_string(), String::new()),
                ("data-n".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_void_element_needs_no_close() {
        let nodes = parse("<p>a<br>b</p>").unwrap();
        let p = element(&nodes[0]);
        assert_eq!(p.children.len(), 3);
        assert_eq!(element(&p.children[1]).tag, "br");
    }

    #[test]
    fn test_comments_are_skipped() {
        let nodes = parse("<ul><!-- none yet --></ul>").unwrap();
        assert!(element(&nodes[0]).children.is_empty());
    }

    #[test]
    fn test_close_tag_whitespace() {
        assert!(parse("<div>x</div >").is_ok());
    }

    #[test_case("<div>" ; "unclosed element")]
    #[test_case("<div></span>" ; "mismatched close")]
    #[test_case("</div>" ; "stray close")]
    #[test_case("<div a=1 a=2/>" ; "duplicate attribute")]
    #[test_case("<1div/>" ; "bad tag name")]
    #[test_case("<div title=\"x/>" ; "unterminated value")]
    #[test_case("<div <span/>" ; "nested open")]
    #[test_case("<!-- open" ; "unterminated comment")]
    #[test_case("<div" ; "unterminated tag")]
    fn test_malformed(input: &str) {
        let err = parse(input).unwrap_err();
        assert!(err.is_markup(), "{input}: {err}");
    }

    #[test]
    fn test_error_offset_points_at_problem() {
        let err = parse("<div><p></div>").unwrap_err();
        assert_eq!(
            err,
            Error::markup(8, "expected </p>, found </div>")
        );
    }

    #[test_case("a &amp; b", "a & b")]
    #[test_case("&lt;tag&gt;", "<tag>")]
    #[test_case("&#65;&#x42;", "AB")]
    #[test_case("fish & chips", "fish & chips")]
    #[test_case("&unknown;", "&unknown;")]
    fn test_decode_entities(raw: &str, expected: &str) {
        assert_eq!(decode_entities(raw), expected);
    }
}
