//! Minimal CSS selector engine.
//!
//! Supports what the page contract needs: type, class, id and attribute
//! (presence or exact value) simple selectors, compounds of those, the
//! descendant combinator and comma-separated lists. Quoted attribute values
//! may contain spaces and commas.

use crate::error::{PageError, PageResult};

use super::{Document, NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrTest {
    Present(String),
    Equals(String, String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.attrs.is_empty()
    }

    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(tag) = doc.tag(node) else {
            return false;
        };
        if let Some(want) = &self.tag {
            if want != "*" && want != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if doc.attr(node, "id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| doc.has_class(node, c)) {
            return false;
        }
        self.attrs.iter().all(|test| match test {
            AttrTest::Present(name) => doc.has_attr(node, name),
            AttrTest::Equals(name, value) => doc.attr(node, name) == Some(value.as_str()),
        })
    }
}

/// A parsed, reusable selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    // Each entry is a descendant chain, outermost compound first.
    chains: Vec<Vec<Compound>>,
}

impl SelectorList {
    pub fn parse(input: &str) -> PageResult<Self> {
        let mut chains = Vec::new();
        for part in split_top_level(input, |c| c == ',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(PageError::Selector(input.to_string()));
            }
            let chain = split_top_level(part, char::is_whitespace)
                .into_iter()
                .filter(|token| !token.is_empty())
                .map(|token| parse_compound(token).ok_or_else(|| PageError::Selector(input.to_string())))
                .collect::<PageResult<Vec<_>>>()?;
            chains.push(chain);
        }
        Ok(Self { chains })
    }

    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.chains.iter().any(|chain| matches_chain(doc, node, chain))
    }
}

fn matches_chain(doc: &Document, node: NodeId, chain: &[Compound]) -> bool {
    let Some((last, outer)) = chain.split_last() else {
        return false;
    };
    if !last.matches(doc, node) {
        return false;
    }
    let mut current = node;
    for compound in outer.iter().rev() {
        match doc.ancestors(current).find(|a| compound.matches(doc, *a)) {
            Some(ancestor) => current = ancestor,
            None => return false,
        }
    }
    true
}

/// Split on `is_sep`, ignoring separators inside `[...]` and quotes
fn split_top_level(input: &str, is_sep: impl Fn(char) -> bool) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut in_brackets = false;
    let mut quote: Option<char> = None;
    for (offset, ch) in input.char_indices() {
        match (quote, ch) {
            (Some(open), _) if ch == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') if in_brackets => quote = Some(ch),
            (None, '[') => in_brackets = true,
            (None, ']') => in_brackets = false,
            (None, _) if !in_brackets && is_sep(ch) => {
                pieces.push(&input[start..offset]);
                start = offset + ch.len_utf8();
            }
            _ => {}
        }
    }
    pieces.push(&input[start..]);
    pieces
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

fn take_ident(chars: &[char], pos: &mut usize) -> Option<String> {
    let start = *pos;
    while *pos < chars.len() && is_ident_char(chars[*pos]) {
        *pos += 1;
    }
    (*pos > start).then(|| chars[start..*pos].iter().collect())
}

fn parse_compound(token: &str) -> Option<Compound> {
    let chars: Vec<char> = token.chars().collect();
    let mut pos = 0;
    let mut compound = Compound::default();

    if chars.first() == Some(&'*') {
        compound.tag = Some("*".to_string());
        pos = 1;
    } else if chars.first().is_some_and(|c| is_ident_char(*c)) {
        compound.tag = Some(take_ident(&chars, &mut pos)?.to_ascii_lowercase());
    }

    while pos < chars.len() {
        match chars[pos] {
            '.' => {
                pos += 1;
                compound.classes.push(take_ident(&chars, &mut pos)?);
            }
            '#' => {
                pos += 1;
                compound.id = Some(take_ident(&chars, &mut pos)?);
            }
            '[' => {
                pos += 1;
                let name = take_ident(&chars, &mut pos)?;
                match chars.get(pos)? {
                    ']' => {
                        pos += 1;
                        compound.attrs.push(AttrTest::Present(name));
                    }
                    '=' => {
                        pos += 1;
                        let value = match chars.get(pos)? {
                            quote @ ('"' | '\'') => {
                                let open = pos + 1;
                                let end = chars[open..].iter().position(|c| c == quote)? + open;
                                pos = end + 1;
                                chars[open..end].iter().collect()
                            }
                            _ => take_ident(&chars, &mut pos)?,
                        };
                        if chars.get(pos) != Some(&']') {
                            return None;
                        }
                        pos += 1;
                        compound.attrs.push(AttrTest::Equals(name, value));
                    }
                    _ => return None,
                }
            }
            _ => return None,
        }
    }

    (!compound.is_empty()).then_some(compound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::El;

    fn page() -> Document {
        let mut doc = Document::new();
        doc.append(
            doc.body(),
            El::new("form")
                .attr("data-validate", "")
                .attr("id", "contact")
                .child(El::new("input").attr("type", "email").attr("required", ""))
                .child(El::new("textarea"))
                .child(El::new("div").class("category-filter").child(
                    El::new("button").data("category", "all"),
                )),
        );
        doc
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(SelectorList::parse("").is_err());
        assert!(SelectorList::parse("a,,b").is_err());
        assert!(SelectorList::parse(".").is_err());
        assert!(SelectorList::parse("div>p").is_err());
        assert!(SelectorList::parse("[data-x").is_err());
        assert!(SelectorList::parse("[title=\"open]").is_err());
        assert!(SelectorList::parse("[title=a b]").is_err());
    }

    #[test]
    fn test_attribute_presence_and_value() {
        let doc = page();
        assert_eq!(doc.query_all("form[data-validate]").unwrap().len(), 1);
        assert_eq!(doc.query_all("[required]").unwrap().len(), 1);
        assert_eq!(doc.query_all("input[type=email]").unwrap().len(), 1);
        assert_eq!(doc.query_all("input[type=\"text\"]").unwrap().len(), 0);
    }

    #[test]
    fn test_quoted_values_keep_spaces_and_commas() {
        let mut doc = page();
        doc.append(
            doc.body(),
            El::new("article")
                .attr("data-title", "a b")
                .child(El::new("span").attr("data-tags", "css, grid")),
        );
        assert_eq!(doc.query_all("[data-title=\"a b\"]").unwrap().len(), 1);
        assert_eq!(doc.query_all("[data-title='a b'] span").unwrap().len(), 1);
        assert_eq!(doc.query_all("span[data-tags=\"css, grid\"], textarea").unwrap().len(), 2);
        assert_eq!(doc.query_all("[data-title=\"a\"]").unwrap().len(), 0);
    }

    #[test]
    fn test_lists_and_descendants() {
        let doc = page();
        assert_eq!(doc.query_all("input, textarea, select").unwrap().len(), 2);
        assert_eq!(doc.query_all(".category-filter button").unwrap().len(), 1);
        assert_eq!(doc.query_all("#contact .category-filter button").unwrap().len(), 1);
        assert_eq!(doc.query_all("nav .category-filter button").unwrap().len(), 0);
    }
}
