//! Serializable page fixtures.
//!
//! Hosts without a real browser describe the page body as a tree of
//! [`NodeSpec`] values (usually JSON) and mount it with
//! [`Document::from_spec`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Document, El, Rect};

/// One element of a page fixture
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSpec {
    pub tag: String,
    /// Space-separated class list
    pub class: Option<String>,
    pub attrs: BTreeMap<String, String>,
    pub text: Option<String>,
    pub value: Option<String>,
    pub rect: Option<Rect>,
    pub children: Vec<NodeSpec>,
}

impl From<NodeSpec> for El {
    fn from(spec: NodeSpec) -> Self {
        let tag = if spec.tag.is_empty() { "div".to_string() } else { spec.tag };
        let mut el = El::new(tag);
        if let Some(class) = &spec.class {
            el = el.class(class);
        }
        for (name, value) in spec.attrs {
            el = el.attr(name, value);
        }
        if let Some(text) = spec.text {
            el = el.text(text);
        }
        if let Some(value) = spec.value {
            el = el.value(value);
        }
        if let Some(rect) = spec.rect {
            el = el.rect(rect);
        }
        el.children(spec.children.into_iter().map(El::from))
    }
}

impl Document {
    /// Build a document whose body holds `spec`.
    ///
    /// A spec tagged `body` is merged into the body element instead of
    /// being nested inside it.
    pub fn from_spec(spec: NodeSpec) -> Self {
        let mut doc = Document::new();
        let body = doc.body();
        if spec.tag == "body" {
            if let Some(class) = &spec.class {
                for c in class.split_whitespace() {
                    doc.add_class(body, c);
                }
            }
            for (name, value) in &spec.attrs {
                doc.set_attr(body, name, value);
            }
            if let Some(rect) = spec.rect {
                doc.set_layout(body, rect);
            }
            for child in spec.children {
                doc.append(body, child.into());
            }
        } else {
            doc.append(body, spec.into());
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_from_json() {
        let json = r##"{
            "tag": "body",
            "class": "home",
            "children": [
                {"tag": "a", "class": "back-to-top", "attrs": {"href": "#"}},
                {"tag": "div", "class": "card-3d card",
                 "rect": {"x": 0, "y": 100, "width": 200, "height": 100}}
            ]
        }"##;
        let spec: NodeSpec = serde_json::from_str(json).unwrap();
        let doc = Document::from_spec(spec);

        assert!(doc.has_class(doc.body(), "home"));
        let card = doc.query(".card-3d").unwrap().unwrap();
        assert!(doc.has_class(card, "card"));
        assert_eq!(doc.layout(card).height, 100.0);
        let link = doc.query(".back-to-top").unwrap().unwrap();
        assert_eq!(doc.attr(link, "href"), Some("#"));
    }

    #[test]
    fn test_non_body_spec_is_nested() {
        let spec = NodeSpec {
            tag: "main".to_string(),
            ..Default::default()
        };
        let doc = Document::from_spec(spec);
        let main = doc.query("main").unwrap().unwrap();
        assert_eq!(doc.parent(main), Some(doc.body()));
    }
}
