//! Incremental search over the compiled-in post list.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::contract::{
    ACTIVE_CLASS, SEARCH_CATEGORY_CLASS, SEARCH_FORM, SEARCH_HIGHLIGHT_TAG, SEARCH_INPUT,
    SEARCH_NO_RESULTS_CLASS, SEARCH_RESULTS, SEARCH_TITLE_CLASS, SEARCH_TOGGLE, SHOW_CLASS,
};
use crate::dom::{Document, El, NodeId};
use crate::error::PageResult;
use crate::events::{EventKind, EventTarget};
use crate::page::Page;
use crate::scheduler::Debouncer;

/// One searchable post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchEntry {
    pub title: &'static str,
    pub category: &'static str,
    pub url: &'static str,
}

pub const CORPUS: [SearchEntry; 5] = [
    SearchEntry {
        title: "Advanced CSS Animations",
        category: "CSS",
        url: "/blog/css-animations",
    },
    SearchEntry {
        title: "JavaScript Best Practices",
        category: "JavaScript",
        url: "/blog/js-best-practices",
    },
    SearchEntry {
        title: "Getting Started with React",
        category: "React",
        url: "/blog/react-intro",
    },
    SearchEntry {
        title: "CSS Grid Layout",
        category: "CSS",
        url: "/blog/css-grid",
    },
    SearchEntry {
        title: "Responsive Design Tips",
        category: "Design",
        url: "/blog/responsive-design",
    },
];

/// Trimmed, lowercased form of a raw field value
pub fn normalize_query(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Entries whose title or category contains `query` (already normalized)
pub fn filter_entries<'a>(corpus: &'a [SearchEntry], query: &str) -> Vec<&'a SearchEntry> {
    corpus
        .iter()
        .filter(|entry| {
            entry.title.to_lowercase().contains(query) || entry.category.to_lowercase().contains(query)
        })
        .collect()
}

/// A run of title text, highlighted or not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub highlighted: bool,
}

// Byte length of a case-insensitive match of `query` at the start of `text`
fn match_len(text: &str, query: &str) -> Option<usize> {
    let mut wanted = query.chars().peekable();
    wanted.peek()?;
    for (offset, ch) in text.char_indices() {
        for lower in ch.to_lowercase() {
            if wanted.next() != Some(lower) {
                return None;
            }
        }
        if wanted.peek().is_none() {
            return Some(offset + ch.len_utf8());
        }
    }
    None
}

/// Split `text` around every non-overlapping, case-insensitive occurrence of
/// `query`. The query is matched literally.
pub fn highlight_segments<'a>(text: &'a str, query: &str) -> Vec<Segment<'a>> {
    let mut segments = Vec::new();
    if query.is_empty() {
        segments.push(Segment {
            text,
            highlighted: false,
        });
        return segments;
    }

    let mut plain_start = 0;
    let mut cursor = 0;
    while cursor < text.len() {
        if let Some(len) = match_len(&text[cursor..], query) {
            if plain_start < cursor {
                segments.push(Segment {
                    text: &text[plain_start..cursor],
                    highlighted: false,
                });
            }
            segments.push(Segment {
                text: &text[cursor..cursor + len],
                highlighted: true,
            });
            cursor += len;
            plain_start = cursor;
        } else {
            cursor += text[cursor..].chars().next().map_or(1, char::len_utf8);
        }
    }
    if plain_start < text.len() {
        segments.push(Segment {
            text: &text[plain_start..],
            highlighted: false,
        });
    }
    segments
}

/// Title markup with `<mark>` around each match
pub fn highlight_markup(text: &str, query: &str) -> String {
    highlight_segments(text, query)
        .into_iter()
        .map(|s| {
            if s.highlighted {
                format!("<{SEARCH_HIGHLIGHT_TAG}>{}</{SEARCH_HIGHLIGHT_TAG}>", s.text)
            } else {
                s.text.to_string()
            }
        })
        .collect()
}

fn append_highlighted(doc: &mut Document, parent: NodeId, text: &str, query: &str) -> PageResult<()> {
    for segment in highlight_segments(text, query) {
        let node = if segment.highlighted {
            let mark = doc.create_element(SEARCH_HIGHLIGHT_TAG);
            let inner = doc.create_text(segment.text);
            doc.append_child(mark, inner)?;
            mark
        } else {
            doc.create_text(segment.text)
        };
        doc.append_child(parent, node)?;
    }
    Ok(())
}

/// Replace the panel's content with the rendered matches
pub fn render_results(
    doc: &mut Document,
    panel: NodeId,
    query: &str,
    matches: &[&SearchEntry],
) -> PageResult<()> {
    doc.clear_children(panel);

    if matches.is_empty() {
        doc.append(
            panel,
            El::new("p")
                .class(SEARCH_NO_RESULTS_CLASS)
                .text(format!("No results found for \"{query}\"")),
        );
        return Ok(());
    }

    let list = doc.append(panel, El::new("ul"));
    for entry in matches {
        let item = doc.append(list, El::new("li"));
        let link = doc.append(item, El::new("a").attr("href", entry.url));
        let title = doc.append(link, El::new("span").class(SEARCH_TITLE_CLASS));
        append_highlighted(doc, title, entry.title, query)?;
        doc.append(
            link,
            El::new("span").class(SEARCH_CATEGORY_CLASS).text(entry.category),
        );
    }
    Ok(())
}

/// Evaluate the field's current value against the corpus
fn run_query(page: &mut Page, input: NodeId, panel: NodeId) -> PageResult<()> {
    let query = normalize_query(page.document.value(input));
    if query.chars().count() < page.config().search_min_chars {
        page.document.clear_children(panel);
        page.document.remove_class(panel, SHOW_CLASS);
        return Ok(());
    }

    let matches = filter_entries(&CORPUS, &query);
    debug!(%query, matches = matches.len(), "search evaluated");
    render_results(&mut page.document, panel, &query, &matches)?;
    page.document.add_class(panel, SHOW_CLASS);
    Ok(())
}

pub fn init(page: &mut Page) -> PageResult<bool> {
    let (Some(toggle), Some(form)) = (
        page.document.query(SEARCH_TOGGLE)?,
        page.document.query(SEARCH_FORM)?,
    ) else {
        return Ok(false);
    };
    let input = page.document.query(SEARCH_INPUT)?;
    let panel = page.document.query(SEARCH_RESULTS)?;

    page.add_listener(EventTarget::Node(toggle), EventKind::Click, move |page, event| {
        event.prevent_default();
        let open = page.document.toggle_class(form, ACTIVE_CLASS);
        if let (true, Some(input)) = (open, input) {
            page.focus(input);
        }
    });

    page.add_listener(EventTarget::Document, EventKind::KeyDown, move |page, event| {
        if event.is_key("Escape") && page.document.has_class(form, ACTIVE_CLASS) {
            page.document.remove_class(form, ACTIVE_CLASS);
        }
    });

    let (Some(input), Some(panel)) = (input, panel) else {
        debug!("search bound without live results");
        return Ok(true);
    };

    let debouncer = Rc::new(RefCell::new(Debouncer::new()));
    let delay = page.config().search_debounce_ms;
    page.add_listener(EventTarget::Node(input), EventKind::Input, move |page, _| {
        debouncer
            .borrow_mut()
            .schedule(&mut page.scheduler, delay, move |page| {
                if let Err(err) = run_query(page, input, panel) {
                    warn!(error = %err, "could not render search results");
                }
            });
    });

    page.add_listener(EventTarget::Document, EventKind::Click, move |page, event| {
        let inside = event.target.is_some_and(|t| page.document.contains(form, t));
        if !inside {
            page.document.remove_class(panel, SHOW_CLASS);
        }
    });

    Ok(true)
}
