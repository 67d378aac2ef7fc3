//! Form validation with inline error messages.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::contract::{ERROR_MESSAGE_CLASS, FIELD_ERROR_CLASS, LIVE_FIELDS, REQUIRED_FIELD, VALIDATED_FORM};
use crate::dom::{El, NodeId};
use crate::error::PageResult;
use crate::events::{EventKind, EventTarget};
use crate::page::Page;

pub const REQUIRED_MESSAGE: &str = "This field is required";
pub const EMAIL_MESSAGE: &str = "Please enter a valid email address";

const EMAIL_PATTERN: &str = r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#;

fn email_pattern() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| match Regex::new(EMAIL_PATTERN) {
            Ok(re) => Some(re),
            Err(err) => {
                warn!(error = %err, "email pattern failed to compile");
                None
            }
        })
        .as_ref()
}

/// Shape check for an address, case-insensitive
pub fn is_valid_email(value: &str) -> bool {
    email_pattern().is_some_and(|re| re.is_match(&value.to_lowercase()))
}

/// Which message a field currently deserves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    Required,
    InvalidEmail,
}

impl FieldError {
    pub fn message(self) -> &'static str {
        match self {
            FieldError::Required => REQUIRED_MESSAGE,
            FieldError::InvalidEmail => EMAIL_MESSAGE,
        }
    }
}

fn is_email_field(page: &Page, field: NodeId) -> bool {
    page.document
        .attr(field, "type")
        .is_some_and(|t| t.eq_ignore_ascii_case("email"))
}

/// Rule applied to required fields on submit
fn submit_error(page: &Page, field: NodeId) -> Option<FieldError> {
    let value = page.document.value(field);
    if value.trim().is_empty() {
        Some(FieldError::Required)
    } else if is_email_field(page, field) && !is_valid_email(value) {
        Some(FieldError::InvalidEmail)
    } else {
        None
    }
}

/// Rule applied to any field when it loses focus
fn blur_error(page: &Page, field: NodeId) -> Option<FieldError> {
    let value = page.document.value(field);
    let blank = value.trim().is_empty();
    if page.document.has_attr(field, "required") && blank {
        Some(FieldError::Required)
    } else if is_email_field(page, field) && !blank && !is_valid_email(value) {
        Some(FieldError::InvalidEmail)
    } else {
        None
    }
}

/// Field to error-message node, at most one entry per field
#[derive(Debug, Default)]
pub struct ErrorTable {
    messages: HashMap<NodeId, NodeId>,
}

impl ErrorTable {
    pub fn message_for(&self, field: NodeId) -> Option<NodeId> {
        self.messages.get(&field).copied()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Mark `field` and append its message next to it, replacing any
    /// previous marker
    pub fn show(&mut self, page: &mut Page, field: NodeId, error: FieldError) -> PageResult<()> {
        self.remove(page, field)?;
        page.document.add_class(field, FIELD_ERROR_CLASS);

        let Some(parent) = page.document.parent(field) else {
            warn!(%field, "field has no parent for its error message");
            return Ok(());
        };
        let message = page.document.append(
            parent,
            El::new("div").class(ERROR_MESSAGE_CLASS).text(error.message()),
        );
        self.messages.insert(field, message);
        Ok(())
    }

    /// Clear both parts of the field's marker
    pub fn remove(&mut self, page: &mut Page, field: NodeId) -> PageResult<()> {
        page.document.remove_class(field, FIELD_ERROR_CLASS);
        let Some(message) = self.messages.remove(&field) else {
            return Ok(());
        };
        if let Some(parent) = page.document.parent(message) {
            page.document.remove_child(parent, message)?;
        }
        Ok(())
    }

    fn apply(&mut self, page: &mut Page, field: NodeId, error: Option<FieldError>) {
        let result = match error {
            Some(error) => self.show(page, field, error),
            None => self.remove(page, field),
        };
        if let Err(err) = result {
            warn!(%field, error = %err, "could not update field error");
        }
    }
}

/// Bind one form; returns its error table
pub fn bind_form(page: &mut Page, form: NodeId) -> PageResult<Rc<RefCell<ErrorTable>>> {
    let table = Rc::new(RefCell::new(ErrorTable::default()));
    let required = page.document.query_all_in(form, REQUIRED_FIELD)?;

    let errors = Rc::clone(&table);
    page.add_listener(EventTarget::Node(form), EventKind::Submit, move |page, event| {
        let mut valid = true;
        let mut table = errors.borrow_mut();
        for field in &required {
            table.apply(page, *field, None);
            if let Some(error) = submit_error(page, *field) {
                table.apply(page, *field, Some(error));
                valid = false;
            }
        }
        if !valid {
            debug!(%form, errors = table.len(), "submission blocked");
            event.prevent_default();
        }
    });

    for field in page.document.query_all_in(form, LIVE_FIELDS)? {
        let errors = Rc::clone(&table);
        page.add_listener(EventTarget::Node(field), EventKind::Blur, move |page, _| {
            let error = blur_error(page, field);
            errors.borrow_mut().apply(page, field, error);
        });

        let errors = Rc::clone(&table);
        page.add_listener(EventTarget::Node(field), EventKind::Input, move |page, _| {
            if !page.document.value(field).trim().is_empty() {
                errors.borrow_mut().apply(page, field, None);
            }
        });
    }

    Ok(table)
}

pub fn init(page: &mut Page) -> PageResult<bool> {
    let forms = page.document.query_all(VALIDATED_FORM)?;
    for form in &forms {
        bind_form(page, *form)?;
    }
    Ok(!forms.is_empty())
}
