//! Submitted form data and its validation.
//!
//! A form is always renderable: whether blank, pre-filled or bound to an
//! invalid submission, it carries the values to show and per-field errors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Post;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Field name to error messages.
pub type FieldErrors = BTreeMap<&'static str, Vec<String>>;

/// Raw post form submission. Every field may be absent.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PostInput {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Validated post fields, ready to persist once the group is confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanPost {
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
}

/// Post create/edit form.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostForm {
    pub text: String,
    pub group: Option<String>,
    pub image: Option<String>,
    pub errors: FieldErrors,
}

impl PostForm {
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn bind(input: PostInput) -> Self {
        Self {
            text: input.text.unwrap_or_default(),
            group: non_empty(input.group),
            image: non_empty(input.image),
            errors: FieldErrors::new(),
        }
    }

    /// Form pre-filled with an existing post's values.
    pub fn from_post(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id.map(|id| id.to_string()),
            image: post.image.clone(),
            errors: FieldErrors::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: &'static str, message: &str) {
        self.errors
            .entry(field)
            .or_default()
            .push(message.to_string());
    }

    /// Check field-level rules. Group existence is checked by the caller,
    /// which reports a missing group through [`PostForm::add_error`].
    pub fn clean(&mut self) -> Option<CleanPost> {
        let text = self.text.trim().to_string();
        if text.is_empty() {
            self.add_error("text", REQUIRED);
        }

        let group_id = match self.group.as_deref() {
            None => None,
            Some(raw) => match Uuid::parse_str(raw.trim()) {
                Ok(id) => Some(id),
                Err(_) => {
                    self.add_error("group", INVALID_CHOICE);
                    None
                }
            },
        };

        if !self.is_valid() {
            return None;
        }

        Some(CleanPost {
            text,
            group_id,
            image: self.image.clone(),
        })
    }
}

/// Raw comment form submission.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CommentInput {
    #[serde(default)]
    pub text: Option<String>,
}

/// Comment form.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommentForm {
    pub text: String,
    pub errors: FieldErrors,
}

impl CommentForm {
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn bind(input: CommentInput) -> Self {
        Self {
            text: input.text.unwrap_or_default(),
            errors: FieldErrors::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the trimmed comment text when valid.
    pub fn clean(&mut self) -> Option<String> {
        let text = self.text.trim().to_string();
        if text.is_empty() {
            self.errors
                .entry("text")
                .or_default()
                .push(REQUIRED.to_string());
            return None;
        }
        Some(text)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
