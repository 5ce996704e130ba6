use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of characters a post shows when displayed in listings and admin.
const DISPLAY_CHARS: usize = 15;

/// Post entity - a text entry owned by one author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
    /// Media storage path of the attached image.
    pub image: Option<String>,
}

impl Post {
    /// Create a new post published now.
    pub fn new(
        author_id: Uuid,
        text: String,
        group_id: Option<Uuid>,
        image: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            pub_date: Utc::now(),
            author_id,
            group_id,
            image,
        }
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short: String = self.text.chars().take(DISPLAY_CHARS).collect();
        f.write_str(&short)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_first_fifteen_chars() {
        let post = Post::new(
            Uuid::new_v4(),
            "Текстcболепятнадцатьюсимволоами".to_string(),
            None,
            None,
        );
        assert_eq!(post.to_string(), "Текстcболепятна");
    }

    #[test]
    fn short_text_displays_whole() {
        let post = Post::new(Uuid::new_v4(), "hello".to_string(), None, None);
        assert_eq!(post.to_string(), "hello");
    }
}
