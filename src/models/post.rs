use std::collections::BTreeSet;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PICTURE: &str = "https://via.placeholder.com/100";
pub const DEFAULT_USERNAME: &str = "Unknown User";
pub const DEFAULT_CAPTION: &str = "No caption";

/// Populated author reference; the backend may omit any part of it.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

impl Author {
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(DEFAULT_USERNAME)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub author: Option<Author>,
    pub text: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Ids of the users who liked this post. A set, so an id is never counted twice.
    #[serde(default)]
    pub likes: BTreeSet<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn author_id(&self) -> Option<&str> {
        self.author.as_ref().and_then(|a| a.id.as_deref())
    }

    pub fn author_name(&self) -> &str {
        self.author
            .as_ref()
            .map(Author::display_name)
            .unwrap_or(DEFAULT_USERNAME)
    }

    pub fn caption(&self) -> &str {
        self.caption.as_deref().unwrap_or(DEFAULT_CAPTION)
    }

    pub fn image(&self) -> &str {
        self.image.as_deref().unwrap_or(DEFAULT_PICTURE)
    }

    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.contains(user_id)
    }

    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    /// Local time formatted for the feed header, if the backend sent one.
    pub fn datetime(&self) -> Option<String> {
        self.created_at.map(|utc| {
            let local_time: DateTime<Local> = DateTime::from(utc);
            local_time.format("%H:%M %h-%d-%Y").to_string()
        })
    }
}
