//! Record types returned by the remote data source
//!
//! The field names follow the JSON shape of the API: camelCase keys, the
//! owning person of a post or comment nested under `owner`, and list calls
//! wrapped in a `{ "data": [...] }` envelope.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A person record, as returned by the detail endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Person {
    pub title: String,
    pub first_name: String,
    pub last_name: String,
    /// Natural key for people and for posts they own
    pub email: String,
    pub gender: String,
}

/// A post with its owner denormalized into it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Post {
    pub owner: Person,
    pub text: String,
    pub likes: u64,
    pub tags: Vec<String>,
    /// Kept as the source sends it; never parsed
    pub publish_date: String,
}

/// A comment with its owner denormalized into it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
    pub id: String,
    pub message: String,
    pub owner: Person,
}

/// The partial projection the people list call returns
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersonRef {
    pub id: String,
}

/// Envelope wrapping every list response
#[derive(Debug, Clone, Deserialize)]
pub struct ListEnvelope<T> {
    pub data: Vec<T>,
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "User: {} {} {} {} {}",
            self.title, self.first_name, self.last_name, self.email, self.gender
        )
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Post: Posted by {} {}:\n{}\nLikes: {} Tags: [{}]\nDate posted: {}",
            self.owner.first_name,
            self.owner.last_name,
            self.text,
            self.likes,
            self.tags.join(" "),
            self.publish_date
        )
    }
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Comment: {} by {} {}",
            self.message, self.owner.first_name, self.owner.last_name
        )
    }
}

/// The three kinds of record the harvest collects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Person,
    Post,
    Comment,
}

impl ResourceKind {
    /// Every kind, in the order units are launched for a page
    pub const ALL: [ResourceKind; 3] = [Self::Person, Self::Post, Self::Comment];

    /// Path segment of the list endpoint for this kind
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Person => "user",
            Self::Post => "post",
            Self::Comment => "comment",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Post => "post",
            Self::Comment => "comment",
        }
    }

    fn plural_label(&self) -> &'static str {
        match self {
            Self::Person => "Users",
            Self::Post => "Posts",
            Self::Comment => "Comments",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (page, kind) unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    /// 1-based page number
    pub page: u32,
    pub kind: ResourceKind,
}

impl PageRequest {
    pub fn new(page: u32, kind: ResourceKind) -> Self {
        Self { page, kind }
    }

    /// Descriptive name used for the unit's trace span
    pub fn span_label(&self) -> String {
        format!("Scraping {} Page {}", self.kind.plural_label(), self.page)
    }
}

impl fmt::Display for PageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} page {}", self.kind, self.page)
    }
}

/// A collected record of any kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Person(Person),
    Post(Post),
    Comment(Comment),
}

impl Record {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Person(_) => ResourceKind::Person,
            Self::Post(_) => ResourceKind::Post,
            Self::Comment(_) => ResourceKind::Comment,
        }
    }

    /// Key used for both sinks: email for people and posts, id for comments
    pub fn natural_key(&self) -> &str {
        match self {
            Self::Person(person) => &person.email,
            Self::Post(post) => &post.owner.email,
            Self::Comment(comment) => &comment.id,
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Person(person) => person.fmt(f),
            Self::Post(post) => post.fmt(f),
            Self::Comment(comment) => comment.fmt(f),
        }
    }
}

impl From<Person> for Record {
    fn from(person: Person) -> Self {
        Self::Person(person)
    }
}

impl From<Post> for Record {
    fn from(post: Post) -> Self {
        Self::Post(post)
    }
}

impl From<Comment> for Record {
    fn from(comment: Comment) -> Self {
        Self::Comment(comment)
    }
}
