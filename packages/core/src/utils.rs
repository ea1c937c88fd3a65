// ABOUTME: Shared helpers for book tag lists
// ABOUTME: Tags are stored comma-joined and exposed as ordered string lists

use serde::{Deserialize, Deserializer, Serialize};

/// Split a stored comma-joined tag string into an ordered list.
/// Blank entries are dropped and surrounding whitespace trimmed.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join an ordered tag list into its stored form
pub fn join_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Tag list accepted from clients either as a JSON array or a comma string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagList(pub Vec<String>);

impl TagList {
    pub fn into_inner(self) -> Vec<String> {
        self.0
    }

    pub fn as_stored(&self) -> String {
        join_tags(&self.0)
    }
}

impl<'de> Deserialize<'de> for TagList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            List(Vec<String>),
            Joined(String),
        }

        let tags = match Raw::deserialize(deserializer)? {
            Raw::List(list) => split_tags(&join_tags(&list)),
            Raw::Joined(joined) => split_tags(&joined),
        };
        Ok(TagList(tags))
    }
}
