//! REST payload types for invitations and the public feed.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reaction::ReactionKind;

/// Per-kind aggregate as the REST API returns it: a count plus the emails
/// of the users who reacted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReactionEntry {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub users: Vec<String>,
}

/// Reaction aggregates for one invitation, keyed by kind.
pub type ReactionMap = HashMap<ReactionKind, ReactionEntry>;

/// An uploaded media item (invitation image or event gallery entry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRef {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    pub url: String,
}

/// One invitation as it appears in feed and listing responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPost {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "eventName", default)]
    pub event_name: Option<String>,
    #[serde(rename = "createdByEmail", default)]
    pub created_by_email: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "dateTime", default)]
    pub date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "invitationImage", default)]
    pub invitation_image: Option<MediaRef>,
    #[serde(rename = "eventMedia", default)]
    pub event_media: Vec<MediaRef>,
    #[serde(default)]
    pub reactions: ReactionMap,
}

impl FeedPost {
    /// Count for one reaction kind as last confirmed by the server.
    pub fn reaction_count(&self, kind: ReactionKind) -> u64 {
        self.reactions.get(&kind).map(|e| e.count).unwrap_or(0)
    }

    /// Whether the given identity already reacted with `kind`.
    pub fn has_reacted(&self, kind: ReactionKind, email: &str) -> bool {
        self.reactions
            .get(&kind)
            .map(|e| e.users.iter().any(|u| u == email))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_feed_post() {
        let json = r#"{
            "_id": "inv_42",
            "eventName": "Rooftop Party",
            "createdByEmail": "host@example.com",
            "createdAt": "2025-06-01T18:00:00Z",
            "invitationImage": { "_id": "img_1", "url": "https://cdn.example.com/a.jpg" },
            "eventMedia": [{ "url": "https://cdn.example.com/b.jpg" }],
            "reactions": {
                "cheer": { "count": 3, "users": ["a@example.com", "b@example.com", "c@example.com"] }
            }
        }"#;
        let post: FeedPost = serde_json::from_str(json).unwrap();
        assert_eq!(post.id, "inv_42");
        assert_eq!(post.event_name.as_deref(), Some("Rooftop Party"));
        assert_eq!(post.reaction_count(ReactionKind::Cheer), 3);
        assert_eq!(post.reaction_count(ReactionKind::Hype), 0);
        assert!(post.has_reacted(ReactionKind::Cheer, "a@example.com"));
        assert!(!post.has_reacted(ReactionKind::Cheer, "z@example.com"));
        assert_eq!(post.event_media.len(), 1);
    }

    #[test]
    fn tolerates_missing_optional_fields() {
        let post: FeedPost = serde_json::from_str(r#"{ "_id": "inv_1" }"#).unwrap();
        assert!(post.reactions.is_empty());
        assert!(post.invitation_image.is_none());
        assert!(post.event_media.is_empty());
    }
}
