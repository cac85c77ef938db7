//! Wire-format frames for the real-time reaction channel.
//!
//! Both directions are JSON objects tagged by a `type` field. Field names
//! match the backend exactly (camelCase), so these types are the single
//! source of truth for the channel protocol.

use serde::{Deserialize, Serialize};

use crate::reaction::ReactionKind;

// ---------------------------------------------------------------------------
// Server → Client frames
// ---------------------------------------------------------------------------

/// A push frame received from the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerFrame {
    /// Authoritative aggregate count for one `(invitation, kind)` pair.
    #[serde(rename = "REACTION_UPDATE")]
    ReactionUpdate {
        #[serde(rename = "invitationId")]
        invitation_id: String,
        #[serde(rename = "reactionType")]
        reaction_type: ReactionKind,
        count: u64,
    },
}

// ---------------------------------------------------------------------------
// Client → Server frames
// ---------------------------------------------------------------------------

/// A frame sent by the client over the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    /// React to a media item in an event gallery.
    #[serde(rename = "REACT_TO_IMAGE")]
    ReactToImage {
        #[serde(rename = "imageId")]
        image_id: String,
        #[serde(rename = "reactionType")]
        reaction_type: ReactionKind,
    },
}
