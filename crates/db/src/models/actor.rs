//! Channel, account and actor graph nodes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Actor image types.
pub mod actor_image_type {
    /// Avatar image.
    pub const AVATAR: i32 = 1;
    /// Banner image.
    pub const BANNER: i32 = 2;
}

/// A video channel, owned by exactly one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoChannel {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub actor_id: i32,
    #[serde(default)]
    pub account_id: Option<i32>,

    #[serde(default)]
    pub actor: Option<Actor>,
    #[serde(default)]
    pub account: Option<Account>,
}

/// An account, owning exactly one actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub actor_id: Option<i32>,
    #[serde(default)]
    pub user_id: Option<i32>,

    #[serde(default)]
    pub actor: Option<Actor>,
    /// Blocklist entries of the viewer targeting this account.
    #[serde(default)]
    pub blocked_by: Vec<Blocklist>,
}

/// A federated actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: i32,
    pub preferred_username: String,
    pub url: String,
    #[serde(default)]
    pub server_id: Option<i32>,
    #[serde(default)]
    pub followers_count: Option<i32>,
    #[serde(default)]
    pub following_count: Option<i32>,
    #[serde(default)]
    pub inbox_url: Option<String>,
    #[serde(default)]
    pub shared_inbox_url: Option<String>,

    #[serde(default)]
    pub server: Option<Server>,
    #[serde(default)]
    pub avatars: Vec<ActorImage>,
}

/// An actor image (avatar or banner).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorImage {
    pub id: i32,
    #[serde(default)]
    pub width: Option<i32>,
    pub filename: String,
    #[serde(default)]
    pub file_url: Option<String>,
    pub on_disk: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A remote server. Local actors have none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub id: i32,
    pub host: String,
    #[serde(default)]
    pub redundancy_allowed: Option<bool>,

    /// Blocklist entries of the viewer targeting this server.
    #[serde(default)]
    pub blocked_by: Vec<Blocklist>,
}

/// An account or server blocklist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blocklist {
    pub id: i32,
}
