//! Video redundancy entity: a cached copy of a streaming playlist.

use sea_orm::entity::prelude::*;

/// A redundancy of a streaming playlist, held by the actor `actor_id`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "videoRedundancy")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// No expiration when unset.
    #[sea_orm(column_name = "expiresOn")]
    pub expires_on: Option<DateTimeWithTimeZone>,

    /// Where the cached playlist is served from.
    #[sea_orm(column_name = "fileUrl")]
    pub file_url: String,

    /// ActivityPub id of the cache file. Unique.
    #[sea_orm(unique)]
    pub url: String,

    /// Strategy that created this redundancy. Only set on our own redundancies.
    pub strategy: Option<String>,

    #[sea_orm(column_name = "actorId")]
    pub actor_id: i32,

    #[sea_orm(column_name = "videoStreamingPlaylistId")]
    pub video_streaming_playlist_id: i32,

    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(column_name = "updatedAt")]
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Whether this instance created the redundancy.
    #[must_use]
    pub const fn is_owned(&self) -> bool {
        self.strategy.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::video_streaming_playlist::Entity",
        from = "Column::VideoStreamingPlaylistId",
        to = "super::video_streaming_playlist::Column::Id",
        on_delete = "Cascade"
    )]
    VideoStreamingPlaylist,
}

impl Related<super::video_streaming_playlist::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VideoStreamingPlaylist.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
