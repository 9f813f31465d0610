//! Video entity, reduced to the columns redundancy bookkeeping reads.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "video")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub uuid: Uuid,

    pub name: String,

    /// ActivityPub id of the video.
    pub url: String,

    pub privacy: i32,

    /// Whether the video is owned by another instance.
    pub remote: bool,

    #[sea_orm(column_name = "isLive")]
    pub is_live: bool,

    pub views: i32,

    #[sea_orm(column_name = "channelId")]
    pub channel_id: i32,

    #[sea_orm(column_name = "publishedAt")]
    pub published_at: DateTimeWithTimeZone,

    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(column_name = "updatedAt")]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::video_streaming_playlist::Entity")]
    VideoStreamingPlaylists,
}

impl Related<super::video_streaming_playlist::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VideoStreamingPlaylists.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
