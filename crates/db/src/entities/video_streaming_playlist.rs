//! HLS streaming playlist entity.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "videoStreamingPlaylist")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Playlist type (1 = HLS).
    #[sea_orm(column_name = "type")]
    pub kind: i32,

    /// Master playlist URL on the origin instance.
    #[sea_orm(column_name = "playlistUrl")]
    pub playlist_url: Option<String>,

    #[sea_orm(column_name = "playlistFilename")]
    pub playlist_filename: Option<String>,

    #[sea_orm(column_name = "segmentsSha256Url")]
    pub segments_sha256_url: Option<String>,

    #[sea_orm(column_name = "videoId")]
    pub video_id: i32,

    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(column_name = "updatedAt")]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::video::Entity",
        from = "Column::VideoId",
        to = "super::video::Column::Id",
        on_delete = "Cascade"
    )]
    Video,
    #[sea_orm(has_many = "super::video_redundancy::Entity")]
    VideoRedundancies,
}

impl Related<super::video::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Video.def()
    }
}

impl Related<super::video_redundancy::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VideoRedundancies.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
