//! `SeaORM` entities of the tables written through the ORM.

pub mod video;
pub mod video_redundancy;
pub mod video_streaming_playlist;

pub use video::Entity as Video;
pub use video_redundancy::Entity as VideoRedundancy;
pub use video_streaming_playlist::Entity as VideoStreamingPlaylist;
