//! In-memory graphs materialized from flattened SQL rows.

pub mod actor;
pub mod comment;
pub mod video;

pub use actor::{Account, Actor, ActorImage, Blocklist, Server, VideoChannel, actor_image_type};
pub use comment::{CommentAutomaticTag, CommentVideo, VideoComment};
pub use video::{
    AutomaticTag, ScheduleVideoUpdate, Tag, Thumbnail, Tracker, UserVideoHistory, Video,
    VideoAutomaticTag, VideoBlacklist, VideoFile, VideoInclude, VideoLive, VideoRedundancy,
    VideoSource, VideoStreamingPlaylist, video_privacy,
};
