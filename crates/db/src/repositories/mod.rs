//! Repositories for database operations.

pub mod video;
pub mod video_comment;
pub mod video_redundancy;

pub use video::VideoRepository;
pub use video_comment::{CommentPage, VideoCommentRepository};
pub use video_redundancy::{
    CandidateStrategy, NewVideoRedundancy, RedundancyFileRemover, RedundancyStats,
    RedundancyWithVideo, VideoRedundancyRepository, build_candidate_query, expiration_from_now,
    pick_candidate,
};
