//! Video fetching: single videos, pages of videos, and their files.

pub mod file_query_builder;
pub mod get_query_builder;
pub mod list_query_builder;
pub mod model_builder;
pub mod query_parts;
pub mod table_attributes;

pub use file_query_builder::VideoFileQueryBuilder;
pub use get_query_builder::{GetVideoType, VideoGetQueryBuilder, VideoQueries};
pub use list_query_builder::{ListVideosOptions, VideoListQueryBuilder};
pub use model_builder::{VideoModelBuilder, VideoRows};
pub use query_parts::{VideoLookup, VideoQueryParts};
pub use table_attributes::{BuildMode, VideoTableAttributes};
