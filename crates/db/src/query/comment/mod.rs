//! Video comment listing.

pub mod list_query_builder;
pub mod model_builder;
pub mod table_attributes;

pub use list_query_builder::{
    CommentSelectType, ListVideoCommentsOptions, SORTABLE_COLUMNS, VideoCommentListQueryBuilder,
};
pub use model_builder::VideoCommentModelBuilder;
pub use table_attributes::VideoCommentTableAttributes;
