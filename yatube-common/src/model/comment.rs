use crate::model::{
    Id,
    post::PostMarker,
    text::NonBlankText,
    user::{User, UserMarker},
};
use time::OffsetDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CommentMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Comment {
    pub id: Id<CommentMarker>,
    pub author: User,
    pub post: Id<PostMarker>,
    pub text: NonBlankText,
    pub created: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreateComment {
    pub author: Id<UserMarker>,
    pub post: Id<PostMarker>,
    pub text: NonBlankText,
}
