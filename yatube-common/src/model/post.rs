use crate::model::{
    Id,
    group::GroupMarker,
    text::NonBlankText,
    user::{User, UserMarker},
};
use time::OffsetDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub author: User,
    pub content: PostContent,
    pub pub_date: OffsetDateTime,
}

/// The author-editable part of a post.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct PostContent {
    pub text: NonBlankText,
    pub group: Option<Id<GroupMarker>>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreatePost {
    pub author: Id<UserMarker>,
    pub content: PostContent,
}
