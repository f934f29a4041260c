use sqlx::FromRow;
use time::{OffsetDateTime, PrimitiveDateTime};
use yatube_common::model::{
    ModelValidationError,
    auth::{Authentication, TokenLifetime},
    comment::Comment,
    follow::Follow,
    group::{Group, GroupSlug, GroupTitle},
    post::{Post, PostContent},
    text::NonBlankText,
    user::{User, Username},
};

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct UserRecord {
    pub user_id: i64,
    pub username: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct FullPostRecord {
    pub post_id: i64,
    pub text: String,
    pub pub_date: OffsetDateTime,
    pub group_id: Option<i64>,
    pub user_id: i64,
    pub username: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct GroupRecord {
    pub group_id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct FullCommentRecord {
    pub comment_id: i64,
    pub text: String,
    pub created: OffsetDateTime,
    pub post_id: i64,
    pub user_id: i64,
    pub username: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct FullFollowRecord {
    pub follow_id: i64,
    pub user_id: i64,
    pub user_username: String,
    pub following_id: i64,
    pub following_username: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct AuthenticationRecord {
    pub user_id: i64,
    pub token_hash: Vec<u8>,
    pub created_at: PrimitiveDateTime,
    pub expires_after_seconds: Option<i64>,
}

fn user(user_id: i64, username: String) -> Result<User, ModelValidationError> {
    Ok(User {
        id: user_id.cast_unsigned().into(),
        username: Username::new(username)?,
    })
}

impl TryFrom<UserRecord> for User {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        user(value.user_id, value.username)
    }
}

impl TryFrom<FullPostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: FullPostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.post_id.cast_unsigned().into(),
            author: user(value.user_id, value.username)?,
            content: PostContent {
                text: NonBlankText::try_from(value.text)?,
                group: value.group_id.map(|id| id.cast_unsigned().into()),
            },
            pub_date: value.pub_date,
        })
    }
}

impl TryFrom<GroupRecord> for Group {
    type Error = ModelValidationError;

    fn try_from(value: GroupRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.group_id.cast_unsigned().into(),
            title: GroupTitle::new(value.title)?,
            slug: GroupSlug::new(value.slug)?,
            description: value.description,
        })
    }
}

impl TryFrom<FullCommentRecord> for Comment {
    type Error = ModelValidationError;

    fn try_from(value: FullCommentRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.comment_id.cast_unsigned().into(),
            author: user(value.user_id, value.username)?,
            post: value.post_id.cast_unsigned().into(),
            text: NonBlankText::try_from(value.text)?,
            created: value.created,
        })
    }
}

impl TryFrom<FullFollowRecord> for Follow {
    type Error = ModelValidationError;

    fn try_from(value: FullFollowRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.follow_id.cast_unsigned().into(),
            user: user(value.user_id, value.user_username)?,
            following: user(value.following_id, value.following_username)?,
        })
    }
}

impl TryFrom<AuthenticationRecord> for Authentication {
    type Error = ModelValidationError;

    fn try_from(value: AuthenticationRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            user: value.user_id.cast_unsigned().into(),
            token_hash: value.token_hash.into_boxed_slice().try_into()?,
            created_at: value.created_at.as_utc(),
            expires_after: value
                .expires_after_seconds
                .map(TokenLifetime::from_seconds)
                .transpose()?,
        })
    }
}
