use crate::{
    Result,
    record::{
        AuthenticationRecord, FullCommentRecord, FullFollowRecord, FullPostRecord, GroupRecord,
        UserRecord,
    },
    store::{CommentStore, FollowStore, GroupStore, PostStore, UserStore},
};
use async_trait::async_trait;
use sqlx::{PgPool, postgres::PgPoolOptions, query, query_as, query_scalar};
use time::PrimitiveDateTime;
use tracing::info;
use yatube_common::model::{
    Id,
    auth::{AuthTokenHash, Authentication, TokenLifetime},
    comment::{Comment, CommentMarker, CreateComment},
    follow::{CreateFollow, Follow},
    group::{CreateGroup, Group, GroupMarker},
    post::{CreatePost, Post, PostContent, PostMarker},
    text::NonBlankText,
    user::{CreateUser, User, UserMarker, Username},
};

const SELECT_FULL_POST: &str = "
    SELECT
        posts.post_id,
        posts.text,
        posts.pub_date,
        posts.group_id,
        users.user_id,
        users.username
    FROM
        posts.posts NATURAL JOIN users.users
";

const SELECT_FULL_COMMENT: &str = "
    SELECT
        comments.comment_id,
        comments.text,
        comments.created,
        comments.post_id,
        users.user_id,
        users.username
    FROM
        posts.comments NATURAL JOIN users.users
";

const SELECT_FULL_FOLLOW: &str = "
    SELECT
        follows.follow_id,
        follower.user_id,
        follower.username AS user_username,
        followed.user_id AS following_id,
        followed.username AS following_username
    FROM
        users.follows
        JOIN users.users AS follower ON follower.user_id = follows.user_id
        JOIN users.users AS followed ON followed.user_id = follows.following_id
";

fn db_id<Marker>(id: Id<Marker>) -> i64 {
    id.get().cast_signed()
}

/// PostgreSQL-backed store.
pub struct DbClient {
    pool: PgPool,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!().run(&self.pool).await?;
        info!("Database migrations are up to date");
        Ok(())
    }

    async fn fetch_follow(&self, follow_id: i64) -> Result<Option<Follow>> {
        let record = query_as::<_, FullFollowRecord>(&format!(
            "{SELECT_FULL_FOLLOW} WHERE follows.follow_id = $1"
        ))
        .bind(follow_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Follow::try_from).transpose()?)
    }
}

#[async_trait]
impl UserStore for DbClient {
    async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT
                users.user_id,
                users.username
            FROM
                users.users
            WHERE
                users.user_id = $1
            ",
        )
        .bind(db_id(user_id))
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(User::try_from).transpose()?)
    }

    async fn fetch_user_by_username(&self, username: &Username) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT
                users.user_id,
                users.username
            FROM
                users.users
            WHERE
                users.username = $1
            ",
        )
        .bind(username.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(User::try_from).transpose()?)
    }

    async fn create_user(&self, user: &CreateUser) -> Result<User> {
        let record = query_as::<_, UserRecord>(
            "
            INSERT INTO users.users (username)
            VALUES ($1)
            RETURNING user_id, username
            ",
        )
        .bind(user.username.get())
        .fetch_one(&self.pool)
        .await?;

        Ok(User::try_from(record)?)
    }

    async fn fetch_auth(&self, token_hash: &AuthTokenHash) -> Result<Option<Authentication>> {
        let record = query_as::<_, AuthenticationRecord>(
            "
            SELECT
                authentications.user_id,
                authentications.token_hash,
                authentications.created_at,
                authentications.expires_after_seconds
            FROM
                users.authentications
            WHERE
                authentications.token_hash = $1
            ",
        )
        .bind(token_hash.as_bytes())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Authentication::try_from).transpose()?)
    }

    async fn create_auth(&self, authentication: &Authentication) -> Result<()> {
        let created_at = authentication.created_at;

        query(
            "
            INSERT INTO users.authentications
                (token_hash, user_id, created_at, expires_after_seconds)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(authentication.token_hash.as_bytes())
        .bind(db_id(authentication.user))
        .bind(PrimitiveDateTime::new(created_at.date(), created_at.time()))
        .bind(authentication.expires_after.map(TokenLifetime::whole_seconds))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl PostStore for DbClient {
    async fn list_posts(&self) -> Result<Vec<Post>> {
        let records = query_as::<_, FullPostRecord>(&format!(
            "{SELECT_FULL_POST} ORDER BY posts.post_id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<_, _>>()?)
    }

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let record = query_as::<_, FullPostRecord>(&format!(
            "{SELECT_FULL_POST} WHERE posts.post_id = $1"
        ))
        .bind(db_id(post_id))
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Post::try_from).transpose()?)
    }

    async fn create_post(&self, post: &CreatePost) -> Result<Post> {
        let record = query_as::<_, FullPostRecord>(
            "
            WITH posts AS (
                INSERT INTO posts.posts (text, user_id, group_id)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            SELECT
                posts.post_id,
                posts.text,
                posts.pub_date,
                posts.group_id,
                users.user_id,
                users.username
            FROM
                posts NATURAL JOIN users.users
            ",
        )
        .bind(post.content.text.get())
        .bind(db_id(post.author))
        .bind(post.content.group.map(db_id))
        .fetch_one(&self.pool)
        .await?;

        Ok(Post::try_from(record)?)
    }

    async fn update_post(
        &self,
        post_id: Id<PostMarker>,
        content: &PostContent,
    ) -> Result<Option<Post>> {
        let record = query_as::<_, FullPostRecord>(
            "
            WITH posts AS (
                UPDATE posts.posts
                SET text = $2, group_id = $3
                WHERE post_id = $1
                RETURNING *
            )
            SELECT
                posts.post_id,
                posts.text,
                posts.pub_date,
                posts.group_id,
                users.user_id,
                users.username
            FROM
                posts NATURAL JOIN users.users
            ",
        )
        .bind(db_id(post_id))
        .bind(content.text.get())
        .bind(content.group.map(db_id))
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Post::try_from).transpose()?)
    }

    async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let result = query("DELETE FROM posts.posts WHERE post_id = $1")
            .bind(db_id(post_id))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl GroupStore for DbClient {
    async fn list_groups(&self) -> Result<Vec<Group>> {
        let records = query_as::<_, GroupRecord>(
            "
            SELECT group_id, title, slug, description
            FROM posts.groups
            ORDER BY group_id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records
            .into_iter()
            .map(Group::try_from)
            .collect::<Result<_, _>>()?)
    }

    async fn fetch_group(&self, group_id: Id<GroupMarker>) -> Result<Option<Group>> {
        let record = query_as::<_, GroupRecord>(
            "
            SELECT group_id, title, slug, description
            FROM posts.groups
            WHERE group_id = $1
            ",
        )
        .bind(db_id(group_id))
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Group::try_from).transpose()?)
    }

    async fn create_group(&self, group: &CreateGroup) -> Result<Group> {
        let record = query_as::<_, GroupRecord>(
            "
            INSERT INTO posts.groups (title, slug, description)
            VALUES ($1, $2, $3)
            RETURNING group_id, title, slug, description
            ",
        )
        .bind(group.title.get())
        .bind(group.slug.get())
        .bind(&group.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(Group::try_from(record)?)
    }
}

#[async_trait]
impl CommentStore for DbClient {
    async fn list_comments(&self, post_id: Id<PostMarker>) -> Result<Vec<Comment>> {
        let records = query_as::<_, FullCommentRecord>(&format!(
            "{SELECT_FULL_COMMENT} WHERE comments.post_id = $1 ORDER BY comments.comment_id"
        ))
        .bind(db_id(post_id))
        .fetch_all(&self.pool)
        .await?;

        Ok(records
            .into_iter()
            .map(Comment::try_from)
            .collect::<Result<_, _>>()?)
    }

    async fn fetch_comment(&self, comment_id: Id<CommentMarker>) -> Result<Option<Comment>> {
        let record = query_as::<_, FullCommentRecord>(&format!(
            "{SELECT_FULL_COMMENT} WHERE comments.comment_id = $1"
        ))
        .bind(db_id(comment_id))
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Comment::try_from).transpose()?)
    }

    async fn create_comment(&self, comment: &CreateComment) -> Result<Comment> {
        let record = query_as::<_, FullCommentRecord>(
            "
            WITH comments AS (
                INSERT INTO posts.comments (text, user_id, post_id)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            SELECT
                comments.comment_id,
                comments.text,
                comments.created,
                comments.post_id,
                users.user_id,
                users.username
            FROM
                comments NATURAL JOIN users.users
            ",
        )
        .bind(comment.text.get())
        .bind(db_id(comment.author))
        .bind(db_id(comment.post))
        .fetch_one(&self.pool)
        .await?;

        Ok(Comment::try_from(record)?)
    }

    async fn update_comment(
        &self,
        comment_id: Id<CommentMarker>,
        text: &NonBlankText,
    ) -> Result<Option<Comment>> {
        let record = query_as::<_, FullCommentRecord>(
            "
            WITH comments AS (
                UPDATE posts.comments
                SET text = $2
                WHERE comment_id = $1
                RETURNING *
            )
            SELECT
                comments.comment_id,
                comments.text,
                comments.created,
                comments.post_id,
                users.user_id,
                users.username
            FROM
                comments NATURAL JOIN users.users
            ",
        )
        .bind(db_id(comment_id))
        .bind(text.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Comment::try_from).transpose()?)
    }

    async fn delete_comment(&self, comment_id: Id<CommentMarker>) -> Result<bool> {
        let result = query("DELETE FROM posts.comments WHERE comment_id = $1")
            .bind(db_id(comment_id))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl FollowStore for DbClient {
    async fn list_follows(
        &self,
        user: Id<UserMarker>,
        search: Option<&str>,
    ) -> Result<Vec<Follow>> {
        let records = query_as::<_, FullFollowRecord>(&format!(
            "
            {SELECT_FULL_FOLLOW}
            WHERE
                follows.user_id = $1
                AND ($2::TEXT IS NULL OR strpos(lower(followed.username), lower($2)) > 0)
            ORDER BY follows.follow_id
            "
        ))
        .bind(db_id(user))
        .bind(search)
        .fetch_all(&self.pool)
        .await?;

        Ok(records
            .into_iter()
            .map(Follow::try_from)
            .collect::<Result<_, _>>()?)
    }

    async fn follow_exists(&self, follow: CreateFollow) -> Result<bool> {
        let exists = query_scalar::<_, bool>(
            "
            SELECT EXISTS (
                SELECT 1 FROM users.follows
                WHERE user_id = $1 AND following_id = $2
            )
            ",
        )
        .bind(db_id(follow.user()))
        .bind(db_id(follow.following()))
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create_follow(&self, follow: CreateFollow) -> Result<Follow> {
        let follow_id = query_scalar::<_, i64>(
            "
            INSERT INTO users.follows (user_id, following_id)
            VALUES ($1, $2)
            RETURNING follow_id
            ",
        )
        .bind(db_id(follow.user()))
        .bind(db_id(follow.following()))
        .fetch_one(&self.pool)
        .await?;

        self.fetch_follow(follow_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound.into())
    }
}
