//! In-process store for tests and database-less runs.
//!
//! Enforces the same constraints as the SQL schema: unique usernames, slugs
//! and follow pairs, existing foreign keys, and cascading deletes from posts
//! to comments.

use crate::{
    DbError, Result,
    store::{CommentStore, FollowStore, GroupStore, PostStore, UserStore},
};
use async_trait::async_trait;
use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard, PoisonError},
};
use time::OffsetDateTime;
use yatube_common::model::{
    Id,
    auth::{AuthTokenHash, Authentication},
    comment::{Comment, CommentMarker, CreateComment},
    follow::{CreateFollow, Follow, FollowMarker},
    group::{CreateGroup, Group, GroupMarker},
    post::{CreatePost, Post, PostContent, PostMarker},
    text::NonBlankText,
    user::{CreateUser, User, UserMarker, Username},
};

#[derive(Clone, Debug)]
struct PostRow {
    author: Id<UserMarker>,
    content: PostContent,
    pub_date: OffsetDateTime,
}

#[derive(Clone, Debug)]
struct CommentRow {
    author: Id<UserMarker>,
    post: Id<PostMarker>,
    text: NonBlankText,
    created: OffsetDateTime,
}

/// One table keyed by id, with its own id sequence starting at 1.
#[derive(Debug)]
struct Table<Marker, Row> {
    rows: BTreeMap<Id<Marker>, Row>,
    last_id: u64,
}

impl<Marker, Row> Default for Table<Marker, Row> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<Marker: Copy + Ord, Row> Table<Marker, Row> {
    fn insert(&mut self, row: Row) -> Id<Marker> {
        self.last_id += 1;
        let id = Id::new(self.last_id);
        self.rows.insert(id, row);
        id
    }
}

#[derive(Debug, Default)]
struct Tables {
    users: Table<UserMarker, Username>,
    authentications: Vec<Authentication>,
    groups: Table<GroupMarker, CreateGroup>,
    posts: Table<PostMarker, PostRow>,
    comments: Table<CommentMarker, CommentRow>,
    follows: Table<FollowMarker, CreateFollow>,
}

impl Tables {
    fn user(&self, id: Id<UserMarker>) -> Result<User> {
        let username = self.users.rows.get(&id).ok_or(DbError::ForeignKeyViolation)?;
        Ok(User {
            id,
            username: username.clone(),
        })
    }

    fn post(&self, id: Id<PostMarker>, row: &PostRow) -> Result<Post> {
        Ok(Post {
            id,
            author: self.user(row.author)?,
            content: row.content.clone(),
            pub_date: row.pub_date,
        })
    }

    fn comment(&self, id: Id<CommentMarker>, row: &CommentRow) -> Result<Comment> {
        Ok(Comment {
            id,
            author: self.user(row.author)?,
            post: row.post,
            text: row.text.clone(),
            created: row.created,
        })
    }

    fn follow(&self, id: Id<FollowMarker>, row: CreateFollow) -> Result<Follow> {
        Ok(Follow {
            id,
            user: self.user(row.user())?,
            following: self.user(row.following())?,
        })
    }

    fn check_group(&self, group: Option<Id<GroupMarker>>) -> Result<()> {
        match group {
            Some(group) if !self.groups.rows.contains_key(&group) => {
                Err(DbError::ForeignKeyViolation)
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // No operation leaves the tables half-written, so a poisoned lock is still usable.
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        let tables = self.tables();
        if tables.users.rows.contains_key(&user_id) {
            tables.user(user_id).map(Some)
        } else {
            Ok(None)
        }
    }

    async fn fetch_user_by_username(&self, username: &Username) -> Result<Option<User>> {
        let tables = self.tables();
        let user = tables
            .users
            .rows
            .iter()
            .find(|(_, existing)| *existing == username)
            .map(|(&id, username)| User {
                id,
                username: username.clone(),
            });

        Ok(user)
    }

    async fn create_user(&self, user: &CreateUser) -> Result<User> {
        let mut tables = self.tables();
        if tables.users.rows.values().any(|existing| *existing == user.username) {
            return Err(DbError::UniqueViolation);
        }

        let id = tables.users.insert(user.username.clone());
        tables.user(id)
    }

    async fn fetch_auth(&self, token_hash: &AuthTokenHash) -> Result<Option<Authentication>> {
        let tables = self.tables();
        let authentication = tables
            .authentications
            .iter()
            .find(|authentication| authentication.token_hash == *token_hash)
            .cloned();

        Ok(authentication)
    }

    async fn create_auth(&self, authentication: &Authentication) -> Result<()> {
        let mut tables = self.tables();
        tables.user(authentication.user)?;
        if tables
            .authentications
            .iter()
            .any(|existing| existing.token_hash == authentication.token_hash)
        {
            return Err(DbError::UniqueViolation);
        }

        tables.authentications.push(authentication.clone());
        Ok(())
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn list_posts(&self) -> Result<Vec<Post>> {
        let tables = self.tables();
        tables
            .posts
            .rows
            .iter()
            .map(|(&id, row)| tables.post(id, row))
            .collect()
    }

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let tables = self.tables();
        tables
            .posts
            .rows
            .get(&post_id)
            .map(|row| tables.post(post_id, row))
            .transpose()
    }

    async fn create_post(&self, post: &CreatePost) -> Result<Post> {
        let mut tables = self.tables();
        tables.user(post.author)?;
        tables.check_group(post.content.group)?;

        let row = PostRow {
            author: post.author,
            content: post.content.clone(),
            pub_date: OffsetDateTime::now_utc(),
        };
        let id = tables.posts.insert(row.clone());
        tables.post(id, &row)
    }

    async fn update_post(
        &self,
        post_id: Id<PostMarker>,
        content: &PostContent,
    ) -> Result<Option<Post>> {
        let mut tables = self.tables();
        tables.check_group(content.group)?;

        let Some(row) = tables.posts.rows.get_mut(&post_id) else {
            return Ok(None);
        };
        row.content = content.clone();
        let row = row.clone();

        tables.post(post_id, &row).map(Some)
    }

    async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let mut tables = self.tables();
        if tables.posts.rows.remove(&post_id).is_none() {
            return Ok(false);
        }

        tables.comments.rows.retain(|_, comment| comment.post != post_id);
        Ok(true)
    }
}

#[async_trait]
impl GroupStore for MemoryStore {
    async fn list_groups(&self) -> Result<Vec<Group>> {
        let tables = self.tables();
        let groups = tables
            .groups
            .rows
            .iter()
            .map(|(&id, group)| group_from_row(id, group))
            .collect();

        Ok(groups)
    }

    async fn fetch_group(&self, group_id: Id<GroupMarker>) -> Result<Option<Group>> {
        let tables = self.tables();
        let group = tables
            .groups
            .rows
            .get(&group_id)
            .map(|group| group_from_row(group_id, group));

        Ok(group)
    }

    async fn create_group(&self, group: &CreateGroup) -> Result<Group> {
        let mut tables = self.tables();
        if tables.groups.rows.values().any(|existing| existing.slug == group.slug) {
            return Err(DbError::UniqueViolation);
        }

        let id = tables.groups.insert(group.clone());
        Ok(group_from_row(id, group))
    }
}

fn group_from_row(id: Id<GroupMarker>, group: &CreateGroup) -> Group {
    Group {
        id,
        title: group.title.clone(),
        slug: group.slug.clone(),
        description: group.description.clone(),
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn list_comments(&self, post_id: Id<PostMarker>) -> Result<Vec<Comment>> {
        let tables = self.tables();
        tables
            .comments
            .rows
            .iter()
            .filter(|(_, row)| row.post == post_id)
            .map(|(&id, row)| tables.comment(id, row))
            .collect()
    }

    async fn fetch_comment(&self, comment_id: Id<CommentMarker>) -> Result<Option<Comment>> {
        let tables = self.tables();
        tables
            .comments
            .rows
            .get(&comment_id)
            .map(|row| tables.comment(comment_id, row))
            .transpose()
    }

    async fn create_comment(&self, comment: &CreateComment) -> Result<Comment> {
        let mut tables = self.tables();
        tables.user(comment.author)?;
        if !tables.posts.rows.contains_key(&comment.post) {
            return Err(DbError::ForeignKeyViolation);
        }

        let row = CommentRow {
            author: comment.author,
            post: comment.post,
            text: comment.text.clone(),
            created: OffsetDateTime::now_utc(),
        };
        let id = tables.comments.insert(row.clone());
        tables.comment(id, &row)
    }

    async fn update_comment(
        &self,
        comment_id: Id<CommentMarker>,
        text: &NonBlankText,
    ) -> Result<Option<Comment>> {
        let mut tables = self.tables();
        let Some(row) = tables.comments.rows.get_mut(&comment_id) else {
            return Ok(None);
        };
        row.text = text.clone();
        let row = row.clone();

        tables.comment(comment_id, &row).map(Some)
    }

    async fn delete_comment(&self, comment_id: Id<CommentMarker>) -> Result<bool> {
        Ok(self.tables().comments.rows.remove(&comment_id).is_some())
    }
}

#[async_trait]
impl FollowStore for MemoryStore {
    async fn list_follows(
        &self,
        user: Id<UserMarker>,
        search: Option<&str>,
    ) -> Result<Vec<Follow>> {
        let tables = self.tables();
        let mut follows = Vec::new();
        for (&id, &row) in tables.follows.rows.iter().filter(|(_, row)| row.user() == user) {
            let follow = tables.follow(id, row)?;
            if search.is_none_or(|term| follow.following.username.contains_ignore_case(term)) {
                follows.push(follow);
            }
        }

        Ok(follows)
    }

    async fn follow_exists(&self, follow: CreateFollow) -> Result<bool> {
        Ok(self.tables().follows.rows.values().any(|&row| row == follow))
    }

    async fn create_follow(&self, follow: CreateFollow) -> Result<Follow> {
        let mut tables = self.tables();
        tables.user(follow.user())?;
        tables.user(follow.following())?;
        if tables.follows.rows.values().any(|&row| row == follow) {
            return Err(DbError::UniqueViolation);
        }

        let id = tables.follows.insert(follow);
        tables.follow(id, follow)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        DbError,
        memory::MemoryStore,
        store::{CommentStore, FollowStore, GroupStore, PostStore, UserStore},
    };
    use yatube_common::model::{
        Id,
        comment::CreateComment,
        follow::CreateFollow,
        group::{CreateGroup, GroupSlug, GroupTitle},
        post::{CreatePost, PostContent},
        text::NonBlankText,
        user::{CreateUser, User, Username},
    };

    async fn user(store: &MemoryStore, username: &str) -> User {
        store
            .create_user(&CreateUser {
                username: Username::new(username.to_owned()).unwrap(),
            })
            .await
            .unwrap()
    }

    fn text(text: &str) -> NonBlankText {
        NonBlankText::new(text).unwrap()
    }

    #[tokio::test]
    async fn usernames_are_unique() {
        let store = MemoryStore::new();
        user(&store, "leo").await;

        let duplicate = store
            .create_user(&CreateUser {
                username: Username::new("leo".to_owned()).unwrap(),
            })
            .await;
        assert!(matches!(duplicate, Err(DbError::UniqueViolation)));
    }

    #[tokio::test]
    async fn deleting_post_cascades_to_comments() {
        let store = MemoryStore::new();
        let author = user(&store, "leo").await;
        let post = store
            .create_post(&CreatePost {
                author: author.id,
                content: PostContent {
                    text: text("War and Peace"),
                    group: None,
                },
            })
            .await
            .unwrap();
        let comment = store
            .create_comment(&CreateComment {
                author: author.id,
                post: post.id,
                text: text("long"),
            })
            .await
            .unwrap();

        assert!(store.delete_post(post.id).await.unwrap());
        assert!(store.fetch_comment(comment.id).await.unwrap().is_none());
        assert!(!store.delete_post(post.id).await.unwrap());
    }

    #[tokio::test]
    async fn comments_need_existing_post() {
        let store = MemoryStore::new();
        let author = user(&store, "leo").await;

        let result = store
            .create_comment(&CreateComment {
                author: author.id,
                post: Id::new(99),
                text: text("orphan"),
            })
            .await;
        assert!(matches!(result, Err(DbError::ForeignKeyViolation)));
    }

    #[tokio::test]
    async fn posts_need_existing_group() {
        let store = MemoryStore::new();
        let author = user(&store, "leo").await;
        let group = store
            .create_group(&CreateGroup {
                title: GroupTitle::new("Novels".to_owned()).unwrap(),
                slug: GroupSlug::new("novels".to_owned()).unwrap(),
                description: String::new(),
            })
            .await
            .unwrap();

        let mut content = PostContent {
            text: text("Anna Karenina"),
            group: Some(group.id),
        };
        let post = store
            .create_post(&CreatePost {
                author: author.id,
                content: content.clone(),
            })
            .await
            .unwrap();
        assert_eq!(post.content.group, Some(group.id));

        content.group = Some(Id::new(42));
        let result = store.update_post(post.id, &content).await;
        assert!(matches!(result, Err(DbError::ForeignKeyViolation)));
    }

    #[tokio::test]
    async fn follow_pairs_are_unique_and_searchable() {
        let store = MemoryStore::new();
        let leo = user(&store, "leo").await;
        let fyodor = user(&store, "Fyodor").await;
        let anton = user(&store, "anton").await;

        let follow = CreateFollow::new(leo.id, fyodor.id).unwrap();
        store.create_follow(follow).await.unwrap();
        store
            .create_follow(CreateFollow::new(leo.id, anton.id).unwrap())
            .await
            .unwrap();
        store
            .create_follow(CreateFollow::new(anton.id, leo.id).unwrap())
            .await
            .unwrap();

        assert!(store.follow_exists(follow).await.unwrap());
        assert!(matches!(
            store.create_follow(follow).await,
            Err(DbError::UniqueViolation)
        ));

        let all = store.list_follows(leo.id, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|follow| follow.user == leo));

        let searched = store.list_follows(leo.id, Some("FYO")).await.unwrap();
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].following, fyodor);
    }
}
