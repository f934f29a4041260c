//! Ownership rules for mutating authored content.

use crate::model::{Id, comment::Comment, post::Post, user::UserMarker};

/// Content that belongs to the user who wrote it.
pub trait Authored {
    fn author_id(&self) -> Id<UserMarker>;
}

impl Authored for Post {
    fn author_id(&self) -> Id<UserMarker> {
        self.author.id
    }
}

impl Authored for Comment {
    fn author_id(&self) -> Id<UserMarker> {
        self.author.id
    }
}

/// Whether `principal` may update or delete `entity`.
///
/// Only the author may. An anonymous principal (`None`) never may.
#[must_use]
pub fn can_modify(principal: Option<Id<UserMarker>>, entity: &impl Authored) -> bool {
    principal.is_some_and(|user| user == entity.author_id())
}

#[cfg(test)]
mod tests {
    use crate::{
        model::{
            Id,
            comment::Comment,
            post::{Post, PostContent},
            text::NonBlankText,
            user::{User, Username},
        },
        policy::can_modify,
    };
    use time::OffsetDateTime;

    fn user(id: u64, username: &str) -> User {
        User {
            id: Id::new(id),
            username: Username::new(username.to_owned()).unwrap(),
        }
    }

    fn comment_by(author: User) -> Comment {
        Comment {
            id: Id::new(7),
            author,
            post: Id::new(5),
            text: NonBlankText::new("hi").unwrap(),
            created: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn only_author_may_modify_comment() {
        let comment = comment_by(user(1, "alice"));

        assert!(can_modify(Some(Id::new(1)), &comment));
        assert!(!can_modify(Some(Id::new(2)), &comment));
        assert!(!can_modify(None, &comment));
    }

    #[test]
    fn only_author_may_modify_post() {
        let post = Post {
            id: Id::new(5),
            author: user(3, "bob"),
            content: PostContent {
                text: NonBlankText::new("post").unwrap(),
                group: None,
            },
            pub_date: OffsetDateTime::UNIX_EPOCH,
        };

        assert!(can_modify(Some(Id::new(3)), &post));
        assert!(!can_modify(Some(Id::new(1)), &post));
        assert!(!can_modify(None, &post));
    }
}
