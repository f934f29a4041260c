use crate::model::{
    Id,
    user::{User, UserMarker},
};
use thiserror::Error;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct FollowMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Follow {
    pub id: Id<FollowMarker>,
    pub user: User,
    pub following: User,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("User {0} cannot follow themselves")]
pub struct SelfFollowError(pub Id<UserMarker>);

/// A follower/followed pair. Never the same user twice.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct CreateFollow {
    user: Id<UserMarker>,
    following: Id<UserMarker>,
}

impl CreateFollow {
    pub fn new(user: Id<UserMarker>, following: Id<UserMarker>) -> Result<Self, SelfFollowError> {
        if user == following {
            Err(SelfFollowError(user))
        } else {
            Ok(Self { user, following })
        }
    }

    #[must_use]
    pub fn user(self) -> Id<UserMarker> {
        self.user
    }

    #[must_use]
    pub fn following(self) -> Id<UserMarker> {
        self.following
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{
        Id,
        follow::{CreateFollow, SelfFollowError},
    };

    #[test]
    fn self_follow_is_unrepresentable() {
        let follow = CreateFollow::new(Id::new(1), Id::new(2)).unwrap();
        assert_eq!(follow.user(), Id::new(1));
        assert_eq!(follow.following(), Id::new(2));

        assert_eq!(
            CreateFollow::new(Id::new(3), Id::new(3)),
            Err(SelfFollowError(Id::new(3)))
        );
    }
}
