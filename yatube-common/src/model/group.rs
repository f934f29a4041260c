use crate::model::Id;
use serde::Serialize;
use thiserror::Error;

pub const GROUP_TITLE_MAX_LEN: usize = 200;
pub const GROUP_SLUG_MAX_LEN: usize = 50;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct GroupMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Group {
    pub id: Id<GroupMarker>,
    pub title: GroupTitle,
    pub slug: GroupSlug,
    pub description: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreateGroup {
    pub title: GroupTitle,
    pub slug: GroupSlug,
    pub description: String,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct GroupTitle(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The group title is invalid: {0:?}")]
pub struct InvalidGroupTitleError(String);

impl GroupTitle {
    pub fn new(title: String) -> Result<Self, InvalidGroupTitleError> {
        let len = title.chars().count();
        if len > 0 && len <= GROUP_TITLE_MAX_LEN {
            Ok(Self(title))
        } else {
            Err(InvalidGroupTitleError(title))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

/// URL-safe unique group key: ASCII letters, digits, `-` and `_`.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct GroupSlug(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The group slug is invalid: {0:?}")]
pub struct InvalidGroupSlugError(String);

impl GroupSlug {
    pub fn new(slug: String) -> Result<Self, InvalidGroupSlugError> {
        let valid = !slug.is_empty()
            && slug.len() <= GROUP_SLUG_MAX_LEN
            && slug
                .bytes()
                .all(|byte| byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_');

        if valid {
            Ok(Self(slug))
        } else {
            Err(InvalidGroupSlugError(slug))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use crate::model::group::{GROUP_SLUG_MAX_LEN, GROUP_TITLE_MAX_LEN, GroupSlug, GroupTitle};

    #[test]
    fn slug_characters() {
        for legal in ["cats", "cats-and_dogs", "Group42"] {
            assert!(GroupSlug::new(legal.to_owned()).is_ok(), "{legal}");
        }
        for illegal in ["", "with space", "кошки", "a/b", "dot.ted"] {
            assert!(GroupSlug::new(illegal.to_owned()).is_err(), "{illegal}");
        }
        assert!(GroupSlug::new("s".repeat(GROUP_SLUG_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn title_length() {
        assert!(GroupTitle::new("Cats".to_owned()).is_ok());
        assert!(GroupTitle::new(String::new()).is_err());
        assert!(GroupTitle::new("t".repeat(GROUP_TITLE_MAX_LEN + 1)).is_err());
    }
}
