use serde::Serialize;
use thiserror::Error;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("This field may not be blank.")]
pub struct BlankTextError;

/// Free text of a post or comment. Surrounding whitespace is trimmed and
/// the remainder must not be empty.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct NonBlankText(String);

impl NonBlankText {
    pub fn new(text: &str) -> Result<Self, BlankTextError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Err(BlankTextError)
        } else {
            Ok(Self(trimmed.to_owned()))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for NonBlankText {
    type Error = BlankTextError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}
