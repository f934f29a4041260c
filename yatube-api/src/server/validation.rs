//! Field-level validation of request bodies.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use yatube_common::model::text::NonBlankText;

/// Key for errors that do not belong to a single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

pub const REQUIRED: &str = "This field is required.";

pub const NOT_NULL: &str = "This field may not be null.";

/// A body field that can be left out (`None`), sent as `null` (`Some(None)`)
/// or sent with a value.
#[allow(clippy::option_option)]
pub type Nullable<T> = Option<Option<T>>;

/// Messages per offending field, serialized as `{"field": ["message", ...]}`.
#[derive(Clone, Eq, PartialEq, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    #[must_use]
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Validates a text field that has to be present.
    pub fn required_text(
        &mut self,
        field: &'static str,
        value: Nullable<String>,
    ) -> Option<NonBlankText> {
        if value.is_none() {
            self.add(field, REQUIRED);
        }
        self.optional_text(field, value)
    }

    /// Validates a text field that may be left out but not nulled.
    pub fn optional_text(
        &mut self,
        field: &'static str,
        value: Nullable<String>,
    ) -> Option<NonBlankText> {
        let Some(value) = value? else {
            self.add(field, NOT_NULL);
            return None;
        };

        match NonBlankText::new(&value) {
            Ok(text) => Some(text),
            Err(err) => {
                self.add(field, err.to_string());
                None
            }
        }
    }
}

/// Tells an absent field (`None`) apart from an explicit `null` (`Some(None)`).
///
/// Use together with `#[serde(default)]`.
pub fn explicit_null<'de, D, T>(deserializer: D) -> Result<Nullable<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
