use thiserror::Error;

/// Longest preview of a rejected collection kept in [`Error::InvalidCollection`].
pub const PREVIEW_LEN: usize = 20;

/// Errors raised by the helpers themselves.
///
/// Failures produced by caller-supplied conditions, actions or elements are
/// never wrapped in this type. Helpers that can fail on their own require the
/// caller's error type to implement `From<Error>` and hand everything else
/// through untouched.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The walker was given something that is neither a sequence nor a mapping.
    #[error("Can not iterate over \"{preview}\" ({kind})")]
    InvalidCollection {
        /// String form of the rejected value, cut to [`PREVIEW_LEN`] characters.
        preview: String,
        /// Runtime type tag of the rejected value.
        kind: &'static str,
    },

    /// An argument that must be a mapping was something else.
    #[error("\"{name}\" must be an object")]
    InvalidArgument { name: &'static str },
}

impl Error {
    /// Builds an [`Error::InvalidCollection`], truncating `value` on a character boundary.
    pub fn invalid_collection(value: impl AsRef<str>, kind: &'static str) -> Self {
        Error::InvalidCollection {
            preview: value.as_ref().chars().take(PREVIEW_LEN).collect(),
            kind,
        }
    }
}
