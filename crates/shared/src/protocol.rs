use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{MovieDraft, MovieId};

/// Raw body of a create or update request.
///
/// Fields stay as untyped JSON so that validation can report every problem
/// at once instead of failing on the first field that does not deserialize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieInput {
    #[serde(default)]
    pub title: Value,
    #[serde(default)]
    pub genre: Value,
    #[serde(default)]
    pub year: Value,
    #[serde(default)]
    pub rating: Value,
}

impl From<&MovieDraft> for MovieInput {
    fn from(draft: &MovieDraft) -> Self {
        Self {
            title: Value::from(draft.title.as_str()),
            genre: Value::from(draft.genre.as_str()),
            year: Value::from(draft.year),
            rating: Value::from(draft.rating),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMovieResponse {
    pub id: MovieId,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
