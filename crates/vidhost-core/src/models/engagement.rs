use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Client-side view of one watched resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementState {
    /// Video hash used by the like, delete and comment endpoints.
    pub resource_id: String,
    /// Per-page-view token used by the view endpoint.
    pub watch_id: String,
    pub liked: bool,
    pub like_count: u64,
    #[serde(default)]
    pub view_recorded: bool,
}

impl EngagementState {
    pub fn new(resource_id: impl Into<String>, watch_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            watch_id: watch_id.into(),
            liked: false,
            like_count: 0,
            view_recorded: false,
        }
    }

    pub fn with_likes(mut self, liked: bool, like_count: u64) -> Self {
        self.liked = liked;
        self.like_count = like_count;
        self
    }

    /// Apply an acknowledged like toggle. The count is adjusted locally rather
    /// than re-read from the server.
    pub fn apply_like_toggle(&mut self) {
        self.liked = !self.liked;
        self.like_count = if self.liked {
            self.like_count.saturating_add(1)
        } else {
            self.like_count.saturating_sub(1)
        };
    }
}

/// Body of `POST /api/video/comment/{hash}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentRequest {
    pub text: String,
}

impl CommentRequest {
    /// Trim the draft; blank drafts are rejected.
    pub fn new(draft: &str) -> ClientResult<Self> {
        let text = draft.trim();
        if text.is_empty() {
            return Err(ClientError::Validation(
                "Comment content cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            text: text.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_toggle_round_trips() {
        let mut state = EngagementState::new("abc", "w1").with_likes(false, 4);
        state.apply_like_toggle();
        assert!(state.liked);
        assert_eq!(state.like_count, 5);
        state.apply_like_toggle();
        assert!(!state.liked);
        assert_eq!(state.like_count, 4);
    }

    #[test]
    fn unlike_never_goes_negative() {
        let mut state = EngagementState::new("abc", "w1").with_likes(true, 0);
        state.apply_like_toggle();
        assert_eq!(state.like_count, 0);
    }

    #[test]
    fn comment_request_trims_and_rejects_blank() {
        assert_eq!(CommentRequest::new("  hi there \n").unwrap().text, "hi there");
        assert!(matches!(CommentRequest::new(""), Err(ClientError::Validation(_))));
        assert!(matches!(CommentRequest::new("   "), Err(ClientError::Validation(_))));
    }
}
