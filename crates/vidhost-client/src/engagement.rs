//! Like, delete, comment and view actions for watched resources.
//!
//! Every action follows the same shape: claim the action's in-flight slot for
//! the resource, send the request, and touch local state only after a 2xx.
//! The slot is released (and the control re-enabled) when the guard drops,
//! whatever the outcome.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::watch::ViewRecorder;
use crate::ApiClient;
use vidhost_core::models::{CommentRequest, EngagementState};
use vidhost_core::{
    ClientError, ClientResult, ConfirmPrompt, EngagementAction, ErrorMetadata, UiSink,
};

pub const DELETE_CONFIRMATION: &str =
    "Are you sure you want to delete this video? This action cannot be undone.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The confirmation gate said no; nothing was sent.
    Declined,
    Deleted,
}

struct Tracked {
    state: EngagementState,
    in_flight: HashSet<EngagementAction>,
}

pub struct EngagementClient {
    api: ApiClient,
    sink: Arc<dyn UiSink>,
    resources: Mutex<HashMap<String, Tracked>>,
}

/// Holds one action's in-flight slot for one resource.
struct InFlightGuard<'a> {
    client: &'a EngagementClient,
    resource_id: String,
    action: EngagementAction,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Some(tracked) = self.client.table().get_mut(&self.resource_id) {
            tracked.in_flight.remove(&self.action);
        }
        self.client.sink.set_action_enabled(self.action, true);
    }
}

impl EngagementClient {
    pub fn new(api: ApiClient, sink: Arc<dyn UiSink>) -> Self {
        Self {
            api,
            sink,
            resources: Mutex::new(HashMap::new()),
        }
    }

    fn table(&self) -> MutexGuard<'_, HashMap<String, Tracked>> {
        self.resources.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start tracking a resource as rendered by the watch page. Replaces any
    /// previous state for the same id.
    pub fn track(&self, state: EngagementState) {
        self.table().insert(
            state.resource_id.clone(),
            Tracked {
                state: state.clone(),
                in_flight: HashSet::new(),
            },
        );
        self.sink.render_engagement(&state);
    }

    pub fn untrack(&self, resource_id: &str) -> Option<EngagementState> {
        self.table().remove(resource_id).map(|tracked| tracked.state)
    }

    pub fn state(&self, resource_id: &str) -> Option<EngagementState> {
        self.table().get(resource_id).map(|tracked| tracked.state.clone())
    }

    /// Claim `action` on `resource_id`. Fails if the resource is unknown or the
    /// same action is already pending on it.
    fn begin(
        &self,
        resource_id: &str,
        action: EngagementAction,
    ) -> ClientResult<(EngagementState, InFlightGuard<'_>)> {
        let state = {
            let mut table = self.table();
            let tracked = table.get_mut(resource_id).ok_or_else(|| {
                ClientError::Precondition(format!("Resource {} is not tracked", resource_id))
            })?;
            if !tracked.in_flight.insert(action) {
                return Err(ClientError::InFlight(action.as_str()));
            }
            tracked.state.clone()
        };

        self.sink.set_action_enabled(action, false);
        Ok((
            state,
            InFlightGuard {
                client: self,
                resource_id: resource_id.to_string(),
                action,
            },
        ))
    }

    /// Apply `f` to the stored state, if the resource is still tracked.
    fn update<F>(&self, resource_id: &str, f: F) -> Option<EngagementState>
    where
        F: FnOnce(&mut EngagementState),
    {
        let mut table = self.table();
        let tracked = table.get_mut(resource_id)?;
        f(&mut tracked.state);
        Some(tracked.state.clone())
    }

    fn report(&self, action: EngagementAction, error: &ClientError) {
        error.log(action.as_str());
        self.sink.render_status(&error.client_message());
    }

    /// Like the resource if it is not liked, unlike it otherwise.
    pub async fn toggle_like(&self, resource_id: &str) -> ClientResult<EngagementState> {
        let (state, _guard) = self.begin(resource_id, EngagementAction::Like)?;

        let result = if state.liked {
            self.api.unlike_video(&state.resource_id).await
        } else {
            self.api.like_video(&state.resource_id).await
        };

        if let Err(e) = result {
            self.report(EngagementAction::Like, &e);
            return Err(e);
        }

        let updated = self
            .update(resource_id, EngagementState::apply_like_toggle)
            .unwrap_or_else(|| {
                let mut state = state;
                state.apply_like_toggle();
                state
            });
        tracing::debug!(
            resource_id = %resource_id,
            liked = updated.liked,
            like_count = updated.like_count,
            "Like toggled"
        );
        self.sink.render_engagement(&updated);
        Ok(updated)
    }

    /// Delete the resource after confirmation, then leave for the home page.
    pub async fn delete_resource(
        &self,
        resource_id: &str,
        confirm: &dyn ConfirmPrompt,
    ) -> ClientResult<DeleteOutcome> {
        let (state, _guard) = self.begin(resource_id, EngagementAction::Delete)?;

        if !confirm.confirm(DELETE_CONFIRMATION).await {
            tracing::debug!(resource_id = %resource_id, "Delete declined");
            return Ok(DeleteOutcome::Declined);
        }

        if let Err(e) = self.api.delete_video(&state.resource_id).await {
            self.report(EngagementAction::Delete, &e);
            return Err(e);
        }

        self.untrack(resource_id);
        tracing::info!(resource_id = %resource_id, "Video deleted");
        self.sink.navigate(&self.api.config().home_path);
        Ok(DeleteOutcome::Deleted)
    }

    /// Post a comment. Blank drafts are rejected before any request.
    pub async fn post_comment(&self, resource_id: &str, draft: &str) -> ClientResult<()> {
        let comment = CommentRequest::new(draft)?;
        let (state, _guard) = self.begin(resource_id, EngagementAction::Comment)?;

        if let Err(e) = self.api.post_comment(&state.resource_id, &comment).await {
            self.report(EngagementAction::Comment, &e);
            return Err(e);
        }

        tracing::debug!(resource_id = %resource_id, "Comment posted");
        self.sink.clear_comment_input();
        self.sink.refresh();
        Ok(())
    }

    /// Count a view for this page view. Returns `Ok(false)` if it was already
    /// counted. Failures are logged but not shown.
    pub async fn record_view(&self, resource_id: &str) -> ClientResult<bool> {
        let (state, _guard) = self.begin(resource_id, EngagementAction::View)?;
        if state.view_recorded {
            return Ok(false);
        }

        if let Err(e) = self.api.record_view(&state.watch_id).await {
            e.log(EngagementAction::View.as_str());
            return Err(e);
        }

        self.update(resource_id, |state| state.view_recorded = true);
        tracing::debug!(resource_id = %resource_id, watch_id = %state.watch_id, "View recorded");
        Ok(true)
    }
}

#[async_trait]
impl ViewRecorder for EngagementClient {
    async fn record_view(&self, resource_id: &str) -> ClientResult<bool> {
        EngagementClient::record_view(self, resource_id).await
    }
}
