//! Per-post interaction state: like/unlike, the options and comments panels,
//! and the comment draft.
//!
//! Nothing here changes the feed until the backend has confirmed the change.
//! Every remote-backed gesture is split in two: `begin_*` checks the
//! preconditions and hands back a [`Request`]; the caller sends it (inline, or
//! on a spawned task) and feeds the resulting [`Completion`] to
//! [`PostInteraction::resolve`], which reconciles the [`PostStore`]. The async
//! helpers (`toggle_like`, `delete_post`, ...) do both steps in one call.
//!
//! While one request for a post is in flight, further mutating gestures on that
//! post are dropped, so a rapid double toggle can never resolve out of order.

use thiserror::Error;

use crate::error::ApiError;
use crate::models::client::{ApiResponse, SocialApi};
use crate::models::post::{Comment, Post};
use crate::models::session::Session;
use crate::models::store::PostStore;
use crate::models::user::CurrentUser;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Panel {
    #[default]
    None,
    Options,
    Comments,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InteractionError {
    #[error("Not logged in")]
    Unauthenticated,

    #[error("Post no longer exists")]
    Missing,

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Transient, user-visible result of a gesture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Failure {
        message: String,
        error: InteractionError,
    },
}

impl Notice {
    fn failure(message: &str, error: impl Into<InteractionError>) -> Self {
        Notice::Failure {
            message: message.to_string(),
            error: error.into(),
        }
    }

    fn success_or(message: String, fallback: &str) -> Self {
        if message.is_empty() {
            Notice::Success(fallback.to_string())
        } else {
            Notice::Success(message)
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Notice::Success(message) | Notice::Failure { message, .. } => message,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Notice::Failure { .. })
    }

    pub fn error(&self) -> Option<&InteractionError> {
        match self {
            Notice::Failure { error, .. } => Some(error),
            Notice::Success(_) => None,
        }
    }
}

/// A remote call a post wants made.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    Like { post_id: String, user_id: String, desired: bool },
    Delete { post_id: String },
    Comment { post_id: String, text: String },
    Follow { post_id: String, author_id: String },
}

/// A [`Request`] together with what the backend answered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion {
    Like { post_id: String, user_id: String, desired: bool, result: Result<ApiResponse, ApiError> },
    Delete { post_id: String, result: Result<ApiResponse, ApiError> },
    Comment { post_id: String, text: String, result: Result<Comment, ApiError> },
    Follow { post_id: String, author_id: String, result: Result<ApiResponse, ApiError> },
}

impl Request {
    pub fn post_id(&self) -> &str {
        match self {
            Request::Like { post_id, .. }
            | Request::Delete { post_id }
            | Request::Comment { post_id, .. }
            | Request::Follow { post_id, .. } => post_id,
        }
    }

    pub async fn send<A: SocialApi + ?Sized>(self, api: &A) -> Completion {
        match self {
            Request::Like { post_id, user_id, desired } => {
                let result = api.set_like(&post_id, desired).await;
                Completion::Like { post_id, user_id, desired, result }
            }
            Request::Delete { post_id } => {
                let result = api.delete_post(&post_id).await;
                Completion::Delete { post_id, result }
            }
            Request::Comment { post_id, text } => {
                let result = api.add_comment(&post_id, &text).await;
                Completion::Comment { post_id, text, result }
            }
            Request::Follow { post_id, author_id } => {
                let result = api.follow_or_unfollow(&author_id).await;
                Completion::Follow { post_id, author_id, result }
            }
        }
    }
}

impl Completion {
    pub fn post_id(&self) -> &str {
        match self {
            Completion::Like { post_id, .. }
            | Completion::Delete { post_id, .. }
            | Completion::Comment { post_id, .. }
            | Completion::Follow { post_id, .. } => post_id,
        }
    }
}

/// What a renderer needs to draw one post.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostView {
    pub is_liked: bool,
    pub like_count: usize,
    pub open_panel: Panel,
    pub comment_draft: String,
    pub busy: bool,
}

/// Outcome of a `begin_*` call.
pub type Begin = Result<Option<Request>, Notice>;

#[derive(Clone, Debug)]
pub struct PostInteraction {
    post_id: String,
    open_panel: Panel,
    comment_draft: String,
    in_flight: bool,
}

pub fn is_liked(post: &Post, user: Option<&CurrentUser>) -> bool {
    user.is_some_and(|u| post.is_liked_by(&u.id))
}

/// Only the author is offered the delete action; the backend enforces it.
pub fn can_delete(post: &Post, user: Option<&CurrentUser>) -> bool {
    match (user, post.author_id()) {
        (Some(u), Some(author_id)) => u.id == author_id,
        _ => false,
    }
}

impl PostInteraction {
    pub fn new(post_id: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            open_panel: Panel::None,
            comment_draft: String::new(),
            in_flight: false,
        }
    }

    pub fn post_id(&self) -> &str {
        &self.post_id
    }

    pub fn open_panel(&self) -> Panel {
        self.open_panel
    }

    pub fn comment_draft(&self) -> &str {
        &self.comment_draft
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Liked state and count always come from `post`, never from a cached copy.
    pub fn view(&self, post: &Post, user: Option<&CurrentUser>) -> PostView {
        PostView {
            is_liked: is_liked(post, user),
            like_count: post.like_count(),
            open_panel: self.open_panel,
            comment_draft: self.comment_draft.clone(),
            busy: self.in_flight,
        }
    }

    /// Opens `target`, or closes it if it is already the open panel.
    pub fn toggle_panel(&mut self, target: Panel) {
        self.open_panel = if self.open_panel == target { Panel::None } else { target };
    }

    pub fn close_panel(&mut self) {
        self.open_panel = Panel::None;
    }

    pub fn compose_comment(&mut self, text: impl Into<String>) {
        self.comment_draft = text.into();
    }

    pub fn push_draft_char(&mut self, c: char) {
        self.comment_draft.push(c);
    }

    pub fn pop_draft_char(&mut self) {
        self.comment_draft.pop();
    }

    pub fn begin_toggle_like(&mut self, store: &PostStore, user: Option<&CurrentUser>) -> Begin {
        let Some(user) = user else {
            return Err(Notice::failure("Please log in to like posts", InteractionError::Unauthenticated));
        };
        if self.in_flight {
            log::debug!("Like on {} ignored, request in flight", self.post_id);
            return Ok(None);
        }
        let Some(post) = store.get(&self.post_id) else {
            return Err(Notice::failure("Failed to update like status", InteractionError::Missing));
        };

        self.in_flight = true;
        Ok(Some(Request::Like {
            post_id: self.post_id.clone(),
            user_id: user.id.clone(),
            desired: !post.is_liked_by(&user.id),
        }))
    }

    /// Like on double tap; never unlikes.
    pub fn begin_double_tap_like(&mut self, store: &PostStore, user: Option<&CurrentUser>) -> Begin {
        let already_liked = store
            .get(&self.post_id)
            .is_some_and(|post| is_liked(&post, user));
        if already_liked {
            return Ok(None);
        }
        self.begin_toggle_like(store, user)
    }

    pub fn begin_delete(&mut self) -> Begin {
        if self.in_flight {
            return Ok(None);
        }
        self.in_flight = true;
        Ok(Some(Request::Delete { post_id: self.post_id.clone() }))
    }

    /// Whitespace-only drafts are not sent and are left untouched.
    pub fn begin_submit_comment(&mut self, user: Option<&CurrentUser>) -> Begin {
        let text = self.comment_draft.trim();
        if text.is_empty() {
            return Ok(None);
        }
        if user.is_none() {
            return Err(Notice::failure("Please log in to comment", InteractionError::Unauthenticated));
        }
        if self.in_flight {
            return Ok(None);
        }

        self.in_flight = true;
        Ok(Some(Request::Comment {
            post_id: self.post_id.clone(),
            text: text.to_string(),
        }))
    }

    pub fn begin_toggle_follow(&mut self, store: &PostStore, user: Option<&CurrentUser>) -> Begin {
        let Some(user) = user else {
            return Err(Notice::failure("Please log in to follow users", InteractionError::Unauthenticated));
        };
        let Some(post) = store.get(&self.post_id) else {
            return Err(Notice::failure("Failed to update follow status", InteractionError::Missing));
        };
        let Some(author_id) = post.author_id().filter(|id| *id != user.id) else {
            return Ok(None);
        };
        if self.in_flight {
            return Ok(None);
        }

        self.in_flight = true;
        Ok(Some(Request::Follow {
            post_id: self.post_id.clone(),
            author_id: author_id.to_string(),
        }))
    }

    /// Applies a finished request. Only confirmed successes touch the store.
    pub fn resolve(&mut self, completion: Completion, store: &PostStore, session: &mut Session) -> Notice {
        self.in_flight = false;

        match completion {
            Completion::Like { post_id, user_id, desired, result } => match result {
                Ok(ApiResponse { success: true, message }) => {
                    store.set_liked(&post_id, &user_id, desired);
                    Notice::success_or(message, if desired { "Post liked" } else { "Post unliked" })
                }
                Ok(ApiResponse { message, .. }) => {
                    Notice::failure("Failed to update like status", InteractionError::Rejected(message))
                }
                Err(e) => {
                    log::warn!("Like request for {} failed: {}", post_id, e);
                    Notice::failure("Failed to update like status", e)
                }
            },
            Completion::Delete { post_id, result } => match result {
                Ok(ApiResponse { success: true, message }) => {
                    store.remove(&post_id);
                    self.open_panel = Panel::None;
                    Notice::success_or(message, "Post deleted successfully")
                }
                Ok(ApiResponse { message, .. }) => {
                    Notice::failure("Failed to delete post", InteractionError::Rejected(message))
                }
                Err(e) => {
                    log::warn!("Delete request for {} failed: {}", post_id, e);
                    Notice::failure("Failed to delete post", e)
                }
            },
            Completion::Comment { post_id, text, result } => match result {
                Ok(comment) => {
                    store.append_comment(&post_id, comment);
                    // Keep anything typed after the submit.
                    if self.comment_draft.trim() == text {
                        self.comment_draft.clear();
                    }
                    Notice::Success("Comment added".to_string())
                }
                Err(e) => {
                    log::warn!("Comment on {} failed: {}", post_id, e);
                    Notice::failure("Failed to post comment", e)
                }
            },
            Completion::Follow { author_id, result, .. } => match result {
                Ok(ApiResponse { success: true, message }) => {
                    let fallback = match session.update_follow_status(&author_id) {
                        Some(true) => "Followed",
                        _ => "Unfollowed",
                    };
                    Notice::success_or(message, fallback)
                }
                Ok(ApiResponse { message, .. }) => {
                    Notice::failure("Failed to update follow status", InteractionError::Rejected(message))
                }
                Err(e) => Notice::failure("Failed to update follow status", e),
            },
        }
    }

    async fn run<A: SocialApi + ?Sized>(
        &mut self,
        begin: Begin,
        api: &A,
        store: &PostStore,
        session: &mut Session,
    ) -> Option<Notice> {
        match begin {
            Ok(Some(request)) => {
                let completion = request.send(api).await;
                Some(self.resolve(completion, store, session))
            }
            Ok(None) => None,
            Err(notice) => Some(notice),
        }
    }

    pub async fn toggle_like<A: SocialApi + ?Sized>(
        &mut self,
        api: &A,
        store: &PostStore,
        session: &mut Session,
    ) -> Option<Notice> {
        let begin = self.begin_toggle_like(store, session.user());
        self.run(begin, api, store, session).await
    }

    pub async fn double_tap_like<A: SocialApi + ?Sized>(
        &mut self,
        api: &A,
        store: &PostStore,
        session: &mut Session,
    ) -> Option<Notice> {
        let begin = self.begin_double_tap_like(store, session.user());
        self.run(begin, api, store, session).await
    }

    pub async fn delete_post<A: SocialApi + ?Sized>(
        &mut self,
        api: &A,
        store: &PostStore,
        session: &mut Session,
    ) -> Option<Notice> {
        let begin = self.begin_delete();
        self.run(begin, api, store, session).await
    }

    pub async fn submit_comment<A: SocialApi + ?Sized>(
        &mut self,
        api: &A,
        store: &PostStore,
        session: &mut Session,
    ) -> Option<Notice> {
        let begin = self.begin_submit_comment(session.user());
        self.run(begin, api, store, session).await
    }

    pub async fn toggle_follow_author<A: SocialApi + ?Sized>(
        &mut self,
        api: &A,
        store: &PostStore,
        session: &mut Session,
    ) -> Option<Notice> {
        let begin = self.begin_toggle_follow(store, session.user());
        self.run(begin, api, store, session).await
    }
}
