use std::sync::Arc;

use tokio::sync::watch;

use crate::models::post::{Comment, Post};

/// Shared collection of the posts known to this session.
///
/// Cloning the store clones the handle, not the posts. Readers get an
/// immutable `Arc<Vec<Post>>` snapshot; every write goes through the single
/// watch sender, so writers are serialised and subscribers are woken after
/// each change.
#[derive(Clone, Debug)]
pub struct PostStore {
    tx: Arc<watch::Sender<Arc<Vec<Post>>>>,
}

impl Default for PostStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl PostStore {
    pub fn new(posts: Vec<Post>) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(posts));
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> Arc<Vec<Post>> {
        Arc::clone(&*self.tx.borrow())
    }

    pub fn get(&self, post_id: &str) -> Option<Post> {
        self.tx.borrow().iter().find(|p| p.id == post_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Post>>> {
        self.tx.subscribe()
    }

    pub fn replace_all(&self, posts: Vec<Post>) {
        self.tx.send_replace(Arc::new(posts));
    }

    /// Removes the post with `post_id`. Returns whether anything was removed.
    pub fn remove(&self, post_id: &str) -> bool {
        self.tx.send_if_modified(|posts| {
            if !posts.iter().any(|p| p.id == post_id) {
                return false;
            }
            Arc::make_mut(posts).retain(|p| p.id != post_id);
            true
        })
    }

    /// Adds or removes `user_id` from the liker set of one post.
    pub fn set_liked(&self, post_id: &str, user_id: &str, liked: bool) -> bool {
        self.patch(post_id, |post| {
            if liked {
                post.likes.insert(user_id.to_string())
            } else {
                post.likes.remove(user_id)
            }
        })
    }

    pub fn append_comment(&self, post_id: &str, comment: Comment) -> bool {
        self.patch(post_id, |post| {
            if post.comments.iter().any(|c| c.id == comment.id) {
                return false;
            }
            post.comments.push(comment);
            true
        })
    }

    fn patch<F>(&self, post_id: &str, f: F) -> bool
    where
        F: FnOnce(&mut Post) -> bool,
    {
        self.tx.send_if_modified(|posts| {
            let Some(idx) = posts.iter().position(|p| p.id == post_id) else {
                return false;
            };
            // Check on the shared copy first so a no-op never clones the collection.
            let mut post = posts[idx].clone();
            if !f(&mut post) {
                return false;
            }
            Arc::make_mut(posts)[idx] = post;
            true
        })
    }
}
