use std::cmp::Reverse;
use std::path::Path;

use crate::error::{ApiError, GramtuiError};
use crate::models::{cache, Post, PostStore, SocialApi};

/// Newest first; posts without a timestamp sink to the bottom in fetch order.
pub fn sort_feed(posts: &mut [Post]) {
    posts.sort_by_key(|post| Reverse(post.created_at));
}

pub async fn fetch_posts<A: SocialApi + ?Sized>(api: &A) -> Result<Vec<Post>, ApiError> {
    let mut posts = api.get_posts().await?;
    sort_feed(&mut posts);
    Ok(posts)
}

/// Fetches the feed and swaps it into the store in one step.
pub async fn refresh_feed<A: SocialApi + ?Sized>(api: &A, store: &PostStore) -> Result<usize, ApiError> {
    let posts = fetch_posts(api).await?;
    let count = posts.len();
    store.replace_all(posts);
    Ok(count)
}

/// Seeds a store from the on-disk cache. A missing or broken cache is not fatal.
pub fn load_cached_feed(cache_path: Option<&Path>) -> PostStore {
    let Some(path) = cache_path else {
        return PostStore::default();
    };

    match cache::load_posts_from(path) {
        Ok(mut posts) => {
            sort_feed(&mut posts);
            PostStore::new(posts)
        }
        Err(e) => {
            log::warn!("Ignoring feed cache: {}", e);
            PostStore::default()
        }
    }
}

pub fn persist_feed(store: &PostStore, cache_path: &Path) -> Result<(), GramtuiError> {
    cache::save_posts_to(cache_path, &store.snapshot())
}
