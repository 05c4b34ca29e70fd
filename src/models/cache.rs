use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::GramtuiError;
use crate::models::post::Post;

pub fn get_cache_file() -> Result<PathBuf, GramtuiError> {
    // Check the XDG_CACHE_HOME environment variable first
    let base_cache_dir = match env::var_os("XDG_CACHE_HOME") {
        Some(dir) => PathBuf::from(dir),
        None => dirs::home_dir()
            .ok_or_else(|| GramtuiError::Config("Home environment variable not set".to_string()))?
            .join(".cache"),
    };

    let app_cache_dir = base_cache_dir.join("gramtui");

    fs::create_dir_all(&app_cache_dir)
        .map_err(|e| GramtuiError::Cache(format!("Failed to create cache directory: {}", e)))?;

    Ok(app_cache_dir.join("posts.json"))
}

pub fn load_posts_from(cache_path: &Path) -> Result<Vec<Post>, GramtuiError> {
    match fs::read_to_string(cache_path) {
        Ok(data) => {
            serde_json::from_str(&data)
                .map_err(|e| GramtuiError::Cache(format!("Failed to parse cache data: {}", e)))
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(GramtuiError::Cache(format!("Failed to read cache file: {}", e))),
    }
}

/// Replaces the cached feed. Deleted posts must not come back from the cache,
/// so this overwrites rather than merging.
pub fn save_posts_to(cache_path: &Path, posts: &[Post]) -> Result<(), GramtuiError> {
    let json = serde_json::to_string(posts)
        .map_err(|e| GramtuiError::Cache(format!("Failed to serialize posts: {}", e)))?;

    fs::write(cache_path, json)
        .map_err(|e| GramtuiError::Cache(format!("Failed to write cache file: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: &str) -> Post {
        serde_json::from_value(serde_json::json!({ "_id": id, "likes": ["u1"] })).unwrap()
    }

    #[test]
    fn missing_cache_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_posts_from(&dir.path().join("posts.json")).unwrap().is_empty());
    }

    #[test]
    fn save_overwrites_previous_feed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.json");

        save_posts_to(&path, &[post("p1"), post("p2")]).unwrap();
        save_posts_to(&path, &[post("p2")]).unwrap();

        let posts = load_posts_from(&path).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "p2");
        assert!(posts[0].is_liked_by("u1"));
    }

    #[test]
    fn corrupt_cache_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.json");
        fs::write(&path, "[{").unwrap();
        assert!(matches!(load_posts_from(&path), Err(GramtuiError::Cache(_))));
    }
}
