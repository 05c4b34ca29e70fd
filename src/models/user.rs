use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, GramtuiError};
use crate::models::post::{DEFAULT_PICTURE, DEFAULT_USERNAME};

/// A user record as the backend returns it from login and profile routes.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub followers: BTreeSet<String>,
    #[serde(default)]
    pub following: BTreeSet<String>,
}

impl User {
    pub fn display_name(&self) -> &str {
        if self.username.is_empty() {
            DEFAULT_USERNAME
        } else {
            &self.username
        }
    }

    pub fn avatar(&self) -> &str {
        self.profile_picture.as_deref().unwrap_or(DEFAULT_PICTURE)
    }

    pub fn is_following(&self, user_id: &str) -> bool {
        self.following.contains(user_id)
    }
}

/// The authenticated actor. Only ever held as `Option<CurrentUser>`.
pub type CurrentUser = User;

/// A picture file bound for the `profilePicture` multipart part. The backend
/// turns it into a data URI itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PictureUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl PictureUpload {
    pub fn from_path(path: &Path) -> Result<Self, GramtuiError> {
        let mime_type = mime_guess::from_path(path)
            .first_raw()
            .ok_or_else(|| ApiError::InvalidInput(format!("Unknown file type: {}", path.display())))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| ApiError::InvalidInput(format!("Not a file: {}", path.display())))?;

        let bytes = fs::read(path)?;
        if bytes.is_empty() {
            return Err(ApiError::InvalidInput("File buffer is empty".to_string()).into());
        }

        Ok(Self {
            file_name,
            mime_type: mime_type.to_string(),
            bytes,
        })
    }
}

/// Fields accepted by the profile edit route.
#[derive(Clone, Debug, Default)]
pub struct ProfileEdit {
    pub bio: Option<String>,
    pub gender: Option<String>,
    pub profile_picture: Option<PictureUpload>,
}
