use std::path::Path;

use crate::error::{ApiError, GramtuiError};
use crate::models::{ApiResponse, Config, PictureUpload, ProfileEdit, Session, SocialApi, User};

pub async fn register<A: SocialApi + ?Sized>(
    api: &A,
    username: &str,
    email: &str,
    password: &str,
) -> Result<ApiResponse, GramtuiError> {
    if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err(ApiError::InvalidInput("Username, email and password are required".to_string()).into());
    }
    Ok(api.register(username.trim(), email.trim(), password).await?)
}

/// Logs in and records the token and user id in `config`. The caller saves it.
pub async fn login<A: SocialApi + ?Sized>(
    api: &A,
    config: &mut Config,
    email: &str,
    password: &str,
) -> Result<User, GramtuiError> {
    let response = api.login(email.trim(), password).await?;
    log::info!("Logged in as {}", response.user.username);
    config.set_login(response.user.id.clone(), response.token);
    Ok(response.user)
}

/// Forgets the local login even when the backend cannot be reached.
pub async fn logout<A: SocialApi + ?Sized>(api: &A, config: &mut Config) -> String {
    let message = match api.logout().await {
        Ok(response) if !response.message.is_empty() => response.message,
        Ok(_) => "Logged out successfully".to_string(),
        Err(e) => {
            log::warn!("Logout request failed: {}", e);
            "Logged out locally".to_string()
        }
    };
    config.clear_login();
    message
}

/// Builds the session the feed starts with. A stale token degrades to an
/// anonymous session instead of failing.
pub async fn load_session<A: SocialApi + ?Sized>(api: &A, config: &Config) -> Session {
    let (Some(user_id), Some(token)) = (&config.user_id, &config.token) else {
        return Session::anonymous();
    };

    match api.get_profile(user_id).await {
        Ok(user) => Session::new(user, token.clone()),
        Err(e) => {
            log::warn!("Could not restore session for {}: {}", user_id, e);
            Session::anonymous()
        }
    }
}

pub async fn profile<A: SocialApi + ?Sized>(
    api: &A,
    config: &Config,
    user_id: Option<&str>,
) -> Result<User, GramtuiError> {
    let user_id = user_id
        .or(config.user_id.as_deref())
        .ok_or_else(|| GramtuiError::Config("No user id given and not logged in".to_string()))?;
    Ok(api.get_profile(user_id).await?)
}

pub async fn suggested<A: SocialApi + ?Sized>(api: &A) -> Result<Vec<User>, GramtuiError> {
    Ok(api.suggested_users().await?)
}

pub async fn follow_or_unfollow<A: SocialApi + ?Sized>(
    api: &A,
    config: &Config,
    target_id: &str,
) -> Result<ApiResponse, GramtuiError> {
    if config.user_id.as_deref() == Some(target_id) {
        return Err(ApiError::InvalidInput("You cannot follow yourself".to_string()).into());
    }
    let response = api.follow_or_unfollow(target_id).await?;
    if !response.success {
        return Err(ApiError::Remote(response.message).into());
    }
    Ok(response)
}

pub async fn edit_profile<A: SocialApi + ?Sized>(
    api: &A,
    config: &Config,
    bio: Option<String>,
    gender: Option<String>,
    picture: Option<&Path>,
) -> Result<User, GramtuiError> {
    let user_id = config
        .user_id
        .as_deref()
        .ok_or_else(|| GramtuiError::Api(ApiError::Unauthorized))?;

    let profile_picture = picture.map(PictureUpload::from_path).transpose()?;
    let edit = ProfileEdit {
        bio,
        gender,
        profile_picture,
    };
    Ok(api.edit_profile(user_id, edit).await?)
}

/// Plain-text rendering used by the non-TUI subcommands.
pub fn describe_user(user: &User) -> String {
    let mut out = format!("{} ({})\n", user.display_name(), user.id);
    if let Some(bio) = user.bio.as_deref().filter(|b| !b.is_empty()) {
        out.push_str(&format!("  {}\n", bio));
    }
    out.push_str(&format!(
        "  {} followers, {} following\n  avatar: {}",
        user.followers.len(),
        user.following.len(),
        user.avatar(),
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Credential;
    use crate::models::client::{LoginResponse, MockSocialApi};
    use mockall::predicate::*;
    use std::io::Write;

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            username: format!("user-{id}"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn login_records_credentials() {
        let mut api = MockSocialApi::new();
        api.expect_login()
            .with(eq("a@b.c"), eq("pw"))
            .times(1)
            .returning(|_, _| {
                Ok(LoginResponse {
                    message: "Welcome back".to_string(),
                    user: user("u1"),
                    token: Credential::new("tok"),
                })
            });

        let mut config = Config::default();
        let logged_in = login(&api, &mut config, " a@b.c ", "pw").await.unwrap();

        assert_eq!(logged_in.id, "u1");
        assert!(config.is_logged_in());
        assert_eq!(config.token, Some(Credential::new("tok")));
    }

    #[tokio::test]
    async fn logout_clears_login_even_on_failure() {
        let mut api = MockSocialApi::new();
        api.expect_logout()
            .times(1)
            .returning(|| Err(ApiError::Remote("offline".to_string())));

        let mut config = Config::default();
        config.set_login("u1".to_string(), Credential::new("tok"));

        assert_eq!(logout(&api, &mut config).await, "Logged out locally");
        assert!(!config.is_logged_in());
    }

    #[tokio::test]
    async fn stale_token_gives_anonymous_session() {
        let mut api = MockSocialApi::new();
        api.expect_get_profile()
            .times(1)
            .returning(|_| Err(ApiError::Unauthorized));

        let mut config = Config::default();
        config.set_login("u1".to_string(), Credential::new("tok"));

        let session = load_session(&api, &config).await;
        assert!(session.user().is_none());
    }

    #[tokio::test]
    async fn session_restored_from_profile() {
        let mut api = MockSocialApi::new();
        api.expect_get_profile()
            .with(eq("u1"))
            .times(1)
            .returning(|id| Ok(user(id)));

        let mut config = Config::default();
        config.set_login("u1".to_string(), Credential::new("tok"));

        let session = load_session(&api, &config).await;
        assert_eq!(session.user_id(), Some("u1"));
        assert!(session.credential().is_some());
    }

    #[tokio::test]
    async fn register_requires_all_fields() {
        let api = MockSocialApi::new();
        let err = register(&api, "", "a@b.c", "pw").await.unwrap_err();
        assert!(matches!(err, GramtuiError::Api(ApiError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn cannot_follow_self() {
        let api = MockSocialApi::new();
        let mut config = Config::default();
        config.set_login("u1".to_string(), Credential::new("tok"));

        assert!(follow_or_unfollow(&api, &config, "u1").await.is_err());
    }

    #[tokio::test]
    async fn edit_profile_uploads_picture_file() {
        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        file.write_all(b"jpegbytes").unwrap();

        let mut api = MockSocialApi::new();
        api.expect_edit_profile()
            .withf(|id, edit| {
                id == "u1"
                    && edit.bio.as_deref() == Some("hello")
                    && edit.profile_picture.as_ref().is_some_and(|p| {
                        p.mime_type == "image/jpeg" && p.bytes == b"jpegbytes" && p.file_name.ends_with(".jpg")
                    })
            })
            .times(1)
            .returning(|id, _| Ok(user(id)));

        let mut config = Config::default();
        config.set_login("u1".to_string(), Credential::new("tok"));

        let updated = edit_profile(&api, &config, Some("hello".to_string()), None, Some(file.path()))
            .await
            .unwrap();
        assert_eq!(updated.id, "u1");
    }

    #[tokio::test]
    async fn edit_profile_requires_login() {
        let api = MockSocialApi::new();
        let err = edit_profile(&api, &Config::default(), None, None, None).await.unwrap_err();
        assert!(matches!(err, GramtuiError::Api(ApiError::Unauthorized)));
    }

    #[test]
    fn describe_user_lists_counts() {
        let mut u = user("u1");
        u.following.insert("u2".to_string());
        let text = describe_user(&u);
        assert!(text.contains("user-u1 (u1)"));
        assert!(text.contains("0 followers, 1 following"));
    }
}
