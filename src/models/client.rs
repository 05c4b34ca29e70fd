use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;

use crate::error::{ApiError, GramtuiError};
use crate::models::auth::{self, Credential};
use crate::models::post::{Comment, Post};
use crate::models::user::{PictureUpload, ProfileEdit, User};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The `{ success, message }` envelope every route answers with.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ApiResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: String,
    pub user: User,
    pub token: Credential,
}

#[derive(Deserialize)]
struct PostsEnvelope {
    #[serde(default)]
    posts: Vec<Post>,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Deserialize)]
struct UsersEnvelope {
    #[serde(default)]
    users: Vec<User>,
}

#[derive(Deserialize)]
struct CommentEnvelope {
    comment: Comment,
}

/// Everything the client asks of the backend.
///
/// The like/dislike, delete and comment routes act on behalf of whoever owns
/// the bearer token, so no user id is passed for them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SocialApi: Send + Sync {
    async fn register(&self, username: &str, email: &str, password: &str) -> Result<ApiResponse, ApiError>;

    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError>;

    async fn logout(&self) -> Result<ApiResponse, ApiError>;

    async fn get_profile(&self, user_id: &str) -> Result<User, ApiError>;

    async fn edit_profile(&self, user_id: &str, edit: ProfileEdit) -> Result<User, ApiError>;

    async fn suggested_users(&self) -> Result<Vec<User>, ApiError>;

    async fn follow_or_unfollow(&self, user_id: &str) -> Result<ApiResponse, ApiError>;

    async fn get_posts(&self) -> Result<Vec<Post>, ApiError>;

    /// `desired == true` likes the post, `false` removes the like.
    async fn set_like(&self, post_id: &str, desired: bool) -> Result<ApiResponse, ApiError>;

    async fn delete_post(&self, post_id: &str) -> Result<ApiResponse, ApiError>;

    async fn add_comment(&self, post_id: &str, text: &str) -> Result<Comment, ApiError>;
}

#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
    api_url: String,
    credential: Option<Credential>,
}

impl HttpClient {
    pub fn new(api_url: &str, credential: Option<Credential>) -> Result<Self, GramtuiError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GramtuiError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            credential,
        })
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    fn user_url(&self, path: &str) -> String {
        format!("{}/user{}", self.api_url, path)
    }

    fn post_url(&self, path: &str) -> String {
        format!("{}/post{}", self.api_url, path)
    }

    /// Runs the auth gate, then attaches the bearer token.
    fn guarded(&self, builder: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let credential = auth::is_authenticated(self.credential.as_ref())?;
        Ok(builder.bearer_auth(credential.as_str()))
    }

    /// Attaches the bearer token when there is one. Used by routes open to
    /// anonymous readers.
    fn optional_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.credential {
            Some(credential) => builder.bearer_auth(credential.as_str()),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ApiResponse>()
        .await
        .map(|r| r.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| status.to_string());

    log::debug!("Request failed with {}: {}", status, message);
    Err(status_error(status, message))
}

pub(crate) fn status_error(status: StatusCode, message: String) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::FORBIDDEN => ApiError::Forbidden(message),
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::BAD_REQUEST => ApiError::InvalidInput(message),
        _ => ApiError::Remote(message),
    }
}

fn picture_part(picture: PictureUpload) -> Result<Part, ApiError> {
    Part::bytes(picture.bytes)
        .file_name(picture.file_name)
        .mime_str(&picture.mime_type)
        .map_err(|_| ApiError::InvalidInput(format!("Invalid MIME type: {}", picture.mime_type)))
}

#[async_trait]
impl SocialApi for HttpClient {
    async fn register(&self, username: &str, email: &str, password: &str) -> Result<ApiResponse, ApiError> {
        let body = json!({ "username": username, "email": email, "password": password });
        self.send(self.client.post(self.user_url("/register")).json(&body)).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = json!({ "email": email, "password": password });
        self.send(self.client.post(self.user_url("/login")).json(&body)).await
    }

    async fn logout(&self) -> Result<ApiResponse, ApiError> {
        // Logging out with a stale or missing token is still a logout.
        let builder = self.optional_auth(self.client.get(self.user_url("/logout")));
        self.send(builder).await
    }

    async fn get_profile(&self, user_id: &str) -> Result<User, ApiError> {
        let builder = self.guarded(self.client.get(self.user_url(&format!("/profile/{}", user_id))))?;
        let envelope: UserEnvelope = self.send(builder).await?;
        Ok(envelope.user)
    }

    async fn edit_profile(&self, user_id: &str, edit: ProfileEdit) -> Result<User, ApiError> {
        let mut form = Form::new();
        if let Some(bio) = edit.bio {
            form = form.text("bio", bio);
        }
        if let Some(gender) = edit.gender {
            form = form.text("gender", gender);
        }
        if let Some(picture) = edit.profile_picture {
            form = form.part("profilePicture", picture_part(picture)?);
        }

        let builder = self.client
            .post(self.user_url(&format!("/profile/edit/{}", user_id)))
            .multipart(form);
        let envelope: UserEnvelope = self.send(self.guarded(builder)?).await?;
        Ok(envelope.user)
    }

    async fn suggested_users(&self) -> Result<Vec<User>, ApiError> {
        let builder = self.guarded(self.client.get(self.user_url("/suggested")))?;
        let envelope: UsersEnvelope = self.send(builder).await?;
        Ok(envelope.users)
    }

    async fn follow_or_unfollow(&self, user_id: &str) -> Result<ApiResponse, ApiError> {
        let url = self.user_url(&format!("/followorunfollow/{}", user_id));
        self.send(self.guarded(self.client.post(url))?).await
    }

    async fn get_posts(&self) -> Result<Vec<Post>, ApiError> {
        let builder = self.optional_auth(self.client.get(self.post_url("/all")));
        let envelope: PostsEnvelope = self.send(builder).await?;
        Ok(envelope.posts)
    }

    async fn set_like(&self, post_id: &str, desired: bool) -> Result<ApiResponse, ApiError> {
        let action = if desired { "like" } else { "dislike" };
        let url = self.post_url(&format!("/{}/{}", post_id, action));
        self.send(self.guarded(self.client.get(url))?).await
    }

    async fn delete_post(&self, post_id: &str) -> Result<ApiResponse, ApiError> {
        let url = self.post_url(&format!("/delete/{}", post_id));
        self.send(self.guarded(self.client.delete(url))?).await
    }

    async fn add_comment(&self, post_id: &str, text: &str) -> Result<Comment, ApiError> {
        let url = self.post_url(&format!("/{}/comment", post_id));
        let builder = self.guarded(self.client.post(url).json(&json!({ "text": text })))?;
        let envelope: CommentEnvelope = self.send(builder).await?;
        Ok(envelope.comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, token: Option<&str>) -> HttpClient {
        let api_url = format!("{}/api/v1", server.uri());
        HttpClient::new(&api_url, token.map(Credential::new)).unwrap()
    }

    #[test]
    fn maps_status_codes_to_error_kinds() {
        assert_eq!(status_error(StatusCode::UNAUTHORIZED, "x".into()), ApiError::Unauthorized);
        assert_eq!(status_error(StatusCode::FORBIDDEN, "no".into()), ApiError::Forbidden("no".into()));
        assert_eq!(status_error(StatusCode::NOT_FOUND, "gone".into()), ApiError::NotFound("gone".into()));
        assert_eq!(status_error(StatusCode::BAD_REQUEST, "bad".into()), ApiError::InvalidInput("bad".into()));
        assert_eq!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR, "boom".into()),
            ApiError::Remote("boom".into())
        );
    }

    #[tokio::test]
    async fn guarded_routes_refuse_without_token() {
        // Nothing listens here; the gate must refuse before any connection is attempted.
        let client = HttpClient::new("http://127.0.0.1:9/api/v1", None).unwrap();

        assert_eq!(client.set_like("p1", true).await, Err(ApiError::Unauthorized));
        assert_eq!(client.delete_post("p1").await, Err(ApiError::Unauthorized));
        assert_eq!(client.follow_or_unfollow("u2").await, Err(ApiError::Unauthorized));
    }

    #[test]
    fn urls_are_built_under_api_root() {
        let client = HttpClient::new("http://localhost:8000/api/v1/", None).unwrap();
        assert_eq!(client.user_url("/login"), "http://localhost:8000/api/v1/user/login");
        assert_eq!(client.post_url("/all"), "http://localhost:8000/api/v1/post/all");
    }

    #[test]
    fn login_response_parses_token() {
        let json = r#"{ "success": true, "message": "Welcome back alice",
                        "user": { "_id": "u1", "username": "alice", "following": ["u2"] },
                        "token": "abc.def.ghi" }"#;
        let response: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.user.id, "u1");
        assert!(response.user.is_following("u2"));
        assert_eq!(response.token.as_str(), "abc.def.ghi");
    }

    #[tokio::test]
    async fn feed_is_readable_without_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/post/all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "posts": [{ "_id": "p1", "likes": ["u1"] }],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let posts = client_for(&server, None).get_posts().await.unwrap();
        assert_eq!(posts.len(), 1);
        assert!(posts[0].is_liked_by("u1"));
    }

    #[tokio::test]
    async fn forbidden_delete_carries_backend_message() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/post/delete/p1"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "success": false,
                "message": "You can only delete your own posts",
            })))
            .mount(&server)
            .await;

        let result = client_for(&server, Some("tok")).delete_post("p1").await;
        assert_eq!(result, Err(ApiError::Forbidden("You can only delete your own posts".to_string())));
    }

    #[tokio::test]
    async fn error_without_message_falls_back_to_status_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/post/p1/like"))
            .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let result = client_for(&server, Some("tok")).set_like("p1", true).await;
        assert_eq!(result, Err(ApiError::Remote("500 Internal Server Error".to_string())));
    }

    #[tokio::test]
    async fn profile_picture_is_sent_as_file_part() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/user/profile/edit/u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "user": { "_id": "u1", "username": "alice", "bio": "hi" },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let edit = ProfileEdit {
            bio: Some("hi".to_string()),
            gender: None,
            profile_picture: Some(PictureUpload {
                file_name: "me.png".to_string(),
                mime_type: "image/png".to_string(),
                bytes: vec![0x89, b'P', b'N', b'G'],
            }),
        };
        let user = client_for(&server, Some("tok")).edit_profile("u1", edit).await.unwrap();
        assert_eq!(user.bio.as_deref(), Some("hi"));

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains(r#"name="profilePicture"; filename="me.png""#));
        assert!(body.contains("image/png"));
        assert!(body.contains(r#"name="bio""#));
    }

    #[test]
    fn picture_part_rejects_bad_mime() {
        let picture = PictureUpload {
            file_name: "me.png".to_string(),
            mime_type: "not a mime".to_string(),
            bytes: vec![1],
        };
        assert!(matches!(picture_part(picture), Err(ApiError::InvalidInput(_))));
    }
}
