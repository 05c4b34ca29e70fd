use crate::models::auth::Credential;
use crate::models::user::CurrentUser;

/// Who is using the client right now. `user == None` means anonymous:
/// reading is allowed, every mutating gesture is refused.
#[derive(Clone, Debug, Default)]
pub struct Session {
    user: Option<CurrentUser>,
    credential: Option<Credential>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(user: CurrentUser, credential: Credential) -> Self {
        Self {
            user: Some(user),
            credential: Some(credential),
        }
    }

    pub fn user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn logout(&mut self) {
        self.user = None;
        self.credential = None;
    }

    /// Flips whether the current user follows `target_user_id`.
    /// Returns the new state, or `None` when nobody is logged in.
    pub fn update_follow_status(&mut self, target_user_id: &str) -> Option<bool> {
        let user = self.user.as_mut()?;
        if user.following.remove(target_user_id) {
            Some(false)
        } else {
            user.following.insert(target_user_id.to_string());
            Some(true)
        }
    }
}
