use crate::models::User;
use serde::{Deserialize, Serialize};

/// `{"error": "..."}` body the backend sends with 4xx/5xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckEmailRequest<'a> {
    pub email: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckEmailResponse {
    pub exists: bool,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of a successful login or signup
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct LikeRequest<'a> {
    pub email: &'a str,
    pub liked_item_id: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Whether `POST /likes/` created a new like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    Added,
    AlreadyLiked,
}

/// Image attached to a signup as the `profile_pic` part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePic {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime: String,
}

impl ProfilePic {
    /// Name and MIME type follow the file extension: `photo.<ext>`, `image/<ext>`
    pub fn new(bytes: Vec<u8>, source_name: &str) -> Self {
        let ext = source_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty() && !ext.contains('/'))
            .unwrap_or_else(|| "jpeg".to_string());
        Self {
            bytes,
            file_name: format!("photo.{}", ext),
            mime: format!("image/{}", ext),
        }
    }
}

/// Fields of `POST /signup/`
#[derive(Debug, Clone)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub contact_number: String,
    pub profile_pic: Option<ProfilePic>,
}
