use crate::api::error::{ApiError, Result};
use crate::api::traits::ListingSource;
use crate::api::types::{
    AuthResponse, CheckEmailRequest, CheckEmailResponse, LikeOutcome, LikeRequest, LoginRequest,
    MessageResponse, ProfilePic, SignupForm,
};
use crate::config::AppConfig;
use crate::models::{Like, Property, User};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// HTTP client for the listings backend
pub struct ApiClient {
    client: Client,
    config: AppConfig,
}

impl ApiClient {
    /// Create a new client from the runtime config
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(ApiError::Connection)?;

        Ok(Self { client, config })
    }

    /// `GET /properties/`
    pub async fn fetch_properties(&self) -> Result<Vec<Property>> {
        let url = self.config.endpoint("properties/");
        debug!("Fetching URL: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ApiError::Connection)?;
        let properties: Vec<Property> = read_json(&url, response).await?;

        info!("Fetched {} properties", properties.len());
        Ok(properties)
    }

    /// `POST /check-email/`: whether an account exists for `email`
    pub async fn check_email(&self, email: &str) -> Result<bool> {
        require("email", email)?;
        let url = self.config.endpoint("check-email/");
        let response = self
            .client
            .post(&url)
            .json(&CheckEmailRequest { email })
            .send()
            .await
            .map_err(ApiError::Connection)?;
        let body: CheckEmailResponse = read_json(&url, response).await?;
        debug!("Email {} exists: {}", email, body.exists);
        Ok(body.exists)
    }

    /// `POST /login/`
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        require("email", email)?;
        require("password", password)?;
        let url = self.config.endpoint("login/");
        let response = self
            .client
            .post(&url)
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(ApiError::Connection)?;
        let body: AuthResponse = read_json(&url, response).await?;
        info!("Logged in as {}", body.user.email);
        Ok(body.user)
    }

    /// `POST /signup/` as multipart form data
    pub async fn signup(&self, form: SignupForm) -> Result<User> {
        require("email", &form.email)?;
        require("password", &form.password)?;
        require("contact number", &form.contact_number)?;

        let url = self.config.endpoint("signup/");
        let mut multipart = Form::new()
            .text("email", form.email)
            .text("password", form.password)
            .text("contact_number", form.contact_number);

        if let Some(pic) = form.profile_pic {
            let part = Part::bytes(pic.bytes)
                .file_name(pic.file_name)
                .mime_str(&pic.mime)
                .map_err(|e| ApiError::Invalid(e.to_string()))?;
            multipart = multipart.part("profile_pic", part);
        }

        let response = self
            .client
            .post(&url)
            .multipart(multipart)
            .send()
            .await
            .map_err(ApiError::Connection)?;
        let body: AuthResponse = read_json(&url, response).await?;
        info!("Created account {}", body.user.email);
        Ok(body.user)
    }

    /// `GET /likes/?email=`
    pub async fn likes(&self, email: &str) -> Result<Vec<Like>> {
        require("email", email)?;
        let url = self.config.endpoint("likes/");
        let response = self
            .client
            .get(&url)
            .query(&[("email", email)])
            .send()
            .await
            .map_err(ApiError::Connection)?;
        read_json(&url, response).await
    }

    /// `POST /likes/`. Liking twice is not an error.
    pub async fn like(&self, email: &str, liked_item_id: &str) -> Result<LikeOutcome> {
        require("email", email)?;
        require("liked item", liked_item_id)?;
        let url = self.config.endpoint("likes/");
        let response = self
            .client
            .post(&url)
            .json(&LikeRequest {
                email,
                liked_item_id,
            })
            .send()
            .await
            .map_err(ApiError::Connection)?;

        let status = response.status();
        let body: MessageResponse = read_json(&url, response).await?;
        debug!("Like response: {:?}", body.message);
        Ok(like_outcome(status))
    }
}

#[async_trait]
impl ListingSource for ApiClient {
    async fn fetch_listings(&self) -> Result<Vec<Property>> {
        self.fetch_properties().await
    }

    fn source_name(&self) -> &'static str {
        "backend"
    }
}

/// Read a profile picture from disk for a signup
pub fn load_profile_pic(path: &Path) -> Result<ProfilePic> {
    let bytes = std::fs::read(path).map_err(|source| ApiError::Upload {
        path: path.display().to_string(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(ProfilePic::new(bytes, &name))
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ApiError::Invalid(format!("Please enter {}", field)));
    }
    Ok(())
}

fn like_outcome(status: StatusCode) -> LikeOutcome {
    if status == StatusCode::CREATED {
        LikeOutcome::Added
    } else {
        LikeOutcome::AlreadyLiked
    }
}

async fn read_json<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await.map_err(ApiError::Connection)?;
    parse_body(endpoint, status, &body)
}

/// Turn a status and body into the expected type or an `ApiError`
pub(crate) fn parse_body<T: DeserializeOwned>(
    endpoint: &str,
    status: StatusCode,
    body: &str,
) -> Result<T> {
    if !status.is_success() {
        warn!("{} returned status: {}", endpoint, status);
        return Err(ApiError::rejected(status, body));
    }
    serde_json::from_str(body).map_err(|source| ApiError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}
