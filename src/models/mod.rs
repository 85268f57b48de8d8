use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single listing as returned by `GET /api/properties/`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Property {
    pub id: i64,
    pub name: String,
    pub location: String,
    /// Currency formatted, e.g. "$1,200,000"
    pub price: String,
    #[serde(default)]
    pub image: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub area: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Path or absolute URL of the GLTF/GLB model
    #[serde(default)]
    pub three_d_file: Option<String>,
}

impl Property {
    /// Serialized snapshot handed from the list screen to the detail screen
    pub fn to_snapshot(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_snapshot(snapshot: &str) -> serde_json::Result<Self> {
        serde_json::from_str(snapshot)
    }
}

/// Optional profile attached to a user account
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    #[serde(default)]
    pub contact_number: Option<String>,
    #[serde(default)]
    pub profile_pic: Option<String>,
}

/// Signed-in user as returned by login and signup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub profile: Option<UserProfile>,
}

impl User {
    /// Greeting name: the local part of the email, or "User"
    pub fn display_name(&self) -> &str {
        match self.email.split('@').next() {
            Some(local) if !local.is_empty() => local,
            _ => "User",
        }
    }
}

/// A property the user has liked
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Like {
    pub id: i64,
    pub user: i64,
    pub liked_item_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Upcoming,
    Completed,
}

/// A scheduled or past property viewing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: i64,
    pub title: String,
    pub location: String,
    pub date: NaiveDate,
    pub status: BookingStatus,
    pub image: String,
}
