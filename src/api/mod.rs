pub mod client;
pub mod error;
pub mod traits;
pub mod types;

pub use client::{load_profile_pic, ApiClient};
pub use error::ApiError;
pub use traits::{ListingSource, StaticListings};
pub use types::{LikeOutcome, ProfilePic, SignupForm};
