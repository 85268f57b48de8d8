use crate::api::error::Result;
use crate::models::Property;
use async_trait::async_trait;

/// Where the home screen gets its listings from.
/// The HTTP client is the real source; a fixed list stands in offline.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch the full canonical list
    async fn fetch_listings(&self) -> Result<Vec<Property>>;

    /// Get the name of the listing source
    fn source_name(&self) -> &'static str;
}

/// Listings held in memory, e.g. a saved snapshot
pub struct StaticListings {
    listings: Vec<Property>,
}

impl StaticListings {
    pub fn new(listings: Vec<Property>) -> Self {
        Self { listings }
    }

    /// Parse a JSON array as returned by `GET /api/properties/`
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }
}

#[async_trait]
impl ListingSource for StaticListings {
    async fn fetch_listings(&self) -> Result<Vec<Property>> {
        Ok(self.listings.clone())
    }

    fn source_name(&self) -> &'static str {
        "snapshot"
    }
}
