pub mod category;
pub mod engine;
pub mod screen;

pub use category::{parse_price, Category, CategoryRule, CATEGORY_RULES};
pub use engine::{derive_indices, derive_view, FilterState};
pub use screen::{EmptyState, ListingScreen};
