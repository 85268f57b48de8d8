use crate::filter::category::Category;
use crate::filter::engine::{derive_indices, FilterState};
use crate::models::Property;
use tracing::debug;

/// Why the derived view has nothing to show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    /// Nothing to show and no search running
    NoData,
    /// A search was running and matched nothing
    NoResults,
}

impl EmptyState {
    pub fn message(self) -> &'static str {
        match self {
            EmptyState::NoData => "No properties available",
            EmptyState::NoResults => "No properties match your search",
        }
    }
}

/// Home screen state: the fetched listings, the filter, and the view derived
/// from both. Any change to an input recomputes the view.
#[derive(Debug, Default)]
pub struct ListingScreen {
    listings: Vec<Property>,
    filter: FilterState,
    visible: Vec<usize>,
}

impl ListingScreen {
    pub fn new(listings: Vec<Property>) -> Self {
        let mut screen = Self {
            listings,
            ..Self::default()
        };
        screen.recompute();
        screen
    }

    /// Swap in a freshly fetched list; the filter survives a refresh
    pub fn replace_listings(&mut self, listings: Vec<Property>) {
        self.listings = listings;
        self.recompute();
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.filter.set_query(query);
        self.recompute();
    }

    pub fn toggle_category(&mut self, category: Category) -> Option<Category> {
        let active = self.filter.toggle(category);
        self.recompute();
        active
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn listings(&self) -> &[Property] {
        &self.listings
    }

    pub fn visible(&self) -> impl Iterator<Item = &Property> + '_ {
        self.visible.iter().map(move |&i| &self.listings[i])
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    /// `None` while there is something to show. Only an active query makes
    /// an empty view read as "no results".
    pub fn empty_state(&self) -> Option<EmptyState> {
        if !self.visible.is_empty() {
            return None;
        }
        if self.filter.has_query() {
            Some(EmptyState::NoResults)
        } else {
            Some(EmptyState::NoData)
        }
    }

    pub fn find(&self, id: i64) -> Option<&Property> {
        self.listings.iter().find(|p| p.id == id)
    }

    fn recompute(&mut self) {
        self.visible = derive_indices(&self.listings, &self.filter);
        debug!(
            "Derived {} of {} listings (query={:?}, category={:?})",
            self.visible.len(),
            self.listings.len(),
            self.filter.query(),
            self.filter.active()
        );
    }
}
