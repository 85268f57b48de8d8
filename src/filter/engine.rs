use crate::filter::category::{contains_ignore_case, Category};
use crate::models::Property;

/// Search box text plus the single active category chip
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    query: String,
    active: Option<Category>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// True when the trimmed query would narrow the list
    pub fn has_query(&self) -> bool {
        !self.query.trim().is_empty()
    }

    pub fn active(&self) -> Option<Category> {
        self.active
    }

    /// Select `category`, or clear it if it is already the active one.
    /// Returns the category active afterwards.
    pub fn toggle(&mut self, category: Category) -> Option<Category> {
        self.active = if self.active == Some(category) {
            None
        } else {
            Some(category)
        };
        self.active
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.set_query(query);
        self
    }

    pub fn with_category(mut self, category: Option<Category>) -> Self {
        self.active = category;
        self
    }
}

/// Positions into `listings` of the records that make up the derived view,
/// in display order.
pub fn derive_indices(listings: &[Property], filter: &FilterState) -> Vec<usize> {
    let query = filter.query.trim();

    let mut indices: Vec<usize> = (0..listings.len())
        .filter(|&i| {
            query.is_empty()
                || contains_ignore_case(&listings[i].name, query)
                || contains_ignore_case(&listings[i].location, query)
        })
        .collect();

    if let Some(category) = filter.active {
        let rule = category.rule();
        if let Some(predicate) = rule.predicate {
            indices.retain(|&i| predicate(&listings[i]));
        }
        if let Some(comparator) = rule.comparator {
            // sort_by is stable, ties keep fetch order
            indices.sort_by(|&a, &b| comparator(&listings[a], &listings[b]));
        }
    }

    indices
}

/// Apply the text filter, then the active category, to the canonical list.
/// The canonical list is never modified.
pub fn derive_view<'a>(listings: &'a [Property], filter: &FilterState) -> Vec<&'a Property> {
    derive_indices(listings, filter)
        .into_iter()
        .map(|i| &listings[i])
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    pub(crate) fn listing(id: i64, name: &str, location: &str, price: &str, bedrooms: u32) -> Property {
        Property {
            id,
            name: name.to_string(),
            location: location.to_string(),
            price: price.to_string(),
            image: String::new(),
            bedrooms,
            bathrooms: 1,
            area: "1200 sqft".to_string(),
            description: None,
            three_d_file: None,
        }
    }

    fn names(view: &[&Property]) -> Vec<String> {
        view.iter().map(|p| p.name.clone()).collect()
    }

    fn sample() -> Vec<Property> {
        vec![
            listing(1, "Villa Sunset", "Malibu", "$2,500,000", 3),
            listing(2, "City Loft", "Downtown, NY", "$900,000", 2),
            listing(3, "Garden House", "brooklyn, NY", "Free", 3),
            listing(4, "Harbor Flat", "Austin", "$1,200,000", 1),
        ]
    }

    #[test]
    fn test_villa_category_filters() {
        let listings = vec![
            listing(1, "Villa Sunset", "", "", 3),
            listing(2, "City Loft", "", "", 2),
        ];
        let filter = FilterState::new().with_category(Some(Category::Villa));
        assert_eq!(names(&derive_view(&listings, &filter)), vec!["Villa Sunset"]);
    }

    #[test]
    fn test_villa_matches_description() {
        let mut listings = sample();
        listings[3].description = Some("A quiet VILLA by the water".to_string());
        let filter = FilterState::new().with_category(Some(Category::Villa));
        assert_eq!(
            names(&derive_view(&listings, &filter)),
            vec!["Villa Sunset", "Harbor Flat"]
        );
    }

    #[test]
    fn test_query_matches_name() {
        let listings = vec![
            listing(1, "Villa Sunset", "", "", 3),
            listing(2, "City Loft", "", "", 2),
        ];
        let filter = FilterState::new().with_query("loft");
        assert_eq!(names(&derive_view(&listings, &filter)), vec!["City Loft"]);
    }

    #[test]
    fn test_query_matches_location_and_is_trimmed() {
        let filter = FilterState::new().with_query("  ny ");
        assert_eq!(
            names(&derive_view(&sample(), &filter)),
            vec!["City Loft", "Garden House"]
        );
    }

    #[test]
    fn test_blank_query_keeps_everything() {
        let filter = FilterState::new().with_query("   ");
        assert!(!filter.has_query());
        assert_eq!(derive_view(&sample(), &filter).len(), 4);
    }

    #[test]
    fn test_bedroom_sort_descending_and_stable() {
        let filter = FilterState::new().with_category(Some(Category::Bedroom));
        assert_eq!(
            names(&derive_view(&sample(), &filter)),
            vec!["Villa Sunset", "Garden House", "City Loft", "Harbor Flat"]
        );
    }

    #[test]
    fn test_place_sort_ignores_case() {
        let filter = FilterState::new().with_category(Some(Category::Place));
        assert_eq!(
            names(&derive_view(&sample(), &filter)),
            vec!["Harbor Flat", "Garden House", "City Loft", "Villa Sunset"]
        );
    }

    #[test]
    fn test_place_sort_ignores_accents() {
        let listings = vec![
            listing(1, "Austin", "Austin", "", 1),
            listing(2, "Fargo", "Fargo", "", 1),
            listing(3, "Éze", "Éze", "", 1),
        ];
        let filter = FilterState::new().with_category(Some(Category::Place));
        assert_eq!(
            names(&derive_view(&listings, &filter)),
            vec!["Austin", "Éze", "Fargo"]
        );
    }

    #[test]
    fn test_type_sort_puts_oversized_price_last() {
        let listings = vec![
            listing(1, "Huge", "", "$123,456,789,012,345,678,901", 1),
            listing(2, "Small", "", "$100", 1),
        ];
        let filter = FilterState::new().with_category(Some(Category::Type));
        assert_eq!(names(&derive_view(&listings, &filter)), vec!["Small", "Huge"]);
    }

    #[test]
    fn test_type_sort_by_parsed_price() {
        let filter = FilterState::new().with_category(Some(Category::Type));
        assert_eq!(
            names(&derive_view(&sample(), &filter)),
            vec!["Garden House", "City Loft", "Harbor Flat", "Villa Sunset"]
        );
    }

    #[test]
    fn test_query_then_category() {
        let filter = FilterState::new()
            .with_query("ny")
            .with_category(Some(Category::Type));
        assert_eq!(
            names(&derive_view(&sample(), &filter)),
            vec!["Garden House", "City Loft"]
        );
    }

    #[test]
    fn test_toggle_is_exclusive() {
        let mut filter = FilterState::new();
        assert_eq!(filter.toggle(Category::Villa), Some(Category::Villa));
        assert_eq!(filter.toggle(Category::Place), Some(Category::Place));
        assert_eq!(filter.toggle(Category::Place), None);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(derive_view(&[], &FilterState::new()).is_empty());
        let filter = FilterState::new().with_query("nowhere");
        assert!(derive_view(&sample(), &filter).is_empty());
    }

    fn arb_listing() -> impl Strategy<Value = (String, String, String, u32)> {
        (
            "[A-Za-z ]{0,12}",
            "[A-Za-z, ]{0,12}",
            "[$0-9,A-Za-z]{0,10}",
            0u32..6,
        )
    }

    fn build(raw: Vec<(String, String, String, u32)>) -> Vec<Property> {
        raw.into_iter()
            .enumerate()
            .map(|(i, (name, location, price, bedrooms))| {
                listing(i as i64, &name, &location, &price, bedrooms)
            })
            .collect()
    }

    fn arb_category() -> impl Strategy<Value = Category> {
        prop::sample::select(Category::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn toggling_twice_returns_to_text_only_view(
            raw in prop::collection::vec(arb_listing(), 0..12),
            query in "[A-Za-z]{0,3}",
            category in arb_category(),
        ) {
            let listings = build(raw);
            let mut filter = FilterState::new().with_query(query.clone());
            filter.toggle(category);
            filter.toggle(category);
            prop_assert_eq!(filter.active(), None);

            let text_only = FilterState::new().with_query(query);
            prop_assert_eq!(
                derive_indices(&listings, &filter),
                derive_indices(&listings, &text_only)
            );
        }

        #[test]
        fn view_ignores_query_case(
            raw in prop::collection::vec(arb_listing(), 0..12),
            query in "[A-Za-z]{0,3}",
            category in prop::option::of(arb_category()),
        ) {
            let listings = build(raw);
            let lower = FilterState::new().with_query(query.to_lowercase()).with_category(category);
            let upper = FilterState::new().with_query(query.to_uppercase()).with_category(category);
            prop_assert_eq!(
                derive_indices(&listings, &lower),
                derive_indices(&listings, &upper)
            );
        }

        #[test]
        fn bedroom_sort_keeps_fetch_order_for_ties(
            raw in prop::collection::vec(arb_listing(), 0..16),
        ) {
            let listings = build(raw);
            let filter = FilterState::new().with_category(Some(Category::Bedroom));
            let order = derive_indices(&listings, &filter);
            prop_assert_eq!(order.len(), listings.len());
            for pair in order.windows(2) {
                let (a, b) = (&listings[pair[0]], &listings[pair[1]]);
                prop_assert!(a.bedrooms >= b.bedrooms);
                if a.bedrooms == b.bedrooms {
                    prop_assert!(pair[0] < pair[1]);
                }
            }
        }

        #[test]
        fn canonical_list_is_untouched(
            raw in prop::collection::vec(arb_listing(), 0..12),
            category in prop::option::of(arb_category()),
        ) {
            let listings = build(raw);
            let before = listings.clone();
            let _ = derive_view(&listings, &FilterState::new().with_category(category));
            prop_assert_eq!(listings, before);
        }
    }
}
