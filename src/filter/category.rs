use crate::models::Property;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Filter chips shown above the listing grid
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    Place,
    Villa,
    Type,
    Bedroom,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Place,
        Category::Villa,
        Category::Type,
        Category::Bedroom,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Place => "Place",
            Category::Villa => "Villa",
            Category::Type => "Type",
            Category::Bedroom => "Bedroom",
        }
    }

    /// Case-insensitive lookup by chip label
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(label))
    }

    /// Predicate and comparator applied when this category is active
    pub fn rule(self) -> &'static CategoryRule {
        &CATEGORY_RULES[self as usize]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What an active category does to the text-filtered list.
///
/// `predicate` narrows the list, `comparator` reorders it with a stable sort.
/// Either may be absent.
pub struct CategoryRule {
    pub category: Category,
    pub predicate: Option<fn(&Property) -> bool>,
    pub comparator: Option<fn(&Property, &Property) -> Ordering>,
}

/// Indexed by `Category as usize`.
pub static CATEGORY_RULES: [CategoryRule; 4] = [
    CategoryRule {
        category: Category::Place,
        predicate: None,
        comparator: Some(by_location),
    },
    CategoryRule {
        category: Category::Villa,
        predicate: Some(is_villa),
        comparator: None,
    },
    CategoryRule {
        category: Category::Type,
        predicate: None,
        comparator: Some(by_price),
    },
    CategoryRule {
        category: Category::Bedroom,
        predicate: None,
        comparator: Some(by_bedrooms_desc),
    },
];

fn is_villa(property: &Property) -> bool {
    contains_ignore_case(&property.name, "villa")
        || property
            .description
            .as_deref()
            .is_some_and(|d| contains_ignore_case(d, "villa"))
}

fn by_location(a: &Property, b: &Property) -> Ordering {
    locale_cmp(&a.location, &b.location)
}

fn by_price(a: &Property, b: &Property) -> Ordering {
    parse_price(&a.price).cmp(&parse_price(&b.price))
}

fn by_bedrooms_desc(a: &Property, b: &Property) -> Ordering {
    b.bedrooms.cmp(&a.bedrooms)
}

/// Strip every non-digit and read what is left as an integer.
///
/// "$1,200,000" -> 1200000. No digits reads as 0; a value too large for u64
/// saturates at `u64::MAX` so it still sorts as the most expensive.
pub fn parse_price(price: &str) -> u64 {
    let digits: String = price.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return 0;
    }
    digits.parse().unwrap_or(u64::MAX)
}

/// Case-insensitive substring test
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Human ordering for place names: letters compare without regard to case
/// or accents ("Éze" sits between "Austin" and "Fargo"), exact spelling
/// only breaks ties.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(collation_key(b))
        .then_with(|| a.nfc().cmp(b.nfc()))
        .then_with(|| a.cmp(b))
}

/// Base letters only: decomposed, combining marks dropped, lower-cased
fn collation_key(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}
