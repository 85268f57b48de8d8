use crate::models::{Booking, BookingStatus};
use chrono::NaiveDate;
use tracing::info;

/// Viewings shown on the bookings tab. The backend has no bookings
/// endpoint, so the screen ships with these.
pub fn sample_bookings() -> Vec<Booking> {
    info!("📋 Using sample bookings");

    vec![
        Booking {
            id: 1,
            title: "Modern Loft".to_string(),
            location: "Downtown, NY".to_string(),
            date: date(2026, 2, 12),
            status: BookingStatus::Upcoming,
            image: "https://images.unsplash.com/photo-1502672260266-1c1ef2d93688?q=80&w=300&auto=format&fit=crop".to_string(),
        },
        Booking {
            id: 2,
            title: "Cozy Apartment".to_string(),
            location: "Brooklyn, NY".to_string(),
            date: date(2026, 1, 28),
            status: BookingStatus::Completed,
            image: "https://images.unsplash.com/photo-1522708323590-d24dbb6b0267?q=80&w=300&auto=format&fit=crop".to_string(),
        },
    ]
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

/// Bookings tab contents: upcoming first, then completed, each by date
#[derive(Debug, Clone, Default)]
pub struct BookingsScreen {
    bookings: Vec<Booking>,
}

impl BookingsScreen {
    pub fn new(mut bookings: Vec<Booking>) -> Self {
        bookings.sort_by(|a, b| a.status.cmp(&b.status).then(a.date.cmp(&b.date)));
        Self { bookings }
    }

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }

    pub fn empty_message(&self) -> Option<&'static str> {
        self.is_empty()
            .then_some("No Bookings Yet. When you book a property, it will show up here.")
    }
}

/// Day and upper-case month as shown on the booking card, e.g. ("12", "FEB")
pub fn card_date(date: NaiveDate) -> (String, String) {
    (
        date.format("%-d").to_string(),
        date.format("%b").to_string().to_uppercase(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upcoming_listed_first() {
        let screen = BookingsScreen::new(sample_bookings());
        let statuses: Vec<_> = screen.bookings().iter().map(|b| b.status).collect();
        assert_eq!(statuses, vec![BookingStatus::Upcoming, BookingStatus::Completed]);
        assert!(screen.empty_message().is_none());
    }

    #[test]
    fn test_same_status_sorted_by_date() {
        let mut bookings = sample_bookings();
        bookings[1].status = BookingStatus::Upcoming;
        let screen = BookingsScreen::new(bookings);
        assert_eq!(screen.bookings()[0].title, "Cozy Apartment");
    }

    #[test]
    fn test_empty_screen() {
        let screen = BookingsScreen::new(Vec::new());
        assert!(screen.empty_message().unwrap().starts_with("No Bookings Yet"));
    }

    #[test]
    fn test_card_date() {
        assert_eq!(
            card_date(date(2026, 2, 12)),
            ("12".to_string(), "FEB".to_string())
        );
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&BookingStatus::Upcoming).unwrap(),
            "\"upcoming\""
        );
    }
}
