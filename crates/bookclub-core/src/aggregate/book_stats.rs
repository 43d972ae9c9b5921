//! Per-book statistics row.

use serde::Serialize;

use crate::model::{Id, Opinion, ReadingStatus, Review, UserBookListing};

/// Counters summarizing the listings and reviews of one book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BookStats {
    pub book_id: Id,
    /// Listings with status `pending`.
    pub pending: u64,
    /// Listings with status `reading`.
    pub reading: u64,
    /// Listings with status `complete`.
    pub completed: u64,
    pub liked: u64,
    pub disliked: u64,
    /// All listings for the book, whatever their status.
    pub listings: u64,
    pub reviews: u64,
    /// Sum of `stars` across all reviews.
    pub stars_total: u64,
}

fn adjust(counter: &mut u64, add: bool) {
    if add {
        *counter += 1;
    } else {
        *counter = counter.saturating_sub(1);
    }
}

impl BookStats {
    pub fn new(book_id: Id) -> Self {
        Self {
            book_id,
            ..Default::default()
        }
    }

    /// Average stars in hundredths, rounded half up. None without reviews.
    pub fn rating_hundredths(&self) -> Option<u64> {
        if self.reviews == 0 {
            return None;
        }
        Some((self.stars_total * 200 + self.reviews) / (2 * self.reviews))
    }

    /// Average stars rounded to two decimals.
    pub fn rating(&self) -> Option<f64> {
        self.rating_hundredths().map(|h| h as f64 / 100.0)
    }

    /// Ordering key of the top-activity view.
    pub fn activity(&self) -> u64 {
        self.pending + self.reading + self.completed
    }

    pub(crate) fn apply_listing(&mut self, listing: &UserBookListing, add: bool) {
        adjust(&mut self.listings, add);
        match listing.reading_status {
            Some(ReadingStatus::Pending) => adjust(&mut self.pending, add),
            Some(ReadingStatus::Reading) => adjust(&mut self.reading, add),
            Some(ReadingStatus::Complete) => adjust(&mut self.completed, add),
            None => {}
        }
        match listing.liked {
            Some(Opinion::Liked) => adjust(&mut self.liked, add),
            Some(Opinion::Disliked) => adjust(&mut self.disliked, add),
            None => {}
        }
    }

    pub(crate) fn apply_review(&mut self, review: &Review, add: bool) {
        adjust(&mut self.reviews, add);
        let stars = u64::from(review.stars);
        if add {
            self.stars_total += stars;
        } else {
            self.stars_total = self.stars_total.saturating_sub(stars);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_reviews(stars: &[u8]) -> BookStats {
        let mut stats = BookStats::new(1);
        for &s in stars {
            stats.apply_review(&Review::new(None, 1, s, "t"), true);
        }
        stats
    }

    #[test]
    fn test_rating_mean() {
        let stats = with_reviews(&[2, 4, 6, 4, 4]);
        assert_eq!(stats.rating_hundredths(), Some(400));
        assert_eq!(stats.rating(), Some(4.0));
    }

    #[test]
    fn test_rating_rounds_half_up() {
        // 10 / 3 = 3.333..
        assert_eq!(with_reviews(&[3, 3, 4]).rating_hundredths(), Some(333));
        // 17 / 3 = 5.666..
        assert_eq!(with_reviews(&[5, 6, 6]).rating_hundredths(), Some(567));
        // 1 / 8 = 0.125
        assert_eq!(with_reviews(&[1, 0, 0, 0, 0, 0, 0, 0]).rating_hundredths(), Some(13));
    }

    #[test]
    fn test_no_reviews_no_rating() {
        let stats = BookStats::new(1);
        assert_eq!(stats.rating(), None);
    }

    #[test]
    fn test_remove_review() {
        let mut stats = with_reviews(&[8, 2]);
        stats.apply_review(&Review::new(None, 1, 8, "t"), false);
        assert_eq!(stats.reviews, 1);
        assert_eq!(stats.rating_hundredths(), Some(200));
    }

    #[test]
    fn test_listing_transitions() {
        let mut stats = BookStats::new(1);
        let before = UserBookListing::new(1, 1).with_status(ReadingStatus::Reading);
        let after = UserBookListing::new(1, 1)
            .with_status(ReadingStatus::Complete)
            .with_opinion(Opinion::Liked);

        stats.apply_listing(&before, true);
        assert_eq!((stats.reading, stats.listings), (1, 1));

        stats.apply_listing(&before, false);
        stats.apply_listing(&after, true);
        assert_eq!(stats.reading, 0);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.liked, 1);
        assert_eq!(stats.listings, 1);
        assert_eq!(stats.activity(), 1);
    }
}
