//! The contract for the remote source of racing data.

use chrono::NaiveDate;

use crate::document::Document;
use crate::entity::Entity;
use crate::errors::ScrapeError;
use crate::kinds::{Meet, Race};

/// Fetches raw records from the remote source.
///
/// Every method returns fresh, unpersisted documents. Scrapers are shared
/// by all worker threads and must not retry on their own.
pub trait Scraper: Send + Sync {
    /// Meets held on `date`.
    fn scrape_meets(&self, date: NaiveDate) -> Result<Vec<Document>, ScrapeError>;

    /// Races of a persisted meet.
    fn scrape_races(&self, meet: &Entity<Meet>) -> Result<Vec<Document>, ScrapeError>;

    /// Runners of a persisted race.
    fn scrape_runners(&self, race: &Entity<Race>) -> Result<Vec<Document>, ScrapeError>;

    /// The horse profile at `url`.
    fn scrape_horse(&self, url: &str) -> Result<Option<Document>, ScrapeError>;

    /// The jockey profile at `url`.
    fn scrape_jockey(&self, url: &str) -> Result<Option<Document>, ScrapeError>;

    /// The trainer profile at `url`.
    fn scrape_trainer(&self, url: &str) -> Result<Option<Document>, ScrapeError>;

    /// Past performances of the horse at `horse_url`.
    fn scrape_performances(&self, horse_url: &str) -> Result<Vec<Document>, ScrapeError>;
}

/// A scraper with no remote source, for store-only work.
///
/// Every call fails with [`ScrapeError::Unavailable`], so lookups succeed
/// only for data already cached.
#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineScraper;

impl OfflineScraper {
    fn unavailable<T>(what: &str) -> Result<T, ScrapeError> {
        Err(ScrapeError::Unavailable(format!("offline: cannot scrape {what}")))
    }
}

impl Scraper for OfflineScraper {
    fn scrape_meets(&self, date: NaiveDate) -> Result<Vec<Document>, ScrapeError> {
        Self::unavailable(&format!("meets for {date}"))
    }

    fn scrape_races(&self, meet: &Entity<Meet>) -> Result<Vec<Document>, ScrapeError> {
        Self::unavailable(&format!("races of {meet}"))
    }

    fn scrape_runners(&self, race: &Entity<Race>) -> Result<Vec<Document>, ScrapeError> {
        Self::unavailable(&format!("runners of {race}"))
    }

    fn scrape_horse(&self, url: &str) -> Result<Option<Document>, ScrapeError> {
        Self::unavailable(url)
    }

    fn scrape_jockey(&self, url: &str) -> Result<Option<Document>, ScrapeError> {
        Self::unavailable(url)
    }

    fn scrape_trainer(&self, url: &str) -> Result<Option<Document>, ScrapeError> {
        Self::unavailable(url)
    }

    fn scrape_performances(&self, horse_url: &str) -> Result<Vec<Document>, ScrapeError> {
        Self::unavailable(horse_url)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn offline_scraper_is_unavailable() {
        let scraper = OfflineScraper;
        let date = NaiveDate::from_ymd_opt(2016, 2, 1).unwrap();
        assert_matches!(scraper.scrape_meets(date), Err(ScrapeError::Unavailable(msg)) if msg.contains("2016-02-01"));
        assert_matches!(scraper.scrape_horse("/horses/1"), Err(ScrapeError::Unavailable(_)));
    }

    #[test]
    fn scraper_is_object_safe() {
        let scraper: Box<dyn Scraper> = Box::new(OfflineScraper);
        assert!(scraper.scrape_performances("/horses/1").is_err());
    }
}
