//! Field names shared by the scraper, the lookups, and the statistics.

/// Calendar date of a meet or performance (`YYYY-MM-DD`).
pub const DATE: &str = "date";
/// Track name of a meet.
pub const TRACK: &str = "track";
/// Display name of a race, horse, jockey, or trainer.
pub const NAME: &str = "name";
/// Race or runner number.
pub const NUMBER: &str = "number";
/// Canonical source URL of a horse, jockey, or trainer.
pub const URL: &str = "url";
/// Back-reference from a race to its meet.
pub const MEET_ID: &str = "meet_id";
/// Back-reference from a runner to its race.
pub const RACE_ID: &str = "race_id";
/// Scheduled start of a race (RFC 3339, UTC).
pub const START_TIME: &str = "start_time";
/// URL of the horse a runner or performance refers to.
pub const HORSE_URL: &str = "horse_url";
/// URL of the jockey a runner or performance refers to.
pub const JOCKEY_URL: &str = "jockey_url";
/// URL of the trainer a runner refers to.
pub const TRAINER_URL: &str = "trainer_url";
/// Finishing position of a performance.
pub const RESULT: &str = "result";
/// Field size of a performance.
pub const STARTERS: &str = "starters";
/// Starting price of a performance.
pub const STARTING_PRICE: &str = "starting_price";
/// Prize money earned by the runner in a performance.
pub const RUNNER_PRIZE_MONEY: &str = "runner_prize_money";
