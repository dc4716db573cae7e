//! Id and clock providers.
//!
//! The engine never reaches for a global generator or the wall clock
//! directly; both are injected through the request options so that tests
//! can pin them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;

/// Produces unique ids.
pub type IdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Produces the current time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Build a generator of `{prefix}-{size random alphanumerics}` ids.
pub fn create_id_generator(prefix: impl Into<String>, size: usize) -> IdGenerator {
    let prefix = prefix.into();
    Arc::new(move || {
        let random: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(size)
            .map(char::from)
            .collect();
        format!("{prefix}-{random}")
    })
}

/// Clock backed by `Utc::now`.
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Generator that always returns the same id.
pub fn fixed_id(id: impl Into<String>) -> IdGenerator {
    let id = id.into();
    Arc::new(move || id.clone())
}

/// Clock frozen at `at`.
pub fn fixed_clock(at: DateTime<Utc>) -> Clock {
    Arc::new(move || at)
}
