use chrono::{DateTime, Utc};

#[cfg(test)]
thread_local! {
    /// unix seconds the current test thread is pinned to
    static PINNED_NOW: std::cell::Cell<Option<i64>> = const { std::cell::Cell::new(None) };
}

/// Wall clock used for receipt timestamps.
pub(crate) fn get_utc_now() -> DateTime<Utc> {
    #[cfg(test)]
    if let Some(now) = PINNED_NOW
        .with(|pinned| pinned.get())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
    {
        return now;
    }
    Utc::now()
}

/// Pin [`get_utc_now`] on the current test thread.
#[cfg(test)]
pub(crate) fn pin_now(secs: i64) {
    PINNED_NOW.with(|pinned| pinned.set(Some(secs)));
}
