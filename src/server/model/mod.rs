pub(crate) mod cart;
pub(crate) mod config;
pub(crate) mod inventory;
pub(crate) mod receipt;

pub(crate) const DEFAULT_PAGE_LIMIT: i64 = 20;
pub(crate) const MAX_PAGE_LIMIT: i64 = 100;

/// Clamp caller supplied paging into a sane `(offset, limit)`.
pub(crate) fn page_bounds(offset: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    (
        offset.unwrap_or(0).max(0),
        limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
    )
}
