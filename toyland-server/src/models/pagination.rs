//! Fixed query sizes and page arithmetic

/// Toys returned by the recent listing.
pub const RECENT_LIMIT: i64 = 20;

/// Toys returned by a name search.
pub const SEARCH_LIMIT: i64 = 20;

/// Toys per subcategory page.
pub const PAGE_SIZE: i64 = 4;

/// Parse a page path segment.
///
/// Reads an integer prefix: leading whitespace, an optional sign, then
/// digits. Anything after the digits is ignored. No digits, or a value of
/// zero, means page 1. Negative pages are kept.
pub fn parse_page(raw: &str) -> i64 {
    let rest = raw.trim_start();
    let (negative, digits) = match rest.as_bytes().first() {
        Some(b'-') => (true, &rest[1..]),
        Some(b'+') => (false, &rest[1..]),
        _ => (false, rest),
    };

    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0_i64, |acc, d| {
            acc.saturating_mul(10).saturating_add(i64::from(d - b'0'))
        });

    match (negative, magnitude) {
        (_, 0) => 1,
        (true, n) => -n,
        (false, n) => n,
    }
}

/// Documents to skip to reach `page`. Pages below 1 give a negative skip.
pub fn page_skip(page: i64) -> i64 {
    page.saturating_sub(1).saturating_mul(PAGE_SIZE)
}
