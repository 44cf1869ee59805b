use crate::types::ItemId;

// ---------------------------------------------------------------------------
// Content-store key layout
// ---------------------------------------------------------------------------

pub const INDEX_FILE: &str = "index.html";
pub const HOMEPAGE_KEY: &str = INDEX_FILE;
pub const HTML_CONTENT_TYPE: &str = "text/html";

/// Href from an item page back to the homepage.
pub const HOMEPAGE_FROM_ITEM: &str = "../index.html";

pub fn item_prefix(item: &ItemId) -> String {
    format!("{item}/")
}

pub fn item_page_key(item: &ItemId) -> String {
    format!("{item}/{INDEX_FILE}")
}

/// Join a base URL and a key without doubling or dropping the separator.
pub fn url_for(base_url: &str, key: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        key.trim_start_matches('/')
    )
}
