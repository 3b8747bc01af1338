//! Display masking for API-key secrets.

/// Number of characters left visible at each end of a masked key.
pub const MASK_VISIBLE_CHARS: usize = 4;

/// Filler placed between the visible prefix and suffix.
pub const MASK_FILL: &str = "********";

/// Masks an API key for display.
///
/// Keys of 8 characters or fewer are returned unchanged. Longer keys keep
/// their first and last four characters with eight asterisks in between,
/// e.g. `ptk_********abcd`. Counts characters, not bytes.
pub fn mask_api_key(key: &str) -> String {
    let len = key.chars().count();
    if len <= MASK_VISIBLE_CHARS * 2 {
        return key.to_string();
    }

    let start: String = key.chars().take(MASK_VISIBLE_CHARS).collect();
    let end: String = key.chars().skip(len - MASK_VISIBLE_CHARS).collect();

    format!("{start}{MASK_FILL}{end}")
}
