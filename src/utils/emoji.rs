//! Country flag glyphs

/// Glyph used when a country code cannot be turned into a flag.
pub const FALLBACK_FLAG: &str = "🌍";

/// First regional indicator symbol, paired with `'A'`.
const REGIONAL_INDICATOR_A: u32 = 0x1F1E6;

/// Converts a two-letter country code into its flag emoji.
///
/// The code is matched case-insensitively. Anything that is not exactly
/// two ASCII letters yields [`FALLBACK_FLAG`].
///
/// # Examples
/// ```
/// use linkforge::utils::emoji::country_code_to_emoji;
///
/// assert_eq!(country_code_to_emoji("jp"), "🇯🇵");
/// assert_eq!(country_code_to_emoji("J1"), "🌍");
/// ```
pub fn country_code_to_emoji(code: &str) -> String {
    let code = code.trim();
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return FALLBACK_FLAG.to_string();
    }

    code.to_ascii_uppercase()
        .chars()
        .filter_map(|c| char::from_u32(REGIONAL_INDICATOR_A + (c as u32 - 'A' as u32)))
        .collect()
}
