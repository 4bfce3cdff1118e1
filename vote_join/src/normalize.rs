use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonical form of a name, for comparisons between datasets that do not
/// agree on accents, case or punctuation.
///
/// ```
/// use vote_join::normalize::normalize_name;
///
/// assert_eq!(normalize_name("  Cañaveral "), "CANAVERAL");
/// assert_eq!(normalize_name("Área  de-Expansión"), "AREA DE EXPANSION");
/// ```
pub fn normalize_name(raw: &str) -> String {
    // Upper-casing first: some upper-case forms decompose further.
    let upper = raw.to_uppercase();
    let folded: String = upper
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    folded.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// The join key of an identifier: the normalized name, in which purely
/// numeric identifiers also lose their leading zeros.
///
/// ```
/// use vote_join::normalize::normalize_key;
///
/// assert_eq!(normalize_key("007"), normalize_key("7"));
/// assert_eq!(normalize_key("000"), "0");
/// ```
pub fn normalize_key(raw: &str) -> String {
    let name = normalize_name(raw);
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()) {
        let stripped = name.trim_start_matches('0');
        if stripped.is_empty() {
            "0".to_string()
        } else {
            stripped.to_string()
        }
    } else {
        name
    }
}

pub fn normalize_opt(raw: Option<&str>) -> String {
    raw.map(normalize_key).unwrap_or_default()
}
