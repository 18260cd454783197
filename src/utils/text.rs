//! Message formatting helpers.

/// Uppercases the first character of `text`.
///
/// # Examples
///
/// ```
/// use undercrawl::capitalize;
///
/// assert_eq!(capitalize("cave orc"), "Cave orc");
/// assert_eq!(capitalize(""), "");
/// ```
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize_keeps_rest() {
        assert_eq!(capitalize("remains of rat"), "Remains of rat");
        assert_eq!(capitalize("Player"), "Player");
        assert_eq!(capitalize("ñu"), "Ñu");
    }
}
