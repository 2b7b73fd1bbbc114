use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Runs of characters that are not allowed inside a slug
    /// - "Old Newspaper" -> "old-newspaper"
    /// - "E--Waste!!" -> "e-waste-"
    pub static ref NON_SLUG_RUN_REGEX: Regex = Regex::new(r"[^a-z0-9]+").unwrap();

    /// Phone numbers with optional leading plus and 10-15 digits
    /// - Valid: "+919876543210", "9876543210"
    /// - Invalid: "98765", "+91 98765 43210", "phone"
    pub static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9]{10,15}$").unwrap();

    /// Hex colour in #RRGGBB form
    pub static ref HEX_COLOR_REGEX: Regex = Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_regex() {
        assert!(PHONE_REGEX.is_match("+919876543210"));
        assert!(PHONE_REGEX.is_match("9876543210"));
        assert!(!PHONE_REGEX.is_match("98765"));
        assert!(!PHONE_REGEX.is_match("+91 98765 43210"));
        assert!(!PHONE_REGEX.is_match("phone"));
    }

    #[test]
    fn test_hex_color_regex() {
        assert!(HEX_COLOR_REGEX.is_match("#10B981"));
        assert!(HEX_COLOR_REGEX.is_match("#f59e0b"));
        assert!(!HEX_COLOR_REGEX.is_match("10B981"));
        assert!(!HEX_COLOR_REGEX.is_match("#FFF"));
    }
}
