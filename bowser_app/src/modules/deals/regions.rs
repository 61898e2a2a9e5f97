//! Region flags for price listings.

/// Regions shown in the posted deals list, in no particular order.
pub const DEAL_REGIONS: &[&str] = &["US", "EU", "GB", "AU"];

/// Gets the flag emoji for a region code.
pub fn flag(region: &str) -> Option<&'static str> {
    Some(match region {
        "CA" => "\u{1f1e8}\u{1f1e6}",
        "MX" => "\u{1f1f2}\u{1f1fd}",
        "US" => "\u{1f1fa}\u{1f1f8}",
        "CZ" => "\u{1f1e8}\u{1f1ff}",
        "DK" => "\u{1f1e9}\u{1f1f0}",
        "EU" => "\u{1f1ea}\u{1f1fa}",
        "GB" => "\u{1f1ec}\u{1f1e7}",
        "NO" => "\u{1f1f3}\u{1f1f4}",
        "PL" => "\u{1f1f5}\u{1f1f1}",
        "RU" => "\u{1f1f7}\u{1f1fa}",
        "ZA" => "\u{1f1ff}\u{1f1e6}",
        "SE" => "\u{1f1f8}\u{1f1ea}",
        "CH" => "\u{1f1e8}\u{1f1ed}",
        "AU" => "\u{1f1e6}\u{1f1fa}",
        "NZ" => "\u{1f1f3}\u{1f1ff}",
        "JP" => "\u{1f1ef}\u{1f1f5}",
        _ => return None,
    })
}

/// Gets the flag for a region, falling back to the region code itself.
pub fn flag_or_code(region: &str) -> &str {
    flag(region).unwrap_or(region)
}

#[cfg(test)]
mod tests {
    use super::{DEAL_REGIONS, flag, flag_or_code};

    #[test]
    fn deal_regions_have_flags() {
        for region in DEAL_REGIONS {
            assert!(flag(region).is_some(), "missing flag for {region}");
        }
    }

    #[test]
    fn unknown_region_uses_code() {
        assert_eq!(flag_or_code("US"), "🇺🇸");
        assert_eq!(flag_or_code("KR"), "KR");
    }
}
