use std::sync::OnceLock;

use regex::Regex;
use valet_core::Plate;

static PLATE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn plate_regex() -> &'static Regex {
    PLATE_PATTERN.get_or_init(|| {
        // Province prefix + issuing-office letter + 5 (standard) or 6
        // (new-energy) alphanumerics. I and O are never issued.
        Regex::new(
            "[京津沪渝冀豫云辽黑湘皖鲁新苏浙赣鄂桂甘晋蒙陕吉闽贵粤青藏川宁琼][A-HJ-NP-Z][A-HJ-NP-Z0-9]{5,6}",
        )
        .expect("plate pattern is valid")
    })
}

/// Pulls the first license plate out of free text, if any.
pub fn extract_plate(text: &str) -> Option<Plate> {
    plate_regex().find(text).map(|found| Plate::new(found.as_str()))
}
