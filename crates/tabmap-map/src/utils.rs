//! Header normalization shared by matching and dismissal lookups.

/// Canonical comparison key: lower-case ASCII letters and digits only.
///
/// `Total Distance`, `total_distance` and `TOTAL-DISTANCE` all become
/// `totaldistance`.
pub fn normalize(header: &str) -> String {
    header
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosmetic_variants_collapse() {
        assert_eq!(normalize("Total Distance"), "totaldistance");
        assert_eq!(normalize("total_distance"), "totaldistance");
        assert_eq!(normalize("TOTAL-DISTANCE"), "totaldistance");
        assert_eq!(normalize("HR (bpm)"), "hrbpm");
    }

    #[test]
    fn non_ascii_is_dropped() {
        assert_eq!(normalize("Velocità Max"), "velocitmax");
        assert_eq!(normalize("  "), "");
    }
}
