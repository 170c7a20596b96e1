//! Stream name cleanup
//!
//! Upstream channel names carry regional prefix tokens ("LA: ", "CLARO| ",
//! ...) that mean nothing to gateway users. The sanitizer strips them with
//! an ordered pattern list; order matters because the generic "| " pattern
//! must run after the provider-specific ones.

use regex::Regex;

/// Prefix patterns removed from display names, applied in declared order
const NAME_PATTERNS: &[&str] = &[
    r"OL\| US LATIN ",
    r"LA: ",
    r"MX\| ",
    r"MXC: ",
    r"LATINO \| ",
    r"US\| \(LATIN\) ",
    r"LATIN ",
    r"LATIN  ",
    r"CLARO\| ",
    r"ARG\| ",
    r"PE\| ",
    r"US\| ",
    r"UY\| ",
    r"\| ",
];

pub struct NameSanitizer {
    patterns: Vec<Regex>,
}

impl NameSanitizer {
    pub fn new() -> Self {
        let patterns = NAME_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("invalid name pattern"))
            .collect();

        Self { patterns }
    }

    /// Strip every known prefix token and trim the result. Already-clean
    /// names pass through unchanged.
    pub fn clean(&self, name: &str) -> String {
        let mut cleaned = name.to_string();
        for pattern in &self.patterns {
            cleaned = pattern.replace_all(&cleaned, "").into_owned();
        }
        cleaned.trim().to_string()
    }
}

impl Default for NameSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_regional_prefixes() {
        let sanitizer = NameSanitizer::new();
        assert_eq!(sanitizer.clean("LA: Canal Deportivo"), "Canal Deportivo");
        assert_eq!(sanitizer.clean("CLARO| ESPN"), "ESPN");
        assert_eq!(sanitizer.clean("MX| Las Estrellas"), "Las Estrellas");
    }

    #[test]
    fn test_idempotent_on_clean_names() {
        let sanitizer = NameSanitizer::new();
        let once = sanitizer.clean("CLARO| ESPN");
        assert_eq!(sanitizer.clean(&once), once);
        assert_eq!(sanitizer.clean("Canal Deportivo"), "Canal Deportivo");
    }

    #[test]
    fn test_trims_whitespace() {
        let sanitizer = NameSanitizer::new();
        assert_eq!(sanitizer.clean("  ESPN HD  "), "ESPN HD");
    }
}
