//! Filename slug rule for exported slide decks (spec §4.6).

use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALPHANUMERIC_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

const MAX_LEN: usize = 60;

/// Lowercases, replaces runs of non-alphanumerics with a single `-`, trims
/// leading/trailing `-`, clamps to 60 chars, defaults to `playlist` when
/// the result would be empty.
pub fn slugify(input: &str) -> String {
    let lowercase = input.to_lowercase();
    let collapsed = NON_ALPHANUMERIC_RUN.replace_all(&lowercase, "-");
    let trimmed = collapsed.trim_matches('-');
    let clamped: String = trimmed.chars().take(MAX_LEN).collect();
    let clamped = clamped.trim_end_matches('-');

    if clamped.is_empty() { "playlist".to_string() } else { clamped.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugifies_typical_playlist_name() {
        assert_eq!(slugify("Sunday Morning Worship!"), "sunday-morning-worship");
    }

    #[test]
    fn collapses_runs_and_trims_edges() {
        assert_eq!(slugify("  ***Hello___World***  "), "hello-world");
    }

    #[test]
    fn empty_input_defaults_to_playlist() {
        assert_eq!(slugify(""), "playlist");
        assert_eq!(slugify("!!!"), "playlist");
    }

    #[test]
    fn clamps_to_sixty_chars() {
        let long = "a".repeat(100);
        assert_eq!(slugify(&long).len(), 60);
    }
}
