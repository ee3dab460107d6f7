//! URL slug derivation.

/// Derive a URL-friendly slug from a display name.
///
/// Lowercases, replaces whitespace runs with a single hyphen, then strips
/// everything that is not alphanumeric, underscore or hyphen. Used for
/// categories and products when no slug is provided.
///
/// # Example
///
/// ```
/// use nixe_core::slugify;
///
/// assert_eq!(slugify("Planche de Surf 7'2\""), "planche-de-surf-72");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_whitespace = false;

    for c in name.to_lowercase().chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
                in_whitespace = true;
            }
            continue;
        }
        in_whitespace = false;
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            slug.push(c);
        }
        // Anything else (accents, punctuation) is dropped.
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic() {
        assert_eq!(slugify("Wetsuits"), "wetsuits");
        assert_eq!(slugify("Boards & Fins"), "boards--fins");
    }

    #[test]
    fn test_whitespace_runs_collapse() {
        assert_eq!(slugify("Second   Hand"), "second-hand");
    }

    #[test]
    fn test_punctuation_dropped() {
        assert_eq!(slugify("Leash 6' (premium)"), "leash-6-premium");
    }
}
