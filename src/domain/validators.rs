use once_cell::sync::Lazy;
use regex::Regex;
use validator::{ValidationError, ValidationErrors};

use crate::errors::new_validation_error;

pub const MAX_SLUG_LENGTH: usize = 50;

static SLUG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-a-zA-Z0-9_]+$").expect("slug pattern is a valid regex")
});

pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug.is_empty() {
        return Err(new_validation_error("slug_empty", "Slug cannot be empty"));
    }
    if slug.chars().count() > MAX_SLUG_LENGTH {
        return Err(new_validation_error("slug_too_long", "Slug must be at most 50 characters"));
    }
    if !SLUG_PATTERN.is_match(slug) {
        return Err(new_validation_error(
            "slug_invalid_chars",
            "Slug must contain only letters, digits, underscores or hyphens",
        ));
    }
    Ok(())
}

pub fn validate_url(url: &str) -> Result<(), ValidationError> {
    match url::Url::parse(url) {
        Ok(parsed) => {
            if parsed.scheme() == "http" || parsed.scheme() == "https" {
                Ok(())
            } else {
                Err(new_validation_error("invalid_url_scheme", "URL must start with http:// or https://"))
            }
        }
        Err(_) => Err(new_validation_error("invalid_url", "Invalid URL format")),
    }
}

/// Rejects text made only of whitespace; `length(min = 1)` lets it through.
pub fn validate_not_blank(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(new_validation_error("blank", "Value cannot be blank"));
    }
    Ok(())
}

/// Uses the explicit slug when given, otherwise slugifies `name`.
pub fn resolve_slug(slug: Option<&str>, name: &str) -> Result<String, ValidationErrors> {
    match slug {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => {
            let generated: String = slug::slugify(name).chars().take(MAX_SLUG_LENGTH).collect();
            let generated = generated.trim_end_matches('-').to_string();
            if generated.is_empty() {
                let mut errors = ValidationErrors::new();
                errors.add(
                    "slug",
                    new_validation_error("slug_empty", "Could not derive a slug from the name; please provide one"),
                );
                return Err(errors);
            }
            Ok(generated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_url_safe_slugs() {
        assert!(validate_slug("rust-cli_tools2").is_ok());
        assert!(validate_slug("Web").is_ok());
    }

    #[test]
    fn rejects_bad_slugs() {
        assert!(validate_slug("").is_err());
        assert!(validate_slug("has space").is_err());
        assert!(validate_slug("ünïcode").is_err());
        assert!(validate_slug(&"a".repeat(51)).is_err());
    }

    #[test]
    fn url_requires_http_scheme() {
        assert!(validate_url("https://example.com").is_ok());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("not a url").is_err());
    }

    #[test]
    fn slug_is_derived_from_name_when_missing() {
        assert_eq!(resolve_slug(None, "Web Development").unwrap(), "web-development");
        assert_eq!(resolve_slug(Some("  "), "Games").unwrap(), "games");
        assert_eq!(resolve_slug(Some("custom"), "Games").unwrap(), "custom");
    }

    #[test]
    fn derived_slug_is_truncated() {
        let slug = resolve_slug(None, &"word ".repeat(30)).unwrap();
        assert!(slug.len() <= MAX_SLUG_LENGTH);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn underivable_slug_is_an_error() {
        assert!(resolve_slug(None, "!!!").is_err());
    }
}
