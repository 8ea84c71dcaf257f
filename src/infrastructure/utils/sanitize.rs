use ammonia::{Builder, UrlRelative};

/// Strips scripts, event handlers and other unsafe markup from a
/// visitor-supplied testimony statement.
pub fn sanitize_statement(content: &str) -> String {
    Builder::default()
        .link_rel(Some("nofollow noopener noreferrer"))
        .url_relative(UrlRelative::Deny)
        .clean(content)
        .to_string()
}
