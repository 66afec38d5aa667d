//! Invite link builder.
//!
//! Produces the trackable link sent to a guest: the identifying token goes into the
//! `emailconf` query parameter and the referrer into `utm_source`.

use url::{form_urlencoded, Url};

/// Query parameter carrying the guest's identifying token
pub const TOKEN_PARAM: &str = "emailconf";

/// Query parameter carrying the attribution tag
pub const REFERRER_PARAM: &str = "utm_source";

/// Builds invite links against a configured base URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InviteLinkBuilder {
    base_url: String,
}

impl InviteLinkBuilder {
    /// Creates a builder for `base_url`
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// The configured base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the invite link for `token`, tagged with `referrer` when given.
    ///
    /// `base_override` replaces the configured base URL for this call only.
    #[must_use]
    pub fn build(&self, token: &str, referrer: Option<&str>, base_override: Option<&str>) -> String {
        build_invite_url(token, referrer, base_override.unwrap_or(&self.base_url))
    }
}

/// Appends the token and referrer query parameters to `base_url`.
///
/// Existing query parameters are kept. If `base_url` does not parse as an absolute URL
/// the parameters are concatenated onto it as-is.
#[must_use]
pub fn build_invite_url(token: &str, referrer: Option<&str>, base_url: &str) -> String {
    let mut query = format!("{TOKEN_PARAM}={}", encode(token.trim()));
    if let Some(referrer) = referrer.map(str::trim).filter(|r| !r.is_empty()) {
        query.push('&');
        query.push_str(REFERRER_PARAM);
        query.push('=');
        query.push_str(&encode(referrer));
    }

    match Url::parse(base_url) {
        Ok(mut url) => {
            let combined = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{existing}&{query}"),
                _ => query,
            };
            url.set_query(Some(&combined));
            url.into()
        }
        Err(_) => {
            let separator = if base_url.contains('?') { '&' } else { '?' };
            format!("{base_url}{separator}{query}")
        }
    }
}

// Form-encodes a value but keeps `@` literal so email tokens stay readable.
fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace("%40", "@")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_and_referrer_are_appended() {
        let url = build_invite_url("ana@x.com", Some("Bruno"), "http://localhost:3000/confirmar");
        assert_eq!(
            url,
            "http://localhost:3000/confirmar?emailconf=ana@x.com&utm_source=Bruno"
        );
    }

    #[test]
    fn test_missing_referrer_is_omitted() {
        let url = build_invite_url("ana@x.com", Some("  "), "https://evento.example.com/");
        assert_eq!(url, "https://evento.example.com/?emailconf=ana@x.com");
    }

    #[test]
    fn test_existing_query_is_preserved() {
        let url = build_invite_url("ana@x.com", Some("Bruno"), "https://evento.example.com/c?lang=pt");
        assert_eq!(
            url,
            "https://evento.example.com/c?lang=pt&emailconf=ana@x.com&utm_source=Bruno"
        );
    }

    #[test]
    fn test_reserved_characters_are_encoded() {
        let url = build_invite_url("a+b@x.com", Some("Bruno Lima&Co"), "https://e.example.com/c");
        assert!(url.contains("emailconf=a%2Bb@x.com"));
        assert!(url.contains("utm_source=Bruno+Lima%26Co"));
    }

    #[test]
    fn test_unparseable_base_falls_back_to_concatenation() {
        assert_eq!(
            build_invite_url("ana@x.com", Some("Bruno"), "/confirmar"),
            "/confirmar?emailconf=ana@x.com&utm_source=Bruno"
        );
        assert_eq!(
            build_invite_url("ana@x.com", None, "confirmar?x=1"),
            "confirmar?x=1&emailconf=ana@x.com"
        );
    }

    #[test]
    fn test_builder_override() {
        let builder = InviteLinkBuilder::new("https://a.example.com/");
        assert!(builder.build("t", None, None).starts_with("https://a.example.com/?"));
        assert!(
            builder
                .build("t", None, Some("https://b.example.com/"))
                .starts_with("https://b.example.com/?")
        );
    }
}
