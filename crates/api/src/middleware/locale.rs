//! Request locale extraction.

use axum::{extract::FromRequestParts, http::request::Parts};

use nixe_core::Locale;

/// The locale requested via `?locale=fr|en`, defaulting to French.
///
/// Unrecognized values fall back to the default rather than erroring; the
/// storefront always gets a response in some language.
pub struct ClientLocale(pub Locale);

impl<S> FromRequestParts<S> for ClientLocale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let locale = parts
            .uri
            .query()
            .and_then(|query| {
                query
                    .split('&')
                    .find_map(|pair| pair.strip_prefix("locale="))
            })
            .and_then(|value| value.parse::<Locale>().ok())
            .unwrap_or_default();

        Ok(Self(locale))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    async fn extract(uri: &str) -> Locale {
        let request = Request::builder()
            .uri(uri)
            .body(())
            .expect("valid request");
        let (mut parts, ()) = request.into_parts();
        let ClientLocale(locale) = ClientLocale::from_request_parts(&mut parts, &())
            .await
            .expect("infallible");
        locale
    }

    #[tokio::test]
    async fn test_locale_from_query() {
        assert_eq!(extract("/api/products?locale=en").await, Locale::En);
        assert_eq!(extract("/api/products?locale=fr").await, Locale::Fr);
    }

    #[tokio::test]
    async fn test_locale_defaults_to_french() {
        assert_eq!(extract("/api/products").await, Locale::Fr);
        assert_eq!(extract("/api/products?locale=de").await, Locale::Fr);
    }
}
