//! Authentication header providers.
//!
//! Grounded on `llm/openai/src/lib.rs`'s constructors, each of which builds
//! a fixed `HeaderMap` once (CONTENT_TYPE/ACCEPT/AUTHORIZATION) and reuses
//! it for every request, and on `app/gateway/src/auth.rs`'s `Authenticator`
//! trait shape (return-position `impl Trait`, no boxed dyn future — there's
//! no async work here, so a plain trait method is enough).

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::sync::Arc;

/// A source of authentication headers for outbound requests.
pub trait AuthProvider: Send + Sync {
    /// Apply this provider's headers to an outbound request's header map.
    fn apply(&self, headers: &mut HeaderMap);
}

/// No authentication — the default for a local, unauthenticated server.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl AuthProvider for NoAuth {
    fn apply(&self, _headers: &mut HeaderMap) {}
}

/// HTTP Basic authentication.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    header_value: HeaderValue,
}

impl BasicAuth {
    /// Build a Basic auth provider from a username and password.
    pub fn new(username: impl AsRef<str>, password: impl AsRef<str>) -> Self {
        use base64::Engine;
        let credentials = format!("{}:{}", username.as_ref(), password.as_ref());
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        let mut header_value = HeaderValue::from_str(&format!("Basic {encoded}"))
            .expect("base64-encoded Basic auth header is always valid ASCII");
        header_value.set_sensitive(true);
        BasicAuth { header_value }
    }
}

impl AuthProvider for BasicAuth {
    fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(AUTHORIZATION, self.header_value.clone());
    }
}

/// Which header a [`BearerAuth`] token is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenHeader {
    /// `Authorization: Bearer <token>` — the generic HTTP bearer scheme.
    #[default]
    Authorization,
    /// `X-Chroma-Token: <token>`, without the `Bearer` prefix — the header
    /// some self-hosted Chroma deployments expect a bearer-style token on
    /// instead of Chroma Cloud's own [`CloudApiKeyAuth`] scheme.
    XChromaToken,
}

/// Bearer token authentication, written to either `Authorization: Bearer
/// <token>` or `X-Chroma-Token: <token>` depending on [`TokenHeader`].
#[derive(Debug, Clone)]
pub struct BearerAuth {
    header: TokenHeader,
    header_value: HeaderValue,
}

impl BearerAuth {
    /// Build a Bearer auth provider writing `Authorization: Bearer <token>`.
    pub fn new(token: impl AsRef<str>) -> Self {
        Self::with_header(token, TokenHeader::Authorization)
    }

    /// Build a Bearer auth provider writing the token to `header` instead
    /// of the default `Authorization` header.
    pub fn with_header(token: impl AsRef<str>, header: TokenHeader) -> Self {
        let value = match header {
            TokenHeader::Authorization => format!("Bearer {}", token.as_ref()),
            TokenHeader::XChromaToken => token.as_ref().to_string(),
        };
        let mut header_value =
            HeaderValue::from_str(&value).expect("bearer token must be a valid header value");
        header_value.set_sensitive(true);
        BearerAuth { header, header_value }
    }
}

impl AuthProvider for BearerAuth {
    fn apply(&self, headers: &mut HeaderMap) {
        match self.header {
            TokenHeader::Authorization => {
                headers.insert(AUTHORIZATION, self.header_value.clone());
            }
            TokenHeader::XChromaToken => {
                headers.insert("x-chroma-token", self.header_value.clone());
            }
        }
    }
}

/// Chroma Cloud's `X-Chroma-Token` header authentication.
#[derive(Debug, Clone)]
pub struct CloudApiKeyAuth {
    header_value: HeaderValue,
}

impl CloudApiKeyAuth {
    /// Build a Chroma Cloud API key provider.
    pub fn new(api_key: impl AsRef<str>) -> Self {
        let mut header_value =
            HeaderValue::from_str(api_key.as_ref()).expect("api key must be a valid header value");
        header_value.set_sensitive(true);
        CloudApiKeyAuth { header_value }
    }
}

impl AuthProvider for CloudApiKeyAuth {
    fn apply(&self, headers: &mut HeaderMap) {
        headers.insert("x-chroma-token", self.header_value.clone());
    }
}

/// An arbitrary caller-supplied header map, for auth schemes this crate
/// doesn't model directly. Custom headers are meant to be merged last
/// (and thus authoritative) — use [`ChainedAuth`] with this provider
/// ordered last to get that override behavior over a `Basic`/`Bearer`/
/// cloud-key provider underneath.
pub struct CustomHeaderAuth {
    headers: Vec<(&'static str, HeaderValue)>,
}

impl CustomHeaderAuth {
    /// Build a provider that always sets `name: value`.
    pub fn new(name: &'static str, value: impl AsRef<str>) -> Self {
        Self::from_map([(name, value)])
    }

    /// Build a provider from an arbitrary map of header name/value pairs,
    /// all applied (and thus authoritative over any provider applied
    /// earlier in a [`ChainedAuth`]).
    pub fn from_map(headers: impl IntoIterator<Item = (&'static str, impl AsRef<str>)>) -> Self {
        let headers = headers
            .into_iter()
            .map(|(name, value)| {
                let mut header_value = HeaderValue::from_str(value.as_ref())
                    .expect("header value must be valid ASCII/visible characters");
                header_value.set_sensitive(true);
                (name, header_value)
            })
            .collect();
        CustomHeaderAuth { headers }
    }
}

impl AuthProvider for CustomHeaderAuth {
    fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.headers {
            headers.insert(*name, value.clone());
        }
    }
}

/// Composes several auth providers, applying each in order so a later
/// provider's headers win on overlap. Used to layer `CustomHeaderAuth` (or
/// any other provider) "merged last" on top of a base scheme like
/// [`BearerAuth`].
pub struct ChainedAuth {
    providers: Vec<Arc<dyn AuthProvider>>,
}

impl ChainedAuth {
    /// Build a chain from providers applied in the given order, later
    /// providers taking precedence on header-name collisions.
    pub fn new(providers: impl IntoIterator<Item = Arc<dyn AuthProvider>>) -> Self {
        ChainedAuth { providers: providers.into_iter().collect() }
    }
}

impl AuthProvider for ChainedAuth {
    fn apply(&self, headers: &mut HeaderMap) {
        for provider in &self.providers {
            provider.apply(headers);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_auth_sets_authorization_header() {
        let auth = BearerAuth::new("secret-token");
        let mut headers = HeaderMap::new();
        auth.apply(&mut headers);
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer secret-token");
    }

    #[test]
    fn bearer_auth_can_target_x_chroma_token_header() {
        let auth = BearerAuth::with_header("secret-token", TokenHeader::XChromaToken);
        let mut headers = HeaderMap::new();
        auth.apply(&mut headers);
        assert_eq!(headers.get("x-chroma-token").unwrap(), "secret-token");
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn no_auth_leaves_headers_untouched() {
        let auth = NoAuth;
        let mut headers = HeaderMap::new();
        auth.apply(&mut headers);
        assert!(headers.is_empty());
    }

    #[test]
    fn custom_header_auth_sets_every_entry_in_the_map() {
        let auth = CustomHeaderAuth::from_map([("x-tenant", "acme"), ("x-trace-id", "abc123")]);
        let mut headers = HeaderMap::new();
        auth.apply(&mut headers);
        assert_eq!(headers.get("x-tenant").unwrap(), "acme");
        assert_eq!(headers.get("x-trace-id").unwrap(), "abc123");
    }

    #[test]
    fn chained_auth_lets_custom_headers_win_when_applied_last() {
        let auth = ChainedAuth::new([
            Arc::new(BearerAuth::new("secret-token")) as Arc<dyn AuthProvider>,
            Arc::new(CustomHeaderAuth::new("authorization", "Bearer overridden")),
        ]);
        let mut headers = HeaderMap::new();
        auth.apply(&mut headers);
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer overridden");
    }
}
