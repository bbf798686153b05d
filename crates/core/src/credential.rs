// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Access-token resolution and inline URL credentials.
//!
//! Resolution follows a short fallback chain:
//!
//! ```text
//! 1. token supplied with the deploy request
//! 2. administrator token configured at startup
//! 3. none (read-only: clone public repos, never push)
//! ```
//!
//! A [`Credential`] never prints its value; use [`Credential::expose`] at the
//! point where the token must be handed to git.

use std::fmt;

const REDACTED: &str = "***";

/// Opaque bearer token scoped to one job.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for empty or whitespace-only input.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    /// The cleartext token.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Replace every occurrence of this token in `text`.
    pub fn redact(&self, text: &str) -> String {
        redact(text, Some(self))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&REDACTED).finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

/// Picks the token for a job: per-request, else the administrator fallback.
#[derive(Debug, Clone, Default)]
pub struct CredentialResolver {
    fallback: Option<Credential>,
}

impl CredentialResolver {
    pub fn new(fallback: Option<String>) -> Self {
        Self { fallback: fallback.and_then(Credential::new) }
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn resolve(&self, request: Option<&str>) -> Option<Credential> {
        request.and_then(Credential::new).or_else(|| self.fallback.clone())
    }
}

/// Replace the token (if any) and any inline URL credentials in `text`.
pub fn redact(text: &str, credential: Option<&Credential>) -> String {
    let text = match credential {
        Some(c) => text.replace(c.expose(), REDACTED),
        None => text.to_string(),
    };
    redact_userinfo(&text)
}

/// Mask `scheme://user@host` userinfo wherever it appears in free text.
fn redact_userinfo(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find("://") {
        let (head, tail) = rest.split_at(idx + 3);
        out.push_str(head);
        let authority_end =
            tail.find(|c: char| c == '/' || c.is_whitespace() || c == '\'' || c == '"');
        let authority = &tail[..authority_end.unwrap_or(tail.len())];
        match authority.rfind('@') {
            Some(at) if &authority[..at] != REDACTED => {
                out.push_str(REDACTED);
                rest = &tail[at..];
            }
            _ => rest = tail,
        }
    }
    out.push_str(rest);
    out
}

/// Split a URL into `(scheme, authority, path)`; URLs without a scheme are
/// treated as https.
fn split_url(url: &str) -> (&str, &str, &str) {
    let (scheme, rest) = match url.find("://") {
        Some(idx) => (&url[..idx], &url[idx + 3..]),
        None => ("https", url),
    };
    match rest.find('/') {
        Some(idx) => (scheme, &rest[..idx], &rest[idx..]),
        None => (scheme, rest, ""),
    }
}

/// Remove inline `user[:pass]@` credentials from a URL.
///
/// Input without a scheme is returned as is: scp-style SSH remotes
/// (`git@host:owner/repo`) carry a login, not a credential.
pub fn strip_credentials(url: &str) -> String {
    let url = url.trim();
    if !url.contains("://") {
        return url.to_string();
    }
    let (scheme, authority, path) = split_url(url);
    let host = authority.rsplit('@').next().unwrap_or(authority);
    format!("{}://{}{}", scheme, host, path)
}

/// Rewrite `url` as `scheme://TOKEN@host/...`, replacing any credentials
/// already embedded. Applying it twice yields the same URL.
pub fn embed_credential(url: &str, credential: &Credential) -> String {
    let stripped = strip_credentials(url);
    let (scheme, host, path) = split_url(&stripped);
    format!("{}://{}@{}{}", scheme, credential.expose(), host, path)
}

/// Only `http(s)://` URLs can carry inline credentials; scp-style SSH
/// remotes (`git@host:owner/repo`) are left alone.
pub fn supports_inline_credentials(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}

/// Host portion of a URL, without credentials or port.
pub fn url_host(url: &str) -> &str {
    let (_, authority, _) = split_url(url.trim());
    let host = authority.rsplit('@').next().unwrap_or(authority);
    host.split(':').next().unwrap_or(host)
}

#[cfg(test)]
#[path = "credential_tests.rs"]
mod tests;
