// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::strategies::arb_token;
use proptest::prelude::*;

fn cred(token: &str) -> Credential {
    Credential::new(token).unwrap()
}

#[test]
fn empty_tokens_are_absent() {
    assert!(Credential::new("").is_none());
    assert!(Credential::new("   ").is_none());
    assert_eq!(cred(" tok ").expose(), "tok");
}

#[test]
fn debug_and_display_never_show_token() {
    let c = cred("ghp_secret");
    assert!(!format!("{:?}", c).contains("ghp_secret"));
    assert_eq!(c.to_string(), "***");
}

#[yare::parameterized(
    request_wins          = { Some("T1"), Some("T2"), Some("T1") },
    request_only          = { Some("T1"), None,       Some("T1") },
    fallback_when_missing = { None,       Some("T2"), Some("T2") },
    fallback_when_empty   = { Some(""),   Some("T2"), Some("T2") },
    fallback_when_blank   = { Some("  "), Some("T2"), Some("T2") },
    empty_fallback        = { None,       Some(""),   None },
    neither               = { None,       None,       None },
    both_empty            = { Some(""),   Some(""),   None },
)]
fn resolution_matrix(request: Option<&str>, fallback: Option<&str>, expected: Option<&str>) {
    let resolver = CredentialResolver::new(fallback.map(str::to_string));
    let resolved = resolver.resolve(request);
    assert_eq!(resolved.as_ref().map(Credential::expose), expected);
}

#[yare::parameterized(
    plain_https     = { "https://github.com/o/r.git",          "https://T@github.com/o/r.git" },
    already_token   = { "https://OLD@github.com/o/r.git",      "https://T@github.com/o/r.git" },
    user_and_pass   = { "https://user:pw@github.com/o/r",      "https://T@github.com/o/r" },
    no_scheme       = { "github.com/o/r",                      "https://T@github.com/o/r" },
    http_scheme     = { "http://git.local:8080/o/r",           "http://T@git.local:8080/o/r" },
    host_only       = { "https://github.com",                  "https://T@github.com" },
)]
fn embed_cases(url: &str, expected: &str) {
    assert_eq!(embed_credential(url, &cred("T")), expected);
}

#[test]
fn embedding_never_double_prepends() {
    let once = embed_credential("https://github.com/o/r", &cred("T"));
    let twice = embed_credential(&once, &cred("T"));
    assert_eq!(once, twice);
    assert!(!twice.contains("https://T@https://"));
    assert_eq!(twice.matches('@').count(), 1);
}

#[yare::parameterized(
    with_token   = { "https://T@github.com/o/r",  "https://github.com/o/r" },
    without      = { "https://github.com/o/r",    "https://github.com/o/r" },
    bare_path    = { "/srv/git/repo",             "/srv/git/repo" },
    scp_remote   = { "git@github.com:o/r.git",    "git@github.com:o/r.git" },
    ssh_scheme   = { "ssh://git@github.com/o/r",  "ssh://github.com/o/r" },
)]
fn strip_cases(url: &str, expected: &str) {
    assert_eq!(strip_credentials(url), expected);
}

#[yare::parameterized(
    https       = { "https://github.com/o/r",       "github.com" },
    with_creds  = { "https://T@github.com/o/r",     "github.com" },
    with_port   = { "http://git.local:8080/o/r",    "git.local" },
    no_scheme   = { "gitlab.com/o/r",               "gitlab.com" },
)]
fn host_cases(url: &str, expected: &str) {
    assert_eq!(url_host(url), expected);
}

#[test]
fn ssh_remotes_do_not_take_inline_credentials() {
    assert!(!supports_inline_credentials("git@github.com:o/r.git"));
    assert!(supports_inline_credentials("HTTPS://github.com/o/r"));
}

#[test]
fn redact_masks_token_and_userinfo() {
    let c = cred("ghp_abc");
    let msg = "fatal: could not read from 'https://ghp_abc@github.com/o/r' (ghp_abc)";
    let out = c.redact(msg);
    assert!(!out.contains("ghp_abc"));
    assert!(out.contains("https://***@github.com/o/r"));
}

#[test]
fn redact_without_credential_still_masks_urls() {
    let out = redact("push to https://x-token:pw@host/o/r failed", None);
    assert_eq!(out, "push to https://***@host/o/r failed");
}

proptest! {
    #[test]
    fn embed_is_idempotent(
        token in arb_token(),
        old in arb_token(),
        path in "[a-z]{1,8}/[a-z]{1,8}",
    ) {
        let c = cred(&token);
        let base = format!("https://{}@github.com/{}", old, path);
        let once = embed_credential(&base, &c);
        prop_assert_eq!(&embed_credential(&once, &c), &once);
        prop_assert_eq!(once, format!("https://{}@github.com/{}", token, path));
    }

    #[test]
    fn redacted_text_never_contains_token(token in "[A-Za-z0-9_]{8,40}", prefix in "[a-z ]{0,20}") {
        let c = cred(&token);
        let text = format!("{}https://{}@github.com/o/r {}", prefix, token, token);
        prop_assert!(!c.redact(&text).contains(&token));
    }
}
