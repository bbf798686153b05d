// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash signatures matched against instance output.
//!
//! Matching is deliberately coarse: a plain case-sensitive substring hit on
//! `Traceback` or `Exception` counts as a crash, including false positives
//! from ordinary log text that happens to contain those words.

use regex::Regex;
use std::fmt;

/// A predicate over one line of instance output.
pub trait CrashSignature: Send + Sync {
    /// Short label used in log lines.
    fn name(&self) -> &str;

    fn matches(&self, line: &str) -> bool;
}

/// Case-sensitive substring match.
#[derive(Debug, Clone)]
pub struct Substring(String);

impl Substring {
    pub fn new(needle: impl Into<String>) -> Self {
        Self(needle.into())
    }
}

impl CrashSignature for Substring {
    fn name(&self) -> &str {
        &self.0
    }

    fn matches(&self, line: &str) -> bool {
        line.contains(&self.0)
    }
}

/// Regex match, for configured signatures.
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self)
    }
}

impl CrashSignature for Pattern {
    fn name(&self) -> &str {
        self.0.as_str()
    }

    fn matches(&self, line: &str) -> bool {
        self.0.is_match(line)
    }
}

/// Ordered list of signatures; the first match wins.
pub struct SignatureSet {
    signatures: Vec<Box<dyn CrashSignature>>,
}

impl SignatureSet {
    pub fn empty() -> Self {
        Self { signatures: Vec::new() }
    }

    pub fn with(mut self, signature: impl CrashSignature + 'static) -> Self {
        self.signatures.push(Box::new(signature));
        self
    }

    /// Name of the first signature matching `line`.
    pub fn first_match(&self, line: &str) -> Option<&str> {
        self.signatures.iter().find(|s| s.matches(line)).map(|s| s.name())
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

impl Default for SignatureSet {
    fn default() -> Self {
        Self::empty().with(Substring::new("Traceback")).with(Substring::new("Exception"))
    }
}

impl fmt::Debug for SignatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.signatures.iter().map(|s| s.name())).finish()
    }
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
