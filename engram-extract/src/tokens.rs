//! Code-like token extraction for the exact-match token index.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// What kind of code-ish thing a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// camelCase / PascalCase / snake_case identifier.
    Identifier,
    /// Filesystem path.
    Path,
    /// CLI invocation like `cargo test`.
    Command,
    /// `--flag` style option.
    Flag,
    /// Semantic version.
    Version,
    /// Compiler or errno-style code (`E0308`, `ENOENT`).
    ErrorCode,
    /// SHOUTY_SNAKE environment variable name.
    EnvVar,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Identifier => "identifier",
            TokenKind::Path => "path",
            TokenKind::Command => "command",
            TokenKind::Flag => "flag",
            TokenKind::Version => "version",
            TokenKind::ErrorCode => "error_code",
            TokenKind::EnvVar => "env_var",
        }
    }

    pub fn parse_name(s: &str) -> Option<Self> {
        match s {
            "identifier" => Some(TokenKind::Identifier),
            "path" => Some(TokenKind::Path),
            "command" => Some(TokenKind::Command),
            "flag" => Some(TokenKind::Flag),
            "version" => Some(TokenKind::Version),
            "error_code" => Some(TokenKind::ErrorCode),
            "env_var" => Some(TokenKind::EnvVar),
            _ => None,
        }
    }
}

/// An extracted token. Text is stored lowercased so index lookups are
/// case-insensitive by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeToken {
    pub text: String,
    pub kind: TokenKind,
}

static PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w~.-]+(?:/[\w.-]+)+").unwrap());

static COMMAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^\s*\$?\s*\b(cargo|git|npm|pnpm|yarn|pip|pytest|python|make|docker|kubectl|go|rustc|node)\s+([a-z][a-z0-9-]*)",
    )
    .unwrap()
});

static FLAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"--[A-Za-z0-9][A-Za-z0-9-]*").unwrap());

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+\.\d+\.\d+(?:-[0-9A-Za-z.]+)?\b").unwrap());

static ERROR_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bE(?:\d{3,4}|[A-Z]{3,10})\b").unwrap());

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][A-Z0-9]*(?:_[A-Z0-9]+)+\b").unwrap());

static CAMEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[a-z][a-z0-9]*(?:[A-Z][A-Za-z0-9]*)+|(?:[A-Z][a-z0-9]+){2,})\b").unwrap()
});

static SNAKE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-z][a-z0-9]*(?:_[a-z0-9]+)+\b").unwrap());

/// Extract code-like tokens. Kinds earlier in the pass order win when the
/// same text would match twice (a path beats the identifiers inside it).
pub fn extract_code_tokens(content: &str) -> Vec<CodeToken> {
    let mut seen: Vec<CodeToken> = Vec::new();

    let mut push = |text: &str, kind: TokenKind| {
        let text = text.to_lowercase();
        if text.len() < 2 {
            return;
        }
        if !seen.iter().any(|t| t.text == text) {
            seen.push(CodeToken { text, kind });
        }
    };

    for m in PATH_RE.find_iter(content) {
        push(m.as_str(), TokenKind::Path);
    }
    for cap in COMMAND_RE.captures_iter(content) {
        push(&format!("{} {}", &cap[1], &cap[2]), TokenKind::Command);
    }
    for m in FLAG_RE.find_iter(content) {
        push(m.as_str(), TokenKind::Flag);
    }
    for m in VERSION_RE.find_iter(content) {
        push(m.as_str(), TokenKind::Version);
    }
    for m in ERROR_CODE_RE.find_iter(content) {
        push(m.as_str(), TokenKind::ErrorCode);
    }
    for m in ENV_VAR_RE.find_iter(content) {
        push(m.as_str(), TokenKind::EnvVar);
    }
    for m in CAMEL_RE.find_iter(content) {
        push(m.as_str(), TokenKind::Identifier);
    }
    for m in SNAKE_RE.find_iter(content) {
        push(m.as_str(), TokenKind::Identifier);
    }

    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_of(content: &str) -> Vec<(String, TokenKind)> {
        extract_code_tokens(content)
            .into_iter()
            .map(|t| (t.text, t.kind))
            .collect()
    }

    #[test]
    fn extracts_paths_and_flags() {
        let tokens = kinds_of("run cargo test --no-default-features on src/lib.rs");
        assert!(tokens.contains(&("src/lib.rs".into(), TokenKind::Path)));
        assert!(tokens.contains(&("--no-default-features".into(), TokenKind::Flag)));
        assert!(tokens.contains(&("cargo test".into(), TokenKind::Command)));
    }

    #[test]
    fn extracts_identifiers_both_styles() {
        let tokens = kinds_of("call getUserName then parse_config");
        assert!(tokens.contains(&("getusername".into(), TokenKind::Identifier)));
        assert!(tokens.contains(&("parse_config".into(), TokenKind::Identifier)));
    }

    #[test]
    fn extracts_versions_error_codes_env_vars() {
        let tokens = kinds_of("rustc 1.80.0 raised E0308 after RUST_LOG=debug");
        assert!(tokens.contains(&("1.80.0".into(), TokenKind::Version)));
        assert!(tokens.contains(&("e0308".into(), TokenKind::ErrorCode)));
        assert!(tokens.contains(&("rust_log".into(), TokenKind::EnvVar)));
    }

    #[test]
    fn dedupes_repeated_tokens() {
        let tokens = kinds_of("src/a.rs src/a.rs src/a.rs");
        assert_eq!(tokens.len(), 1);
    }
}
