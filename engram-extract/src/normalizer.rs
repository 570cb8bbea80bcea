//! Event normalization: hashing, blob decisions, structured signals.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use engram_core::constants::INLINE_CONTENT_LIMIT;
use engram_core::event::EventType;

/// Hex chars kept from the SHA-256 digest.
const HASH_LEN: usize = 16;

/// Max synopsis length, in chars.
const SYNOPSIS_MAX: usize = 200;

static TESTS_PASSED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s+passed").unwrap());

static TESTS_FAILED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s+failed").unwrap());

static ERROR_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(error|panic|panicked|exception|fatal|traceback|failed)\b").unwrap()
});

/// `diff --git a/old b/new` and `+++ b/path` headers.
static DIFF_GIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^diff --git a/\S+ b/(\S+)").unwrap());

static DIFF_PLUS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\+\+\+ b/(\S+)").unwrap());

/// Signals parsed out of event content at ingest time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredSignals {
    pub exit_code: Option<i32>,
    /// First error-like line, whitespace-compacted.
    pub error_signature: Option<String>,
    pub tests_passed: Option<u32>,
    pub tests_failed: Option<u32>,
    /// Paths named in diff headers.
    pub files_changed: Vec<String>,
    pub line_count: usize,
    pub byte_count: usize,
}

/// Result of normalizing one event's content.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEvent {
    /// 16-hex-char truncated SHA-256 of the normalized content.
    pub content_hash: String,
    /// Present only when the content should be blobbed.
    pub synopsis: Option<String>,
    /// Content exceeds the inline limit and belongs in the blob table.
    pub should_blob: bool,
    pub signals: StructuredSignals,
}

/// Deterministic content hash: whitespace-collapsed, lowercased, SHA-256,
/// truncated to 16 hex chars. Stable under whitespace and case changes.
pub fn content_hash(content: &str) -> String {
    let normalized = content
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let digest = Sha256::digest(normalized.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..HASH_LEN].to_string()
}

/// Normalize event content with the default inline limit.
pub fn normalize_event(
    content: &str,
    event_type: EventType,
    exit_code: Option<i32>,
) -> NormalizedEvent {
    normalize_event_with_limit(content, event_type, exit_code, INLINE_CONTENT_LIMIT)
}

/// Normalize event content against an explicit inline-vs-blob limit.
pub fn normalize_event_with_limit(
    content: &str,
    event_type: EventType,
    exit_code: Option<i32>,
    inline_limit: usize,
) -> NormalizedEvent {
    let signals = extract_signals(content, event_type, exit_code);
    let should_blob = content.len() > inline_limit;
    let synopsis = should_blob.then(|| make_synopsis(content, &signals));

    NormalizedEvent {
        content_hash: content_hash(content),
        synopsis,
        should_blob,
        signals,
    }
}

/// Pull structured signals out of raw content.
fn extract_signals(
    content: &str,
    event_type: EventType,
    exit_code: Option<i32>,
) -> StructuredSignals {
    let error_signature = content
        .lines()
        .find(|line| ERROR_LINE_RE.is_match(line))
        .map(compact_line);

    let tests_passed = match event_type {
        EventType::ToolOutput | EventType::TestSummary => first_capture_u32(&TESTS_PASSED_RE, content),
        _ => None,
    };
    let tests_failed = match event_type {
        EventType::ToolOutput | EventType::TestSummary => first_capture_u32(&TESTS_FAILED_RE, content),
        _ => None,
    };

    let mut files_changed: Vec<String> = Vec::new();
    if event_type == EventType::Diff {
        for re in [&*DIFF_GIT_RE, &*DIFF_PLUS_RE] {
            for cap in re.captures_iter(content) {
                let path = cap[1].to_string();
                if !files_changed.contains(&path) {
                    files_changed.push(path);
                }
            }
        }
    }

    StructuredSignals {
        exit_code,
        error_signature,
        tests_passed,
        tests_failed,
        files_changed,
        line_count: content.lines().count(),
        byte_count: content.len(),
    }
}

/// Synopsis for blobbed content: the error signature when there is one,
/// otherwise the leading lines, truncated.
fn make_synopsis(content: &str, signals: &StructuredSignals) -> String {
    if let Some(sig) = &signals.error_signature {
        return truncate_chars(sig, SYNOPSIS_MAX);
    }
    let head = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(2)
        .collect::<Vec<_>>()
        .join(" / ");
    truncate_chars(&compact_line(&head), SYNOPSIS_MAX)
}

fn compact_line(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn first_capture_u32(re: &Regex, content: &str) -> Option<u32> {
    re.captures(content)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max).collect();
        out.push('…');
        out
    }
}
