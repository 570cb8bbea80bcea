//! Tier-0 candidate producers: deterministic rules over a buffered
//! episode. Each producer is a plain function registered by name, so
//! higher tiers can be added without touching the engine.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use engram_core::event::{Event, EventType};
use engram_core::memory::{ConfidenceLevel, ObjectDraft, ObjectType};
use engram_core::session::Session;
use engram_extract::facts::{extract_facts, Utterance};

/// Max evidence events attached to a single candidate.
const MAX_EVIDENCE: usize = 5;

/// Excerpt length for candidate provenance.
const EXCERPT_MAX: usize = 120;

/// Same tool seen at least this often in one episode reads as a convention.
const REPEAT_THRESHOLD: usize = 3;

/// A memory-object candidate produced from an episode.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub draft: ObjectDraft,
    /// Which producer emitted it.
    pub producer: &'static str,
}

/// A Tier-0 producer: a pure function over the episode and its session.
pub type Producer = fn(&[Event], &Session) -> Vec<Candidate>;

/// The Tier-0 registry. Order is the write order for survivors.
pub fn registry() -> Vec<(&'static str, Producer)> {
    vec![
        ("user_corrections", user_corrections),
        ("repeated_tools", repeated_tools),
        ("error_fix_pairs", error_fix_pairs),
        ("turn_facts", turn_facts),
    ]
}

// ── Corrections → constraints ──────────────────────────────────────────────

/// Leading speaker markers like `[user]:` or `user:`.
static SPEAKER_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[?(?i)(user|assistant|human|agent)\]?:\s*").unwrap());

static CORRECTION_CUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)(?:no,|no\b|don't|do\s+not|never|stop\b|actually,?|wrong|that's\s+(?:wrong|not)|instead,?|always\b)")
        .unwrap()
});

/// Strip a speaker marker, returning the marker name and the rest.
fn split_speaker(content: &str) -> (Option<String>, &str) {
    match SPEAKER_PREFIX_RE.captures(content) {
        Some(caps) => {
            let end = caps.get(0).map(|m| m.end()).unwrap_or(0);
            (Some(caps[1].to_lowercase()), &content[end..])
        }
        None => (None, content),
    }
}

/// Turns that open with a negation or correction cue become constraints.
fn user_corrections(events: &[Event], _session: &Session) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for event in events {
        if event.event_type != EventType::Turn {
            continue;
        }
        let (speaker, text) = split_speaker(&event.content);
        if speaker.as_deref() == Some("assistant") || speaker.as_deref() == Some("agent") {
            continue;
        }
        if !CORRECTION_CUE_RE.is_match(text) {
            continue;
        }
        candidates.push(Candidate {
            draft: ObjectDraft {
                content: text.trim().to_string(),
                object_type: ObjectType::Constraint,
                confidence: ConfidenceLevel::High,
                evidence_event_ids: vec![event.id.clone()],
                evidence_excerpt: Some(excerpt(text)),
                ..Default::default()
            },
            producer: "user_corrections",
        });
    }
    candidates
}

// ── Repeated tools → conventions ───────────────────────────────────────────

/// A tool invoked repeatedly in close succession suggests a convention.
fn repeated_tools(events: &[Event], _session: &Session) -> Vec<Candidate> {
    let mut by_tool: HashMap<&str, Vec<&Event>> = HashMap::new();
    for event in events {
        if !matches!(event.event_type, EventType::ToolCall | EventType::ToolOutput) {
            continue;
        }
        if let Some(tool) = event.tool_name.as_deref() {
            by_tool.entry(tool).or_default().push(event);
        }
    }

    let mut candidates: Vec<Candidate> = Vec::new();
    let mut tools: Vec<_> = by_tool.into_iter().collect();
    tools.sort_by_key(|(tool, _)| tool.to_string());

    for (tool, hits) in tools {
        if hits.len() < REPEAT_THRESHOLD {
            continue;
        }
        let evidence: Vec<String> = hits
            .iter()
            .take(MAX_EVIDENCE)
            .map(|e| e.id.clone())
            .collect();
        let sample = hits
            .iter()
            .find(|e| !e.content.trim().is_empty())
            .map(|e| excerpt(&e.content));
        candidates.push(Candidate {
            draft: ObjectDraft {
                content: format!(
                    "The workflow leans on `{tool}` ({} runs in one episode)",
                    hits.len()
                ),
                object_type: ObjectType::Convention,
                confidence: ConfidenceLevel::Medium,
                evidence_event_ids: evidence,
                evidence_excerpt: sample,
                ..Default::default()
            },
            producer: "repeated_tools",
        });
    }
    candidates
}

// ── Error→fix pairs → decisions ────────────────────────────────────────────

/// A failing tool output followed by a clean one on the same file records
/// the fix as a decision.
fn error_fix_pairs(events: &[Event], _session: &Session) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    let outputs: Vec<&Event> = events
        .iter()
        .filter(|e| e.event_type == EventType::ToolOutput && e.file_path.is_some())
        .collect();

    let mut fixed_files: Vec<&str> = Vec::new();
    for (i, failure) in outputs.iter().enumerate() {
        if !failure.exit_code.is_some_and(|c| c != 0) {
            continue;
        }
        let file = failure.file_path.as_deref().unwrap_or_default();
        if fixed_files.contains(&file) {
            continue;
        }
        let fix = outputs[i + 1..].iter().find(|e| {
            e.exit_code == Some(0) && e.file_path.as_deref() == Some(file)
        });
        let Some(fix) = fix else { continue };

        fixed_files.push(file);
        let failure_note = failure
            .synopsis
            .clone()
            .unwrap_or_else(|| excerpt(&failure.content));
        candidates.push(Candidate {
            draft: ObjectDraft {
                content: format!("Failure on {file} was resolved ({failure_note})"),
                object_type: ObjectType::Decision,
                confidence: ConfidenceLevel::Medium,
                evidence_event_ids: vec![failure.id.clone(), fix.id.clone()],
                evidence_excerpt: Some(excerpt(&fix.content)),
                ..Default::default()
            },
            producer: "error_fix_pairs",
        });
    }
    candidates
}

// ── Turn facts ─────────────────────────────────────────────────────────────

/// Run every turn through the deterministic fact extractor.
fn turn_facts(events: &[Event], _session: &Session) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for event in events {
        if event.event_type != EventType::Turn {
            continue;
        }
        let (speaker, text) = split_speaker(&event.content);
        let utterance = Utterance {
            text: text.to_string(),
            speaker,
            session_date: Some(event.timestamp.date_naive()),
        };
        for fact in extract_facts(&utterance) {
            let mut content = format!("{} {} {}", fact.subject, human_predicate(&fact.predicate), fact.object);
            if let Some(time) = &fact.time {
                content.push_str(&format!(" (as of {time})"));
            }
            candidates.push(Candidate {
                draft: ObjectDraft {
                    content,
                    object_type: ObjectType::Fact,
                    confidence: level_for(fact.confidence),
                    evidence_event_ids: vec![event.id.clone()],
                    evidence_excerpt: Some(excerpt(text)),
                    ..Default::default()
                },
                producer: "turn_facts",
            });
        }
    }
    candidates
}

fn human_predicate(predicate: &str) -> String {
    predicate.replace('_', " ")
}

fn level_for(confidence: f64) -> ConfidenceLevel {
    if confidence >= 0.8 {
        ConfidenceLevel::High
    } else if confidence >= 0.6 {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    }
}

fn excerpt(text: &str) -> String {
    let compact = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if compact.chars().count() <= EXCERPT_MAX {
        compact
    } else {
        let mut out: String = compact.chars().take(EXCERPT_MAX).collect();
        out.push('…');
        out
    }
}
