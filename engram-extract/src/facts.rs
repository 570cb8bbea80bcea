//! Deterministic subject-predicate-object fact extraction with temporal
//! anchors. Pure text processing: no model calls, no IO.

use std::sync::LazyLock;

use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};
use regex::Regex;
use serde::{Deserialize, Serialize};

use engram_core::constants::MAX_FACTS_PER_UTTERANCE;

/// One utterance to mine for facts.
#[derive(Debug, Clone, Default)]
pub struct Utterance {
    pub text: String,
    /// Who said it. Subjects like "I"/"My" resolve to this.
    pub speaker: Option<String>,
    /// Conversation date; anchor for relative time phrases.
    pub session_date: Option<NaiveDate>,
}

impl Utterance {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Default::default() }
    }

    pub fn with_speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = Some(speaker.into());
        self
    }

    pub fn with_session_date(mut self, date: NaiveDate) -> Self {
        self.session_date = Some(date);
        self
    }
}

/// A candidate fact. `time` is normalized to `YYYY-MM-DD` when resolvable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateFact {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    pub time: Option<String>,
    pub confidence: f64,
}

/// Extract up to `MAX_FACTS_PER_UTTERANCE` facts.
pub fn extract_facts(utterance: &Utterance) -> Vec<CandidateFact> {
    extract_facts_limited(utterance, MAX_FACTS_PER_UTTERANCE)
}

/// Extract up to `max_facts` facts, one per sentence, first pattern wins.
pub fn extract_facts_limited(utterance: &Utterance, max_facts: usize) -> Vec<CandidateFact> {
    let mut facts = Vec::new();
    for sentence in split_sentences(&utterance.text) {
        if facts.len() >= max_facts {
            break;
        }
        if let Some(fact) = extract_from_sentence(&sentence, utterance) {
            facts.push(fact);
        }
    }
    facts
}

/// Split on sentence terminators and newlines.
fn split_sentences(text: &str) -> Vec<String> {
    text.split(['.', '!', '?', ';', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ── Subject resolution ─────────────────────────────────────────────────────

static FIRST_PERSON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i)(?:my|our|i|we)\b").unwrap());

static PROPER_NOUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)\s").unwrap());

/// Capitalized sentence starters that are not names.
const NON_NAMES: &[&str] = &[
    "The", "This", "That", "These", "Those", "It", "There", "Then", "When", "While", "If", "After",
    "Before", "Also", "But", "And", "Yes", "No", "Not", "Please", "Thanks", "Today", "Yesterday",
    "Last", "Next", "Now", "Don", "Let",
];

/// Resolve the sentence subject. First person resolves to the speaker,
/// a leading proper noun stands for itself, anything else falls back to
/// the speaker when known and drops the sentence otherwise.
fn resolve_subject(sentence: &str, speaker: Option<&str>) -> Option<String> {
    if FIRST_PERSON_RE.is_match(sentence) {
        return speaker.map(str::to_string);
    }
    if let Some(cap) = PROPER_NOUN_RE.captures(sentence) {
        let name = cap[1].to_string();
        let first_word = name.split_whitespace().next().unwrap_or("");
        if !NON_NAMES.contains(&first_word) {
            return Some(name);
        }
    }
    speaker.map(str::to_string)
}

// ── Predicate patterns (ordered, first match wins) ─────────────────────────

struct PredicatePattern {
    name: &'static str,
    regex: &'static LazyLock<Regex>,
    confidence: f64,
    /// Whether capture group 1 is a field name and group 2 the value.
    field_form: bool,
}

macro_rules! predicate_re {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($re).unwrap());
    };
}

predicate_re!(RE_IDENTITY, r"(?i)\b(?:my|our)\s+name\s+is\s+(.+)$");
predicate_re!(
    RE_FIELD,
    r"(?i)\b(?:my|our)\s+([a-z][a-z\s]{1,30}?)\s+(?:is|are|was|were)\s+(.+)$"
);
predicate_re!(
    RE_LIKES,
    r"(?i)\b(?:really\s+|absolutely\s+)?(?:likes?|loves?|enjoys?|prefers?)\s+(.+)$"
);
predicate_re!(
    RE_WENT_TO,
    r"(?i)\b(?:went\s+to|visited|travell?ed\s+to|flew\s+to)\s+(.+)$"
);
predicate_re!(
    RE_WORKS_AT,
    r"(?i)\b(?:works?\s+(?:at|for)|employed\s+(?:at|by)|joined)\s+(.+)$"
);
predicate_re!(
    RE_PLANS_TO,
    r"(?i)\b(?:plans?\s+to|planning\s+to|(?:am|is|are)\s+going\s+to|will)\s+(.+)$"
);
predicate_re!(RE_IS, r"(?i)\b(?:is|are|am)\s+(.+)$");
predicate_re!(RE_HAS, r"(?i)\b(?:has|have|owns?)\s+(.+)$");
predicate_re!(RE_GOT, r"(?i)\b(?:got|received|bought|adopted)\s+(.+)$");
predicate_re!(
    RE_ATTRIBUTE,
    r"(?i)\b(?:drives|plays|speaks|studies|teaches|uses|runs)\s+(.+)$"
);

/// Ordered pattern table. Earlier entries are more specific and win.
fn patterns() -> [PredicatePattern; 10] {
    [
        PredicatePattern { name: "name", regex: &RE_IDENTITY, confidence: 0.9, field_form: false },
        PredicatePattern { name: "", regex: &RE_FIELD, confidence: 0.85, field_form: true },
        PredicatePattern { name: "likes", regex: &RE_LIKES, confidence: 0.8, field_form: false },
        PredicatePattern { name: "went_to", regex: &RE_WENT_TO, confidence: 0.8, field_form: false },
        PredicatePattern { name: "works_at", regex: &RE_WORKS_AT, confidence: 0.8, field_form: false },
        PredicatePattern { name: "plans_to", regex: &RE_PLANS_TO, confidence: 0.7, field_form: false },
        PredicatePattern { name: "is", regex: &RE_IS, confidence: 0.6, field_form: false },
        PredicatePattern { name: "has", regex: &RE_HAS, confidence: 0.6, field_form: false },
        PredicatePattern { name: "got", regex: &RE_GOT, confidence: 0.6, field_form: false },
        PredicatePattern { name: "attribute", regex: &RE_ATTRIBUTE, confidence: 0.5, field_form: false },
    ]
}

fn extract_from_sentence(sentence: &str, utterance: &Utterance) -> Option<CandidateFact> {
    let subject = resolve_subject(sentence, utterance.speaker.as_deref())?;

    for pattern in patterns() {
        let Some(caps) = pattern.regex.captures(sentence) else {
            continue;
        };

        let (predicate, raw_object) = if pattern.field_form {
            let field = caps[1].trim().to_lowercase().replace(' ', "_");
            (field, caps[2].to_string())
        } else {
            (pattern.name.to_string(), caps[1].to_string())
        };

        let object = sanitize_object(&raw_object)?;
        let time = resolve_time(sentence, utterance.session_date)
            .map(|d| d.format("%Y-%m-%d").to_string());

        return Some(CandidateFact {
            subject,
            predicate,
            object,
            time,
            confidence: pattern.confidence,
        });
    }

    None
}

// ── Object sanitization ────────────────────────────────────────────────────

static CLAUSE_CUT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\b(?:because|so|which|that)\b.*$").unwrap());

static LEADING_FILLER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i)(?:to|about)\s+").unwrap());

/// Collapse whitespace, strip filler, cut trailing clauses, enforce length.
fn sanitize_object(raw: &str) -> Option<String> {
    let mut s = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    s = LEADING_FILLER_RE.replace(&s, "").to_string();
    if let Some(idx) = s.find('—') {
        s.truncate(idx);
    }
    s = CLAUSE_CUT_RE.replace(&s, "").to_string();
    let s = s.trim().trim_end_matches([',', '.', '!', '?', ';', ':']).trim();
    if s.chars().count() < 3 {
        None
    } else {
        Some(s.to_string())
    }
}

// ── Time anchoring ─────────────────────────────────────────────────────────

const MONTHS: &[(&str, u32)] = &[
    ("jan", 1), ("feb", 2), ("mar", 3), ("apr", 4), ("may", 5), ("jun", 6),
    ("jul", 7), ("aug", 8), ("sep", 9), ("oct", 10), ("nov", 11), ("dec", 12),
];

static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap());

static DMY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?\s+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?(?:,?\s*(\d{4}))?")
        .unwrap()
});

static MDY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2})(?:st|nd|rd|th)?(?:,?\s*(\d{4}))?")
        .unwrap()
});

static AGO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(a|an|\d+)\s+(day|week|month|year)s?\s+ago\b").unwrap()
});

static REL_WEEK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(last|this|next)\s+(week|monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b")
        .unwrap()
});

/// Resolve a time anchor for a sentence: explicit dates first, then
/// relative phrases (anchored to the session date), then the session date.
fn resolve_time(sentence: &str, session_date: Option<NaiveDate>) -> Option<NaiveDate> {
    if let Some(caps) = ISO_DATE_RE.captures(sentence) {
        let (y, m, d) = (caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?);
        if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
            return Some(date);
        }
    }

    if let Some(caps) = DMY_RE.captures(sentence) {
        if let Some(date) = month_date(&caps[2], &caps[1], caps.get(3), session_date) {
            return Some(date);
        }
    }

    if let Some(caps) = MDY_RE.captures(sentence) {
        if let Some(date) = month_date(&caps[1], &caps[2], caps.get(3), session_date) {
            return Some(date);
        }
    }

    let anchor = session_date?;

    let lowered = sentence.to_lowercase();
    if lowered.contains("yesterday") {
        return Some(anchor - Duration::days(1));
    }
    if lowered.contains("today") || lowered.contains("tonight") || lowered.contains("this morning")
    {
        return Some(anchor);
    }

    if let Some(caps) = AGO_RE.captures(sentence) {
        let n: i64 = match &caps[1].to_lowercase()[..] {
            "a" | "an" => 1,
            num => num.parse().ok()?,
        };
        return match caps[2].to_lowercase().as_str() {
            "day" => Some(anchor - Duration::days(n)),
            "week" => Some(anchor - Duration::weeks(n)),
            "month" => anchor.checked_sub_months(Months::new(n as u32)),
            "year" => anchor.checked_sub_months(Months::new(12 * n as u32)),
            _ => None,
        };
    }

    if let Some(caps) = REL_WEEK_RE.captures(sentence) {
        let direction = caps[1].to_lowercase();
        let unit = caps[2].to_lowercase();
        if unit == "week" {
            return match direction.as_str() {
                "last" => Some(anchor - Duration::weeks(1)),
                "next" => Some(anchor + Duration::weeks(1)),
                _ => Some(anchor),
            };
        }
        let target = parse_weekday(&unit)?;
        return Some(resolve_weekday(anchor, target, &direction));
    }

    Some(anchor)
}

/// Build a date from a month name, a day, and an optional year capture.
/// A missing year borrows the session year; without either, no anchor.
fn month_date(
    month_str: &str,
    day_str: &str,
    year: Option<regex::Match<'_>>,
    session_date: Option<NaiveDate>,
) -> Option<NaiveDate> {
    let prefix = month_str.to_lowercase();
    let month = MONTHS.iter().find(|(m, _)| prefix.starts_with(m))?.1;
    let day: u32 = day_str.parse().ok()?;
    let year: i32 = match year {
        Some(y) => y.as_str().parse().ok()?,
        None => session_date?.year(),
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_weekday(name: &str) -> Option<Weekday> {
    match name {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// `last` = most recent strictly-before occurrence, `this` = occurrence in
/// the current forward week, `next` = one week after `this`.
fn resolve_weekday(anchor: NaiveDate, target: Weekday, direction: &str) -> NaiveDate {
    let cur = anchor.weekday().num_days_from_monday() as i64;
    let tgt = target.num_days_from_monday() as i64;
    match direction {
        "last" => {
            let back = (cur - tgt).rem_euclid(7);
            anchor - Duration::days(if back == 0 { 7 } else { back })
        }
        "next" => {
            let fwd = (tgt - cur).rem_euclid(7);
            anchor + Duration::days(fwd + 7)
        }
        _ => {
            let fwd = (tgt - cur).rem_euclid(7);
            anchor + Duration::days(fwd)
        }
    }
}
