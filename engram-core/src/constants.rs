//! Engine-wide defaults. Runtime overrides live in [`crate::config::EngramConfig`].

/// Buffered events before an automatic checkpoint becomes eligible.
pub const AUTO_CHECKPOINT_THRESHOLD: usize = 10;

/// Consecutive non-zero exit codes that trigger an error-burst checkpoint.
pub const ERROR_BURST_THRESHOLD: usize = 3;

/// Tool outputs inside the sliding window that trigger a tool-burst checkpoint.
pub const TOOL_BURST_COUNT: usize = 10;

/// Width of the tool-burst sliding window, in seconds.
pub const TOOL_BURST_WINDOW_SECS: i64 = 120;

/// Events since the last disclosure before a cadence refresh is suggested.
pub const DISCLOSURE_THRESHOLD: usize = 15;

/// Context-usage percentage above which a checkpoint-and-clear is recommended.
pub const CONTEXT_THRESHOLD_PERCENT: u32 = 50;

/// Assumed host context window, in tokens.
pub const CONTEXT_WINDOW_TOKENS: usize = 200_000;

/// Exponential decay rate per day of inactivity.
pub const DECAY_RATE: f64 = 0.05;

/// Strength added on each reinforcing access.
pub const REINFORCE_BOOST: f64 = 0.15;

/// Strength never decays below this floor.
pub const STRENGTH_FLOOR: f64 = 0.01;

/// Decayed strength below this marks an object archivable.
pub const ARCHIVABLE_THRESHOLD: f64 = 0.1;

/// Event content larger than this spills to the blob table.
pub const INLINE_CONTENT_LIMIT: usize = 1000;

/// Days within which a verification keeps an approved object grounded.
pub const VERIFICATION_WINDOW_DAYS: i64 = 30;

/// Maximum candidate facts extracted from a single utterance.
pub const MAX_FACTS_PER_UTTERANCE: usize = 3;

// ── Retrieval ──────────────────────────────────────────────────────────────

/// Per-branch candidate caps: lexical, vector, token.
pub const LEXICAL_BRANCH_CAP: usize = 50;
pub const VECTOR_BRANCH_CAP: usize = 50;
pub const TOKEN_BRANCH_CAP: usize = 20;

/// Fusion weights. Renormalized over whichever branches actually ran.
pub const LEXICAL_WEIGHT: f64 = 0.5;
pub const VECTOR_WEIGHT: f64 = 0.4;
pub const TOKEN_WEIGHT: f64 = 0.1;

/// Additive score boost for session-hot (priority) memories.
pub const PRIORITY_BOOST: f64 = 0.25;

/// Per-branch timeout, in milliseconds.
pub const BRANCH_TIMEOUT_MS: u64 = 250;

// ── Disclosure packs ───────────────────────────────────────────────────────

/// Token budgets for the three disclosure levels.
pub const MINIMAL_PACK_BUDGET: usize = 200;
pub const TASK_PACK_BUDGET: usize = 500;
pub const DEEP_PACK_BUDGET: usize = 1500;

/// Heatmap: lookback window and result cap.
pub const HEATMAP_WINDOW_DAYS: i64 = 14;
pub const HEATMAP_LIMIT: usize = 10;
