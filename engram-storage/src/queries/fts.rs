//! FTS5 index maintenance and BM25 search, plus the mandatory query
//! sanitizer.

use rusqlite::{params, Connection};

use engram_core::errors::EngramResult;

use crate::to_storage_err;

/// Words stripped from queries before they reach FTS5. Includes the FTS
/// operator keywords, which must never survive sanitization.
const STOPWORDS: &[&str] = &[
    "and", "or", "not", "near", "the", "a", "an", "of", "to", "in", "on", "for", "is", "are",
    "was", "were", "with", "this", "that", "it", "as", "at", "by", "be", "we", "i", "my", "our",
    "do", "did", "does", "what", "how",
];

/// Sanitize a raw query into an FTS5 MATCH expression.
///
/// Strips operators and special characters, lowercases, drops stopwords
/// and short tokens, then ORs the remainder to favor recall. `None` means
/// nothing searchable remains; callers return empty hits, not an error.
pub fn sanitize_match_query(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let tokens: Vec<String> = cleaned
        .to_lowercase()
        .split_whitespace()
        .filter(|t| t.len() >= 2)
        .filter(|t| !STOPWORDS.contains(t))
        .map(|t| format!("\"{t}\""))
        .collect();

    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" OR "))
    }
}

/// Insert an object's FTS row (same transaction as the object insert).
pub fn index_object(conn: &Connection, object_id: &str, content: &str) -> EngramResult<()> {
    conn.execute(
        "INSERT INTO memory_objects_fts (object_id, content) VALUES (?1, ?2)",
        params![object_id, content],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Remove an object's FTS row (before re-indexing changed content).
pub fn deindex_object(conn: &Connection, object_id: &str) -> EngramResult<()> {
    conn.execute(
        "DELETE FROM memory_objects_fts WHERE object_id = ?1",
        params![object_id],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// BM25 search over active memory objects. Scores are `|bm25|` (BM25 is
/// negative, ascending = better).
pub fn search_objects(
    conn: &Connection,
    raw_query: &str,
    limit: usize,
) -> EngramResult<Vec<(String, f64)>> {
    let Some(match_query) = sanitize_match_query(raw_query) else {
        return Ok(Vec::new());
    };

    let mut stmt = conn
        .prepare(
            "SELECT fts.object_id, bm25(memory_objects_fts) AS score
             FROM memory_objects_fts fts
             JOIN memory_objects m ON m.id = fts.object_id
             WHERE memory_objects_fts MATCH ?1 AND m.status = 'active'
             ORDER BY score
             LIMIT ?2",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map(params![match_query, limit as i64], |row| {
            let id: String = row.get(0)?;
            let score: f64 = row.get(1)?;
            Ok((id, score.abs()))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))
}

/// BM25 search over the event journal.
pub fn search_events(
    conn: &Connection,
    raw_query: &str,
    limit: usize,
) -> EngramResult<Vec<(String, f64)>> {
    let Some(match_query) = sanitize_match_query(raw_query) else {
        return Ok(Vec::new());
    };

    let mut stmt = conn
        .prepare(
            "SELECT event_id, bm25(events_fts) AS score
             FROM events_fts
             WHERE events_fts MATCH ?1
             ORDER BY score
             LIMIT ?2",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map(params![match_query, limit as i64], |row| {
            let id: String = row.get(0)?;
            let score: f64 = row.get(1)?;
            Ok((id, score.abs()))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizer_strips_operators_and_specials() {
        let q = sanitize_match_query("tabs AND spaces OR NOT (NEAR \"weird\")").unwrap();
        assert!(!q.contains("AND"));
        assert!(!q.contains("NOT"));
        assert!(!q.contains("NEAR"));
        assert!(!q.contains('('));
        assert!(q.contains("\"tabs\""));
        assert!(q.contains("\"spaces\""));
    }

    #[test]
    fn sanitizer_empty_for_noise() {
        assert!(sanitize_match_query("").is_none());
        assert!(sanitize_match_query("a ? ! -").is_none());
        assert!(sanitize_match_query("the of and").is_none());
    }

    #[test]
    fn sanitizer_joins_with_or() {
        let q = sanitize_match_query("prefer tabs").unwrap();
        assert_eq!(q, "\"prefer\" OR \"tabs\"");
    }
}
