//! Token index: exact and substring lookups over code-like tokens.

use rusqlite::{params, Connection};

use engram_core::errors::EngramResult;
use engram_extract::tokens::CodeToken;

use crate::to_storage_err;

/// Replace an object's token rows (delete-then-insert, same transaction
/// as the object write).
pub fn index_object(conn: &Connection, object_id: &str, tokens: &[CodeToken]) -> EngramResult<()> {
    conn.execute(
        "DELETE FROM object_tokens WHERE object_id = ?1",
        params![object_id],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    for token in tokens {
        conn.execute(
            "INSERT INTO object_tokens (object_id, token, type) VALUES (?1, ?2, ?3)",
            params![object_id, token.text, token.kind.as_str()],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(())
}

/// Search the token index for the code-like tokens found in `raw_query`.
/// Exact matches score 1.0 per hit, substring matches 0.5; scores
/// accumulate per object.
pub fn search(conn: &Connection, raw_query: &str, limit: usize) -> EngramResult<Vec<(String, f64)>> {
    let query_tokens = engram_extract::tokens::extract_code_tokens(raw_query);
    if query_tokens.is_empty() {
        return Ok(Vec::new());
    }

    let mut scores: std::collections::HashMap<String, f64> = std::collections::HashMap::new();

    for token in &query_tokens {
        // Exact hits.
        let mut stmt = conn
            .prepare(
                "SELECT DISTINCT t.object_id
                 FROM object_tokens t
                 JOIN memory_objects m ON m.id = t.object_id
                 WHERE t.token = ?1 AND m.status = 'active'",
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
        let exact: Vec<String> = stmt
            .query_map(params![token.text], |row| row.get(0))
            .map_err(|e| to_storage_err(e.to_string()))?
            .collect::<Result<_, _>>()
            .map_err(|e| to_storage_err(e.to_string()))?;
        for id in &exact {
            *scores.entry(id.clone()).or_default() += 1.0;
        }

        // Substring hits, excluding the exact ones already counted.
        let pattern = format!("%{}%", escape_like(&token.text));
        let mut stmt = conn
            .prepare(
                "SELECT DISTINCT t.object_id
                 FROM object_tokens t
                 JOIN memory_objects m ON m.id = t.object_id
                 WHERE t.token LIKE ?1 ESCAPE '\\' AND t.token != ?2 AND m.status = 'active'",
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
        let partial: Vec<String> = stmt
            .query_map(params![pattern, token.text], |row| row.get(0))
            .map_err(|e| to_storage_err(e.to_string()))?
            .collect::<Result<_, _>>()
            .map_err(|e| to_storage_err(e.to_string()))?;
        for id in partial {
            *scores.entry(id).or_default() += 0.5;
        }
    }

    let mut results: Vec<(String, f64)> = scores.into_iter().collect();
    results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(limit);
    Ok(results)
}

/// Escape LIKE wildcards in a literal token.
fn escape_like(token: &str) -> String {
    token
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
