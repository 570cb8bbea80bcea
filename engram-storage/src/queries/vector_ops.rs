//! Embedding storage and flat-scan cosine similarity search.
//!
//! A brute-force scan is the contract up to ~10^5 objects; an approximate
//! index can replace the scan behind the same signatures.

use rusqlite::{params, Connection};

use engram_core::errors::EngramResult;

use crate::to_storage_err;

/// Upsert an object's embedding.
pub fn store_embedding(conn: &Connection, object_id: &str, embedding: &[f32]) -> EngramResult<()> {
    let blob = encode_embedding(embedding);
    conn.execute(
        "INSERT INTO vectors (object_id, embedding, dim)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(object_id) DO UPDATE SET
            embedding = excluded.embedding,
            dim = excluded.dim",
        params![object_id, blob, embedding.len() as i64],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Cosine-similarity search over active objects' embeddings. Returns
/// `(object_id, similarity)` descending. Dimension mismatches are skipped
/// without deserializing the full vector.
pub fn search(
    conn: &Connection,
    query_embedding: &[f32],
    limit: usize,
) -> EngramResult<Vec<(String, f64)>> {
    let query_norm_sq: f64 = query_embedding
        .iter()
        .map(|x| (*x as f64) * (*x as f64))
        .sum();
    if query_norm_sq == 0.0 {
        return Ok(Vec::new());
    }
    let query_len = query_embedding.len();

    let mut stmt = conn
        .prepare(
            "SELECT v.object_id, v.embedding, v.dim
             FROM vectors v
             JOIN memory_objects m ON m.id = v.object_id
             WHERE m.status = 'active'",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map([], |row| {
            let object_id: String = row.get(0)?;
            let blob: Vec<u8> = row.get(1)?;
            let dim: i64 = row.get(2)?;
            Ok((object_id, blob, dim))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut scored: Vec<(String, f64)> = Vec::new();
    for row in rows {
        let (object_id, blob, dim) = row.map_err(|e| to_storage_err(e.to_string()))?;
        if dim as usize != query_len {
            continue;
        }
        let stored = decode_embedding(&blob);
        let sim = cosine_similarity(query_embedding, &stored);
        if sim > 0.0 {
            scored.push((object_id, sim));
        }
    }

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    Ok(scored)
}

/// Count stored vectors.
pub fn count(conn: &Connection) -> EngramResult<u64> {
    conn.query_row("SELECT COUNT(*) FROM vectors", [], |row| row.get::<_, i64>(0))
        .map(|n| n as u64)
        .map_err(|e| to_storage_err(e.to_string()))
}

/// Pack an embedding into the `vectors.embedding` BLOB layout:
/// consecutive little-endian f32 components.
fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(vector.len() * 4);
    for component in vector {
        blob.extend_from_slice(&component.to_le_bytes());
    }
    blob
}

/// Unpack a BLOB column back into an embedding. Trailing bytes that do
/// not form a whole component are ignored.
fn decode_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Cosine similarity, accumulated in one pass over both vectors.
///
/// Embedders are contracted to return unit-norm vectors, but stored rows
/// may predate a model change, so both norms are computed instead of
/// assuming a plain dot product. Zero-norm input scores 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a_sq = 0.0f64;
    let mut norm_b_sq = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a_sq += x * x;
        norm_b_sq += y * y;
    }
    if norm_a_sq == 0.0 || norm_b_sq == 0.0 {
        return 0.0;
    }
    dot / (norm_a_sq.sqrt() * norm_b_sq.sqrt())
}
