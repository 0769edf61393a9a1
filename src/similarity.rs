//! Cosine similarity scoring and candidate ranking.

use std::cmp::Ordering;

use crate::types::{Chunk, RankedChunk, RetrievalError};

/// Computes the cosine similarity between two vectors.
///
/// Dot product and both squared norms are accumulated in a single `f64` pass,
/// so long vectors (hundreds to low thousands of dimensions) do not drift.
/// Returns a value mathematically in [-1, 1]; no clamping is applied, so
/// callers must tolerate boundary overshoot on the order of float epsilon.
///
/// # Errors
///
/// Mismatched lengths are a data error, never silently truncated or padded:
/// [`RetrievalError::DimensionMismatch`] names both lengths.
///
/// If either vector has a zero norm the similarity is defined as `0.0`
/// rather than NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, RetrievalError> {
    if a.len() != b.len() {
        return Err(RetrievalError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let x = f64::from(x);
        let y = f64::from(y);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / denominator) as f32)
}

/// Scores `candidates` against `query`, sorts descending by similarity, and
/// truncates to `limit`.
///
/// Candidates with an empty embedding, or an embedding whose length differs
/// from the query's, are skipped with a warning instead of failing the whole
/// ranking; one malformed chunk must not break retrieval for the rest. The
/// sort is stable, so equal scores keep their fetch order and repeated calls
/// over identical data return identical rankings.
pub fn rank_chunks(query: &[f32], candidates: Vec<Chunk>, limit: usize) -> Vec<RankedChunk> {
    let mut ranked = Vec::with_capacity(candidates.len());

    for chunk in candidates {
        if chunk.embedding.is_empty() || chunk.embedding.len() != query.len() {
            tracing::warn!(
                chunk_id = %chunk.id,
                expected = query.len(),
                actual = chunk.embedding.len(),
                "skipping chunk with unusable embedding"
            );
            continue;
        }
        // Lengths were checked above, so the pairwise call cannot mismatch.
        let Ok(similarity) = cosine_similarity(query, &chunk.embedding) else {
            continue;
        };
        ranked.push(RankedChunk { chunk, similarity });
    }

    ranked.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::Section;

    fn chunk_with_embedding(id: &str, embedding: Vec<f32>) -> Chunk {
        Chunk {
            id: id.to_string(),
            document_id: "doc-1".to_string(),
            owner_id: "user-1".to_string(),
            text: format!("chunk {id}"),
            embedding,
            embedding_model: "test-model".to_string(),
            section: Section::Other,
            position: 0,
        }
    }

    #[test]
    fn identical_vectors_score_one() {
        let v = vec![0.3, -1.2, 4.5, 0.07];
        let similarity = cosine_similarity(&v, &v).unwrap();
        assert!((f64::from(similarity) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn scaled_vectors_score_plus_or_minus_one() {
        let v = vec![1.0, 2.0, 3.0];
        let scaled: Vec<f32> = v.iter().map(|x| x * 7.5).collect();
        let negated: Vec<f32> = v.iter().map(|x| x * -2.0).collect();

        assert!((cosine_similarity(&v, &scaled).unwrap() - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&v, &negated).unwrap() + 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        let similarity = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!(similarity.abs() < 1e-9);
    }

    #[test]
    fn zero_vector_scores_zero_not_nan() {
        let zero = vec![0.0; 4];
        let other = vec![1.0, 2.0, 3.0, 4.0];
        let similarity = cosine_similarity(&zero, &other).unwrap();
        assert_eq!(similarity, 0.0);
        assert!(!similarity.is_nan());
    }

    #[test]
    fn mismatched_lengths_fail_loudly() {
        let err = cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]).unwrap_err();
        match err {
            RetrievalError::DimensionMismatch { left, right } => {
                assert_eq!((left, right), (2, 3));
            }
            other => panic!("expected DimensionMismatch, got {other:?}"),
        }
        let rendered = cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0])
            .unwrap_err()
            .to_string();
        assert!(rendered.contains('2') && rendered.contains('3'));
    }

    #[test]
    fn ranking_sorts_descending_and_truncates() {
        let query = vec![1.0, 0.0];
        // Similarities against the query: 0.0, 1.0, ~0.707.
        let candidates = vec![
            chunk_with_embedding("low", vec![0.0, 1.0]),
            chunk_with_embedding("high", vec![2.0, 0.0]),
            chunk_with_embedding("mid", vec![1.0, 1.0]),
        ];

        let ranked = rank_chunks(&query, candidates, 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].chunk.id, "high");
        assert_eq!(ranked[1].chunk.id, "mid");
        assert!(ranked[0].similarity > ranked[1].similarity);
    }

    #[test]
    fn ranking_skips_mismatched_and_empty_embeddings() {
        let query = vec![1.0, 0.0];
        let candidates = vec![
            chunk_with_embedding("three-dims", vec![1.0, 0.0, 0.0]),
            chunk_with_embedding("empty", vec![]),
            chunk_with_embedding("ok", vec![1.0, 0.2]),
        ];

        let ranked = rank_chunks(&query, candidates, 10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].chunk.id, "ok");
    }

    #[test]
    fn equal_scores_keep_fetch_order() {
        let query = vec![1.0, 0.0];
        // All parallel to the query: every similarity is 1.0.
        let candidates = vec![
            chunk_with_embedding("first", vec![1.0, 0.0]),
            chunk_with_embedding("second", vec![2.0, 0.0]),
            chunk_with_embedding("third", vec![0.5, 0.0]),
        ];

        let ranked = rank_chunks(&query, candidates, 10);
        let ids: Vec<&str> = ranked.iter().map(|r| r.chunk.id.as_str()).collect();
        assert_eq!(ids, ["first", "second", "third"]);
    }

    #[test]
    fn limit_zero_returns_nothing() {
        let ranked = rank_chunks(&[1.0], vec![chunk_with_embedding("a", vec![1.0])], 0);
        assert!(ranked.is_empty());
    }
}
