use crate::config::RetrievalConfig;
use crate::lexical::{Bm25Model, tokenize};
use crate::result::ScoreBreakdown;
use codescout_vector_index::{CodeChunk, ScoredChunk};
use log::debug;

/// A candidate mid-pipeline: chunk plus the scores accumulated so far.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub chunk: CodeChunk,
    pub scores: ScoreBreakdown,
}

/// Combines dense similarity, BM25, structural boosts and path boosts into
/// one comparable scalar per candidate, with an optional cross-encoder blend.
pub struct FusionEngine {
    config: RetrievalConfig,
}

impl FusionEngine {
    /// Create new fusion engine
    pub fn new(config: RetrievalConfig) -> Self {
        Self { config }
    }

    /// Score the expanded candidate set against the refined query.
    ///
    /// Candidate order is preserved; ordering happens at top-k selection.
    pub fn fuse(&self, candidates: &[ScoredChunk], refined_query: &str) -> Vec<Candidate> {
        if candidates.is_empty() {
            return Vec::new();
        }

        debug!(
            "Fusing {} candidates for query '{refined_query}'",
            candidates.len()
        );

        let corpus: Vec<Vec<String>> = candidates
            .iter()
            .map(|c| tokenize(&c.chunk.content))
            .collect();
        let bm25 = Bm25Model::fit(&corpus, self.config.bm25_k1, self.config.bm25_b);
        let lexical_raw = bm25.scores(&tokenize(refined_query));

        let distances: Vec<f32> = candidates.iter().map(|c| c.distance).collect();
        let dense_similarity = invert_min_max(&distances);
        let lexical_norm = max_ratio(&lexical_raw);

        let mut fused: Vec<Candidate> = candidates
            .iter()
            .enumerate()
            .map(|(i, scored)| {
                let kind_boost = self.config.kind_boosts.boost_for(scored.chunk.kind);
                let domain_boost = self.domain_boost(&scored.chunk.path);
                let base = self.config.dense_weight * dense_similarity[i]
                    + self.config.lexical_weight * lexical_norm[i]
                    + kind_boost
                    + domain_boost;

                Candidate {
                    chunk: scored.chunk.clone(),
                    scores: ScoreBreakdown {
                        dense_distance: scored.distance,
                        dense_similarity: dense_similarity[i],
                        lexical_raw: lexical_raw[i],
                        lexical_norm: lexical_norm[i],
                        kind_boost,
                        domain_boost,
                        // base_norm and final_score set below
                        base_norm: base,
                        rerank_norm: None,
                        final_score: 0.0,
                    },
                }
            })
            .collect();

        // Normalize base scores so the optional re-ranking step fuses
        // comparable ranges.
        let bases: Vec<f32> = fused.iter().map(|c| c.scores.base_norm).collect();
        let base_norm = min_max(&bases);
        for (candidate, norm) in fused.iter_mut().zip(base_norm) {
            candidate.scores.base_norm = norm;
            candidate.scores.final_score = norm;
        }

        fused
    }

    /// Blend normalized cross-encoder scores into the final score.
    ///
    /// `rerank_scores` must have one entry per candidate, in candidate order.
    pub fn apply_rerank(&self, candidates: &mut [Candidate], rerank_scores: &[f32]) {
        debug_assert_eq!(candidates.len(), rerank_scores.len());

        let rerank_norm = min_max(rerank_scores);
        for (candidate, norm) in candidates.iter_mut().zip(rerank_norm) {
            candidate.scores.rerank_norm = Some(norm);
            candidate.scores.final_score = self.config.rerank_weight * norm
                + self.config.base_weight * candidate.scores.base_norm;
        }
    }

    fn domain_boost(&self, path: &str) -> f32 {
        let path_lower = path.to_lowercase();
        self.config
            .domain_boosts
            .iter()
            .filter(|rule| rule.matches(&path_lower))
            .map(|rule| rule.boost)
            .sum()
    }
}

/// Map distances to similarities via `(max - d) / (max - min)`.
///
/// A flat batch normalizes to 1.0 for every member: with no spread to rank
/// by, the batch is treated as uniformly relevant rather than dividing by
/// zero.
pub fn invert_min_max(distances: &[f32]) -> Vec<f32> {
    let Some(&first) = distances.first() else {
        return Vec::new();
    };
    let (min_d, max_d) = distances
        .iter()
        .fold((first, first), |(lo, hi), &d| (lo.min(d), hi.max(d)));

    if max_d - min_d < 1e-9 {
        return vec![1.0; distances.len()];
    }
    distances
        .iter()
        .map(|&d| (max_d - d) / (max_d - min_d))
        .collect()
}

/// Min-max normalize values into [0, 1]; a flat batch maps to all 1.0.
pub fn min_max(values: &[f32]) -> Vec<f32> {
    let Some(&first) = values.first() else {
        return Vec::new();
    };
    let (min_v, max_v) = values
        .iter()
        .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    if max_v - min_v < 1e-9 {
        return vec![1.0; values.len()];
    }
    values
        .iter()
        .map(|&v| (v - min_v) / (max_v - min_v))
        .collect()
}

/// Normalize by the batch maximum; an all-zero batch stays all zero.
pub fn max_ratio(values: &[f32]) -> Vec<f32> {
    let max_v = values.iter().fold(0.0f32, |hi, &v| hi.max(v));
    if max_v <= 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|&v| v / max_v).collect()
}
