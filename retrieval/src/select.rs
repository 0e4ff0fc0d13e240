use crate::fusion::Candidate;
use crate::result::RankedChunk;

/// Order candidates by final score, descending, and keep the best `k`.
///
/// The sort is stable, so equal scores keep their candidate order: seeds
/// outrank later discoveries at the same score, run after run.
pub fn top_k(candidates: Vec<Candidate>, k: usize) -> Vec<RankedChunk> {
    let mut ordered = candidates;
    ordered.sort_by(|a, b| {
        b.scores
            .final_score
            .partial_cmp(&a.scores.final_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ordered.truncate(k);

    ordered
        .into_iter()
        .enumerate()
        .map(|(rank, candidate)| RankedChunk {
            chunk: candidate.chunk,
            rank,
            scores: candidate.scores,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ScoreBreakdown;
    use codescout_vector_index::{ChunkKind, CodeChunk, content_hash};
    use pretty_assertions::assert_eq;

    fn candidate(name: &str, final_score: f32) -> Candidate {
        let content = format!("def {name}(): pass");
        Candidate {
            chunk: CodeChunk {
                id: format!("demo:src/app.py:{name}:0"),
                path: "src/app.py".to_string(),
                kind: ChunkKind::Function,
                name: name.to_string(),
                qualified_name: None,
                enclosing_class: None,
                start_line: Some(1),
                end_line: Some(1),
                content: content.clone(),
                repo: "demo".to_string(),
                content_hash: content_hash(&content),
            },
            scores: ScoreBreakdown {
                final_score,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_orders_descending_and_assigns_ranks() {
        let ranked = top_k(
            vec![candidate("low", 0.2), candidate("high", 0.9), candidate("mid", 0.5)],
            3,
        );

        let names: Vec<&str> = ranked.iter().map(|r| r.chunk.name.as_str()).collect();
        assert_eq!(names, vec!["high", "mid", "low"]);
        assert_eq!(ranked[0].rank, 0);
        assert_eq!(ranked[2].rank, 2);
    }

    #[test]
    fn test_ties_keep_candidate_order() {
        let ranked = top_k(
            vec![
                candidate("first", 0.9),
                candidate("second", 0.9),
                candidate("third", 0.7),
                candidate("fourth", 0.5),
            ],
            3,
        );

        let names: Vec<&str> = ranked.iter().map(|r| r.chunk.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_k_larger_than_input() {
        let ranked = top_k(vec![candidate("only", 0.4)], 10);
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(top_k(Vec::new(), 5).is_empty());
    }
}
