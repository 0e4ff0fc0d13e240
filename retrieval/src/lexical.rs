use std::collections::HashMap;

/// Lowercase word tokens: alphanumeric/underscore runs, everything else is a
/// separator. Shared by the corpus and query sides so scores line up.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        if ch.is_alphanumeric() || ch == '_' {
            current.extend(ch.to_lowercase());
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Okapi BM25 fitted over one expanded candidate corpus.
///
/// The model is scoped to the candidates of a single search call, not the
/// whole index; raw scores are only meaningful relative to that batch and
/// are normalized downstream.
pub struct Bm25Model {
    k1: f32,
    b: f32,
    avg_len: f32,
    doc_lens: Vec<f32>,
    term_frequencies: Vec<HashMap<String, usize>>,
    idf: HashMap<String, f32>,
}

impl Bm25Model {
    /// Fit the model over a tokenized corpus.
    pub fn fit(corpus: &[Vec<String>], k1: f32, b: f32) -> Self {
        let doc_count = corpus.len();

        let doc_lens: Vec<f32> = corpus.iter().map(|doc| doc.len() as f32).collect();
        let avg_len = if doc_count == 0 {
            1.0
        } else {
            (doc_lens.iter().sum::<f32>() / doc_count as f32).max(1.0)
        };

        let mut term_frequencies = Vec::with_capacity(doc_count);
        let mut document_frequencies: HashMap<String, usize> = HashMap::new();

        for doc in corpus {
            let mut tf: HashMap<String, usize> = HashMap::new();
            for token in doc {
                *tf.entry(token.clone()).or_insert(0) += 1;
            }
            for term in tf.keys() {
                *document_frequencies.entry(term.clone()).or_insert(0) += 1;
            }
            term_frequencies.push(tf);
        }

        let idf = document_frequencies
            .into_iter()
            .map(|(term, df)| {
                let value =
                    ((doc_count as f32 - df as f32 + 0.5) / (df as f32 + 0.5) + 1.0).ln();
                (term, value)
            })
            .collect();

        Self {
            k1,
            b,
            avg_len,
            doc_lens,
            term_frequencies,
            idf,
        }
    }

    /// One raw relevance score per corpus document, in corpus order.
    pub fn scores(&self, query_tokens: &[String]) -> Vec<f32> {
        self.term_frequencies
            .iter()
            .zip(self.doc_lens.iter())
            .map(|(tf, &len)| {
                query_tokens
                    .iter()
                    .map(|token| {
                        let Some(&count) = tf.get(token) else {
                            return 0.0;
                        };
                        let Some(&idf) = self.idf.get(token) else {
                            return 0.0;
                        };
                        let count = count as f32;
                        let denom =
                            count + self.k1 * (1.0 - self.b + self.b * len / self.avg_len);
                        idf * count * (self.k1 + 1.0) / denom
                    })
                    .sum()
            })
            .collect()
    }
}
