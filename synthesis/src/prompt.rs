use codescout_retrieval::RankedChunk;

/// Strict grounded-answer template. The model may only cite retrieved code
/// and must answer with the exact fallback line when the chunks don't cover
/// the question.
const SYNTHESIS_TEMPLATE: &str = r#"You are a strict code-grounded summarizer for senior engineers.
You will produce a short, precise, fully-grounded answer that uses ONLY the code between === SOURCE CODE START === and === SOURCE CODE END ===.

INPUT:
Question:
[QUESTION]

=== SOURCE CODE START ===
[CHUNKS]
=== SOURCE CODE END ===

INVARIANT RULES (must obey exactly):
1) Use only the code above. If the answer cannot be found exactly in those chunks, output exactly the single line:
   Not found in retrieved code.
   and stop (no extra text).
2) Every factual statement must end with a citation in this exact format:
   (file: <path>, <symbol>, lines <start>-<end>)
3) Do not use speculative language. Forbidden: likely, probably, might, maybe, generally, usually, often.
4) No repetition. Each sentence must be unique.
5) Never invent code or behavior not explicitly present.
6) Do not quote code unless it appears verbatim in the chunks.
7) Output MUST be plain text. No markdown fences.

OUTPUT FORMAT:
1) One-line summary sentence (ends with citation).
2) Numbered explanation steps (1-N). Each sentence must end with a citation.
3) No conclusion, no extra sections.

Begin now."#;

/// Exact line the model is instructed to emit when nothing applies.
pub const NOT_FOUND_ANSWER: &str = "Not found in retrieved code.";

/// Render retrieved chunks into the source-code block of the prompt.
///
/// Each chunk gets a header naming the file, symbol and line span so the
/// model can produce the required citations.
pub fn format_chunks(results: &[RankedChunk]) -> String {
    let mut out = Vec::new();
    for result in results {
        let chunk = &result.chunk;
        let symbol = chunk.qualified_name.as_deref().unwrap_or(&chunk.name);
        let span = match (chunk.start_line, chunk.end_line) {
            (Some(start), Some(end)) => format!("lines {start}-{end}"),
            _ => "lines ?".to_string(),
        };
        out.push(format!("--- File: {} ({symbol}, {span}) ---", chunk.path));
        out.push(chunk.content.clone());
        out.push(String::new());
    }
    out.join("\n")
}

/// Build the full synthesis prompt for one question.
pub fn build_answer_prompt(question: &str, results: &[RankedChunk]) -> String {
    SYNTHESIS_TEMPLATE
        .replace("[QUESTION]", question)
        .replace("[CHUNKS]", &format_chunks(results))
}

/// Build the query-rewrite prompt.
pub fn build_rewrite_prompt(query: &str) -> String {
    format!(
        r#"Rewrite this query into a precise technical question for source-code retrieval.

Keep it short, keep it focused on relevant functions, modules, or classes. Only return this refined query, nothing else.

Query: "{query}"

Refined:"#
    )
}
