//! Packaging retrieval results as plain text for a language model.
//!
//! Each sub-query becomes one block headed by the literal query. Article
//! text sits inside a `<source id="...">` element naming the archive it
//! came from; failures are rendered as their explanatory message.
//!
//! ```text
//! ### QUERY: headlight replacement
//! <source id="ifixit_en_all_2025-01">
//! Headlight Replacement ...
//! </source>
//! ```

use crate::models::RetrievalResult;

/// Separator between sub-query blocks.
pub const BLOCK_DIVIDER: &str = "\n\n====================\n\n";

/// Render one sub-query result.
pub fn format_result(result: &RetrievalResult) -> String {
    match &result.outcome {
        Ok(article) => format!(
            "### QUERY: {}\n<source id=\"{}\">\n{}\n</source>",
            result.query, article.archive, article.text
        ),
        Err(e) => format!("### QUERY: {}\n{}", result.query, e),
    }
}

/// Render every result, in order, joined by [`BLOCK_DIVIDER`].
pub fn format_all(results: &[RetrievalResult]) -> String {
    results
        .iter()
        .map(format_result)
        .collect::<Vec<_>>()
        .join(BLOCK_DIVIDER)
}
