//! Text rendering utilities for human-friendly error messages.
//!
//! Provides helpers to format resolution chains, type names,
//! and suggestions for identifiers that were never registered.

/// Separator placed between entries of a rendered chain.
pub const CHAIN_SEPARATOR: &str = " -> ";

/// Renders a resolution chain as a readable string.
///
/// # Examples
/// ```
/// use sunduq_support::rendering::render_chain;
///
/// let chain = vec!["quizSession", "questionLoader", "storage", "quizSession"];
/// let rendered = render_chain(&chain);
/// assert_eq!(rendered, "quizSession -> questionLoader -> storage -> quizSession");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    chain
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(CHAIN_SEPARATOR)
}

/// Shortens a fully qualified type name for display.
///
/// ```
/// use sunduq_support::rendering::shorten_type_name;
///
/// let short = shorten_type_name("quiz_app::services::QuestionLoader");
/// assert_eq!(short, "QuestionLoader");
///
/// let short = shorten_type_name("alloc::sync::Arc<dyn quiz_app::traits::Storage>");
/// assert_eq!(short, "Arc<dyn Storage>");
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut result = String::with_capacity(full_name.len());
    let mut chars = full_name.chars().peekable();
    let mut current_segment = String::new();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                // path prefix, keep only the last segment
                current_segment.clear();
            }
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' | '&' => {
                result.push_str(&current_segment);
                result.push(ch);
                current_segment.clear();
            }
            _ => {
                current_segment.push(ch);
            }
        }
    }

    result.push_str(&current_segment);
    result
}

/// Returns the positions in `available` that look like what `requested` meant.
///
/// Results are ordered best match first and capped at `max_suggestions`.
/// Exact substring matches rank above short-name matches, which rank above
/// candidates sharing a common prefix of at least three characters.
///
/// ```
/// use sunduq_support::rendering::suggest_similar;
///
/// let available = ["questionLoader", "progressTracker"];
/// assert_eq!(suggest_similar("questionLoadr", &available, 3), vec![0]);
/// ```
pub fn suggest_similar(
    requested: &str,
    available: &[impl AsRef<str>],
    max_suggestions: usize,
) -> Vec<usize> {
    if max_suggestions == 0 {
        return Vec::new();
    }

    let requested_lower = requested.to_lowercase();
    let requested_short = shorten_type_name(requested).to_lowercase();

    let mut scored: Vec<(usize, usize)> = available
        .iter()
        .enumerate()
        .filter_map(|(index, name)| {
            let name = name.as_ref();
            if name == requested {
                return None;
            }

            let name_lower = name.to_lowercase();
            let name_short = shorten_type_name(name).to_lowercase();

            if name_lower.contains(&requested_lower) || requested_lower.contains(&name_lower) {
                return Some((index, 100));
            }

            if name_short.contains(&requested_short) || requested_short.contains(&name_short) {
                return Some((index, 80));
            }

            let common = name_short
                .chars()
                .zip(requested_short.chars())
                .take_while(|(a, b)| a == b)
                .count();

            (common >= 3).then_some((index, common * 10))
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(index, _)| index)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_simple_chain() {
        let chain = vec!["A", "B", "C", "A"];
        assert_eq!(render_chain(&chain), "A -> B -> C -> A");
    }

    #[test]
    fn render_single_element_chain() {
        let chain = vec!["A"];
        assert_eq!(render_chain(&chain), "A");
    }

    #[test]
    fn render_empty_chain() {
        let chain: Vec<&str> = vec![];
        assert_eq!(render_chain(&chain), "");
    }

    #[test]
    fn render_owned_strings() {
        let chain = vec![String::from("loader"), String::from("storage")];
        assert_eq!(render_chain(&chain), "loader -> storage");
    }

    #[test]
    fn shorten_simple_path() {
        assert_eq!(shorten_type_name("quiz::services::AnswerValidator"), "AnswerValidator");
    }

    #[test]
    fn shorten_with_generics() {
        assert_eq!(
            shorten_type_name("alloc::sync::Arc<dyn quiz::traits::Storage>"),
            "Arc<dyn Storage>"
        );
    }

    #[test]
    fn shorten_tuple_and_reference() {
        assert_eq!(shorten_type_name("(alloc::string::String, &str)"), "(String, &str)");
    }

    #[test]
    fn shorten_no_path() {
        assert_eq!(shorten_type_name("String"), "String");
    }

    #[test]
    fn suggest_typo() {
        let available = vec![
            "questionLoader",
            "questionRepository",
            "progressTracker",
            "answerValidator",
        ];

        let suggestions = suggest_similar("questionLoadr", &available, 3);
        assert!(!suggestions.is_empty());
        assert_eq!(available[suggestions[0]], "questionLoader");
    }

    #[test]
    fn suggest_prefers_substring_match() {
        let available = vec!["progressStore", "progressTracker"];
        let suggestions = suggest_similar("Tracker", &available, 3);
        assert_eq!(suggestions, vec![1]);
    }

    #[test]
    fn suggest_skips_exact_name() {
        let available = vec!["storage"];
        assert!(suggest_similar("storage", &available, 3).is_empty());
    }

    #[test]
    fn suggest_respects_limit() {
        let available = vec!["quizA", "quizB", "quizC"];
        assert_eq!(suggest_similar("quiz", &available, 2).len(), 2);
        assert!(suggest_similar("quiz", &available, 0).is_empty());
    }

    #[test]
    fn suggest_no_match() {
        let available = vec!["storage"];
        let suggestions = suggest_similar("XyzAbcDef", &available, 3);
        assert!(suggestions.is_empty());
    }
}
