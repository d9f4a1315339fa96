use crate::scope::Scope;
use crate::types::{Question, Vocabulary, NOT_ANSWERED};
use std::collections::BTreeSet;

/// Response label of one cell: blanks count as `Not Answered`.
pub fn response_label(cell: Option<&str>) -> &str {
    cell.unwrap_or(NOT_ANSWERED)
}

/// Ordered response columns for `question` over `scope`.
///
/// The question with a fixed order always starts `No`, `Yes` and gains
/// `Not Answered` only when that label was seen, either as a blank cell or
/// as the literal answer. Every other question gets its observed labels in
/// byte order. An empty scope, or one without the question column, yields an
/// empty vocabulary.
pub fn resolve(scope: &Scope<'_>, question: Question) -> Vocabulary {
    let Some(idx) = scope.column_index(question.column()) else {
        return Vocabulary::default();
    };
    if scope.is_empty() {
        return Vocabulary::default();
    }

    match question.fixed_order() {
        Some(prefix) => {
            let mut labels: Vec<String> = prefix.iter().map(|s| s.to_string()).collect();
            let saw_not_answered = scope
                .column_values(idx)
                .map(response_label)
                .any(|l| l == NOT_ANSWERED);
            if saw_not_answered && !labels.iter().any(|l| l == NOT_ANSWERED) {
                labels.push(NOT_ANSWERED.to_string());
            }
            Vocabulary(labels)
        }
        None => {
            let observed: BTreeSet<&str> = scope.column_values(idx).map(response_label).collect();
            Vocabulary(observed.into_iter().map(str::to_string).collect())
        }
    }
}

/// Like [`resolve`], but falls back to `default` (typically the vocabulary of
/// a wider scope) when the scope yields nothing.
pub fn resolve_or(scope: &Scope<'_>, question: Question, default: &Vocabulary) -> Vocabulary {
    let v = resolve(scope, question);
    if v.is_empty() {
        default.clone()
    } else {
        v
    }
}
