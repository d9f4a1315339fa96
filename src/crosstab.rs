use crate::error::{EmptyVocabularySnafu, MissingColumnSnafu, MissingQuestionSnafu, TableError};
use crate::scope::Scope;
use crate::types::{
    CrossTabTable, Dimension, OverviewRow, Question, TableRow, Vocabulary, GRAND_TOTAL,
    NOT_SPECIFIED,
};
use crate::util::{format_percent, percentage};
use crate::vocabulary::response_label;
use snafu::{ensure, OptionExt};
use std::collections::BTreeMap;

/// Count of each vocabulary entry among `values`. Labels outside the
/// vocabulary are not counted.
fn count_responses<'v, I>(values: I, vocab: &Vocabulary) -> Vec<usize>
where
    I: Iterator<Item = Option<&'v str>>,
{
    let mut counts = vec![0usize; vocab.len()];
    for v in values {
        if let Some(pos) = vocab.position(response_label(v)) {
            counts[pos] += 1;
        }
    }
    counts
}

fn tally_row(label: &str, counts: Vec<usize>, total: usize, grand_total: bool) -> TableRow {
    let percentages = counts.iter().map(|c| percentage(*c, total)).collect();
    TableRow {
        label: label.to_string(),
        total,
        counts,
        percentages,
        grand_total,
    }
}

/// One row per demographic value of `dimension` in the scope, sorted by
/// value, with `Total Number` and a percentage per vocabulary entry. The
/// grand total row is not included; see [`grand_total_row`].
pub fn build(
    scope: &Scope<'_>,
    question: Question,
    dimension: Dimension,
    vocab: &Vocabulary,
) -> Result<CrossTabTable, TableError> {
    let q_idx = scope
        .column_index(question.column())
        .context(MissingQuestionSnafu {
            column: question.column(),
        })?;
    let d_idx = scope
        .column_index(dimension.column())
        .context(MissingColumnSnafu {
            column: dimension.column(),
        })?;
    ensure!(
        !vocab.is_empty(),
        EmptyVocabularySnafu {
            column: question.column()
        }
    );

    let mut groups: BTreeMap<&str, Vec<Option<&str>>> = BTreeMap::new();
    for r in scope.rows() {
        let demo = r
            .cells
            .get(d_idx)
            .and_then(|c| c.as_deref())
            .unwrap_or(NOT_SPECIFIED);
        let answer = r.cells.get(q_idx).and_then(|c| c.as_deref());
        groups.entry(demo).or_default().push(answer);
    }

    let rows = groups
        .into_iter()
        .map(|(label, answers)| {
            let counts = count_responses(answers.into_iter(), vocab);
            let total = counts.iter().sum();
            tally_row(label, counts, total, false)
        })
        .collect();

    Ok(CrossTabTable {
        dimension,
        vocabulary: vocab.clone(),
        rows,
    })
}

/// Scope-wide summary row. Computed from the question column directly, never
/// from the per-category rows, with the scope size as `Total Number`.
pub fn grand_total_row(scope: &Scope<'_>, question: Question, vocab: &Vocabulary) -> TableRow {
    let counts = match scope.column_index(question.column()) {
        Some(idx) => count_responses(scope.column_values(idx), vocab),
        None => vec![0; vocab.len()],
    };
    tally_row(GRAND_TOTAL, counts, scope.len(), true)
}

/// Builds the table for one dimension and appends the scope's grand total.
pub fn build_with_total(
    scope: &Scope<'_>,
    question: Question,
    dimension: Dimension,
    vocab: &Vocabulary,
    grand_total: &TableRow,
) -> Result<CrossTabTable, TableError> {
    let mut table = build(scope, question, dimension, vocab)?;
    table.rows.push(grand_total.clone());
    Ok(table)
}

/// `Response | Count | Percentage` over the whole scope, in vocabulary order.
pub fn overview(scope: &Scope<'_>, question: Question, vocab: &Vocabulary) -> Vec<OverviewRow> {
    if scope.is_empty() {
        return Vec::new();
    }
    let row = grand_total_row(scope, question, vocab);
    vocab
        .labels()
        .iter()
        .zip(row.counts.iter().zip(row.percentages.iter()))
        .map(|(response, (count, pct))| OverviewRow {
            response: response.clone(),
            count: *count,
            percentage: format_percent(*pct),
        })
        .collect()
}

/// Display cells of a finished table, percentages formatted.
pub fn formatted_rows(table: &CrossTabTable) -> Vec<Vec<String>> {
    table
        .rows
        .iter()
        .map(|r| {
            let mut cells = vec![r.label.clone(), r.total.to_string()];
            cells.extend(r.percentages.iter().map(|p| format_percent(*p)));
            cells
        })
        .collect()
}
