use crate::crosstab::{build_with_total, grand_total_row, overview};
use crate::error::{EmptyDatasetSnafu, QuestionUnavailableSnafu, ReportResult, TableError};
use crate::schema::Capabilities;
use crate::scope::{partition_by_geography, select_scope, Notice, Scope};
use crate::types::{CrossTabTable, Dataset, Dimension, OverviewRow, Question, Vocabulary};
use crate::vocabulary::{resolve, resolve_or};
use log::{debug, info, warn};
use snafu::ensure;

/// Outcome of one demographic table: the table, or why it could not be built.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionTable {
    pub dimension: Dimension,
    pub outcome: Result<CrossTabTable, TableError>,
}

#[derive(Debug, Clone)]
pub struct InteractiveReport {
    pub question: Question,
    pub scope_label: String,
    pub notice: Option<Notice>,
    /// State level overview. Always over the full dataset.
    pub overview: Vec<OverviewRow>,
    pub vocabulary: Vocabulary,
    pub tables: Vec<DimensionTable>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectionBody {
    NoData,
    Tables(Vec<DimensionTable>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSection {
    pub geography: String,
    pub question: Question,
    pub vocabulary: Vocabulary,
    pub body: SectionBody,
}

#[derive(Debug, Clone)]
pub struct ExportDocument {
    pub question: Question,
    pub sections: Vec<ReportSection>,
}

fn check_request(data: &Dataset, caps: &Capabilities, question: Question) -> ReportResult<()> {
    ensure!(!data.is_empty(), EmptyDatasetSnafu {});
    ensure!(
        caps.has_question(question),
        QuestionUnavailableSnafu {
            question: question.column()
        }
    );
    Ok(())
}

/// Builds a table per dimension over one scope, each ending in the same
/// scope-wide grand total row.
fn tables_for_scope(
    scope: &Scope<'_>,
    question: Question,
    dimensions: &[Dimension],
    vocab: &Vocabulary,
) -> Vec<DimensionTable> {
    let grand_total = grand_total_row(scope, question, vocab);
    dimensions
        .iter()
        .map(|&dimension| {
            let outcome = build_with_total(scope, question, dimension, vocab, &grand_total);
            if let Err(e) = &outcome {
                warn!("Could not generate table for {} in {}: {}", dimension, scope.label, e);
            }
            DimensionTable { dimension, outcome }
        })
        .collect()
}

/// Tables for the interactive view: one scope chosen by `selected`.
pub fn assemble_interactive(
    data: &Dataset,
    caps: &Capabilities,
    question: Question,
    selected: &[String],
) -> ReportResult<InteractiveReport> {
    check_request(data, caps, question)?;

    let everything = Scope::all(data);
    let global_vocab = resolve(&everything, question);
    let overview = overview(&everything, question, &global_vocab);

    let selection = select_scope(data, caps, selected);
    let vocab = resolve_or(&selection.scope, question, &global_vocab);
    debug!(
        "interactive scope '{}' ({} rows), vocabulary {:?}",
        selection.scope.label,
        selection.scope.len(),
        vocab.labels()
    );
    let tables = tables_for_scope(&selection.scope, question, caps.dimensions(), &vocab);

    Ok(InteractiveReport {
        question,
        scope_label: selection.scope.label.clone(),
        notice: selection.notice,
        overview,
        vocabulary: vocab,
        tables,
    })
}

/// One section per geography value of the full dataset, whatever the
/// interactive filter currently shows. Each section resolves its own
/// vocabulary and grand total. Every candidate dimension is listed; absent
/// columns come back as placeholder errors.
pub fn assemble_export(
    data: &Dataset,
    caps: &Capabilities,
    question: Question,
) -> ReportResult<ExportDocument> {
    check_request(data, caps, question)?;

    let global_vocab = resolve(&Scope::all(data), question);
    let sections: Vec<ReportSection> = partition_by_geography(data, caps)
        .into_iter()
        .map(|scope| {
            // Partitions are grouped from existing rows and never come back empty.
            if scope.is_empty() {
                return ReportSection {
                    geography: scope.label.clone(),
                    question,
                    vocabulary: Vocabulary::default(),
                    body: SectionBody::NoData,
                };
            }
            let vocab = resolve_or(&scope, question, &global_vocab);
            let tables = tables_for_scope(&scope, question, &Dimension::ALL, &vocab);
            ReportSection {
                geography: scope.label.clone(),
                question,
                vocabulary: vocab,
                body: SectionBody::Tables(tables),
            }
        })
        .collect();
    let placeholders = Dimension::ALL
        .iter()
        .filter(|d| !caps.has_dimension(**d))
        .count();
    info!(
        "export of '{}': {} sections, {} demographic tables per section as placeholders",
        question,
        sections.len(),
        placeholders
    );

    Ok(ExportDocument { question, sections })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::crosstab::formatted_rows;
    use crate::error::ReportError;
    use crate::loader::dataset_from_str;

    pub(crate) const SHEET: &str = "\
AC Name,Do you know who the KPCC President is?,Whom will you vote for?,What is your gender?,What is your age?
North,Yes,Party A,Male,18-25
North,No,Party B,Female,26-35
North,Yes,Party A,Female,18-25
South,No,Party C,Male,36-45
South,,Party A,Male,26-35
East,Yes,Party B,,18-25
";

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    fn table(t: &DimensionTable) -> &CrossTabTable {
        t.outcome.as_ref().expect("table built")
    }

    #[test]
    fn interactive_report_uses_present_dimensions() {
        let data = dataset_from_str(SHEET);
        let caps = Capabilities::detect(&data);
        let r = assemble_interactive(&data, &caps, Question::VotingIntention, &s(&["All"]))
            .unwrap();
        let dims: Vec<Dimension> = r.tables.iter().map(|t| t.dimension).collect();
        assert_eq!(dims, vec![Dimension::Gender, Dimension::Age]);
        assert_eq!(r.scope_label, "All Constituencies");
        assert_eq!(r.notice, None);
        for t in &r.tables {
            let gt = table(t).grand_total().unwrap();
            assert_eq!(gt.total, 6);
        }
        // Every table repeats the identical grand total row.
        assert_eq!(table(&r.tables[0]).rows.last(), table(&r.tables[1]).rows.last());
    }

    #[test]
    fn interactive_filter_recomputes_vocabulary_and_total() {
        let data = dataset_from_str(SHEET);
        let caps = Capabilities::detect(&data);
        let r = assemble_interactive(&data, &caps, Question::VotingIntention, &s(&["North"]))
            .unwrap();
        assert_eq!(r.scope_label, "North");
        assert_eq!(r.vocabulary.labels(), &["Party A", "Party B"]);
        let gt = table(&r.tables[0]).grand_total().unwrap().clone();
        assert_eq!(gt.total, 3);
        assert_eq!(
            formatted_rows(table(&r.tables[0])).last().unwrap(),
            &vec!["Grand Total", "3", "66.67%", "33.33%"]
        );
        // The overview still covers the whole state.
        assert_eq!(r.overview.iter().map(|o| o.count).sum::<usize>(), 6);
    }

    #[test]
    fn unmatched_filter_falls_back_to_global_vocabulary() {
        let data = dataset_from_str(SHEET);
        let caps = Capabilities::detect(&data);
        let r = assemble_interactive(&data, &caps, Question::VotingIntention, &s(&["West"]))
            .unwrap();
        assert_eq!(r.vocabulary.labels(), &["Party A", "Party B", "Party C"]);
        let rows = formatted_rows(table(&r.tables[0]));
        assert_eq!(rows, vec![vec!["Grand Total", "0", "0.00%", "0.00%", "0.00%"]]);
    }

    #[test]
    fn export_covers_every_geography_regardless_of_filter() {
        let data = dataset_from_str(SHEET);
        let caps = Capabilities::detect(&data);
        // An interactive request restricted to one value has no effect on export.
        let r = assemble_interactive(&data, &caps, Question::VotingIntention, &s(&["North"]))
            .unwrap();
        assert_eq!(r.scope_label, "North");
        let doc = assemble_export(&data, &caps, Question::VotingIntention).unwrap();
        let geos: Vec<&str> = doc.sections.iter().map(|s| s.geography.as_str()).collect();
        assert_eq!(geos, vec!["East", "North", "South"]);
    }

    #[test]
    fn export_sections_have_independent_vocabularies() {
        let data = dataset_from_str(SHEET);
        let caps = Capabilities::detect(&data);
        let doc = assemble_export(&data, &caps, Question::VotingIntention).unwrap();
        let south = doc.sections.iter().find(|s| s.geography == "South").unwrap();
        assert_eq!(south.vocabulary.labels(), &["Party A", "Party C"]);
        let SectionBody::Tables(tables) = &south.body else {
            panic!("South has data");
        };
        assert_eq!(tables.len(), Dimension::ALL.len());
        let gender = table(&tables[0]);
        assert_eq!(gender.grand_total().unwrap().total, 2);
        assert_eq!(gender.header().len(), 4);
    }

    #[test]
    fn export_marks_missing_dimensions_in_place() {
        let data = dataset_from_str(SHEET);
        let caps = Capabilities::detect(&data);
        let doc = assemble_export(&data, &caps, Question::KnowsKpccPresident).unwrap();
        for section in &doc.sections {
            let SectionBody::Tables(tables) = &section.body else {
                panic!("every section has data");
            };
            let religion = tables
                .iter()
                .find(|t| t.dimension == Dimension::Religion)
                .unwrap();
            assert!(matches!(
                religion.outcome,
                Err(TableError::MissingColumn { .. })
            ));
            assert!(tables
                .iter()
                .find(|t| t.dimension == Dimension::Gender)
                .unwrap()
                .outcome
                .is_ok());
        }
    }

    #[test]
    fn empty_dataset_declines_the_report() {
        let data = dataset_from_str("Whom will you vote for?\n");
        let caps = Capabilities::detect(&data);
        assert!(matches!(
            assemble_interactive(&data, &caps, Question::VotingIntention, &[]),
            Err(ReportError::EmptyDataset {})
        ));
        assert!(matches!(
            assemble_export(&data, &caps, Question::VotingIntention),
            Err(ReportError::EmptyDataset {})
        ));
    }

    #[test]
    fn unknown_question_is_rejected() {
        let data = dataset_from_str(SHEET);
        let caps = Capabilities::detect(&data);
        assert!(matches!(
            assemble_interactive(&data, &caps, Question::NameThePerson, &[]),
            Err(ReportError::QuestionUnavailable { .. })
        ));
    }
}
