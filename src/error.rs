use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum LoadError {
    #[snafu(display("Error opening survey file {path}"))]
    OpenFile { source: std::io::Error, path: String },
    #[snafu(display("Could not read the header row of {path}"))]
    ReadHeaders { source: csv::Error, path: String },
}

/// Failure local to one demographic table. Rendered in place of the table.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum TableError {
    #[snafu(display("Demographic column '{column}' not found in the data"))]
    MissingColumn { column: String },
    #[snafu(display("Question column '{column}' not found in the data"))]
    MissingQuestion { column: String },
    #[snafu(display("No response categories available for '{column}'"))]
    EmptyVocabulary { column: String },
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ReportError {
    #[snafu(display("Could not load survey data. No report possible."))]
    EmptyDataset {},
    #[snafu(display("Selected question '{question}' not found in the data"))]
    QuestionUnavailable { question: String },
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum OutputError {
    #[snafu(display("Could not write {path}"))]
    WriteFile { source: std::io::Error, path: String },
    #[snafu(display("Could not write CSV to {path}"))]
    WriteCsv { source: csv::Error, path: String },
    #[snafu(display("Could not serialize the report"))]
    Json { source: serde_json::Error },
    #[snafu(display("Could not format the document"))]
    Format { source: std::fmt::Error },
}

pub type LoadResult<T> = Result<T, LoadError>;
pub type ReportResult<T> = Result<T, ReportError>;
pub type OutputResult<T> = Result<T, OutputError>;
