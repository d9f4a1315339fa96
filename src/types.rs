use std::collections::HashMap;
use std::fmt;
use tabled::Tabled;

/// Label substituted for a blank answer to a survey question.
pub const NOT_ANSWERED: &str = "Not Answered";
/// Label substituted for a blank demographic value.
pub const NOT_SPECIFIED: &str = "Not Specified";
pub const GRAND_TOTAL: &str = "Grand Total";
pub const TOTAL_NUMBER: &str = "Total Number";
/// Sentinel geography selection meaning "no filtering".
pub const ALL: &str = "All";
pub const GEOGRAPHY_COLUMN: &str = "AC Name";

/// The survey questions the report knows how to tabulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Question {
    KnowsKpccPresident,
    NameThePerson,
    FavoriteChiefMinister,
    ConstituencyWinner,
    StateAssemblyWinner,
    VotingIntention,
}

impl Question {
    pub const ALL: [Question; 6] = [
        Question::KnowsKpccPresident,
        Question::NameThePerson,
        Question::FavoriteChiefMinister,
        Question::ConstituencyWinner,
        Question::StateAssemblyWinner,
        Question::VotingIntention,
    ];

    /// Column header of the question in the source sheet.
    pub fn column(self) -> &'static str {
        match self {
            Question::KnowsKpccPresident => "Do you know who the KPCC President is?",
            Question::NameThePerson => "Can you name the person?",
            Question::FavoriteChiefMinister => "Who is your favorite candidate for Chief Minister?",
            Question::ConstituencyWinner => "Who do you think will win in your constituency?",
            Question::StateAssemblyWinner => {
                "Who do you think will win the overall State Assembly Elections?"
            }
            Question::VotingIntention => "Whom will you vote for?",
        }
    }

    /// Fixed leading responses, for the one question whose columns must read `No`, `Yes`.
    pub fn fixed_order(self) -> Option<&'static [&'static str]> {
        match self {
            Question::KnowsKpccPresident => Some(&["No", "Yes"]),
            _ => None,
        }
    }

    pub fn from_column(text: &str) -> Option<Question> {
        Question::ALL.into_iter().find(|q| q.column() == text.trim())
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Demographic columns every table is broken down by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Gender,
    Age,
    Religion,
    Community,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Gender,
        Dimension::Age,
        Dimension::Religion,
        Dimension::Community,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Dimension::Gender => "What is your gender?",
            Dimension::Age => "What is your age?",
            Dimension::Religion => "What is your religion?",
            Dimension::Community => "What is your community?",
        }
    }

    /// Header of the first table column. Same as the sheet column today.
    pub fn label(self) -> &'static str {
        self.column()
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One respondent: a cell per dataset column, `None` when blank.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub cells: Vec<Option<String>>,
}

/// Normalized survey sheet. Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Record>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Record>) -> Self {
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Dataset { columns, index, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }
}

/// Ordered, deduplicated response labels for one (question, scope) pair.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Vocabulary(pub Vec<String>);

impl Vocabulary {
    pub fn labels(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.0.iter().position(|l| l == label)
    }
}

/// One body row of a cross-tab. Counts stay numeric until formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub label: String,
    pub total: usize,
    pub counts: Vec<usize>,
    pub percentages: Vec<f64>,
    pub grand_total: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrossTabTable {
    pub dimension: Dimension,
    pub vocabulary: Vocabulary,
    pub rows: Vec<TableRow>,
}

impl CrossTabTable {
    /// `[dimension label, Total Number, "<response> %"...]`
    pub fn header(&self) -> Vec<String> {
        let mut header = vec![self.dimension.label().to_string(), TOTAL_NUMBER.to_string()];
        header.extend(self.vocabulary.labels().iter().map(|r| format!("{} %", r)));
        header
    }

    #[cfg(test)]
    pub fn grand_total(&self) -> Option<&TableRow> {
        self.rows.iter().find(|r| r.grand_total)
    }
}

/// Response / Count / Percentage line of the state level overview.
#[derive(Debug, Clone, Tabled, PartialEq)]
pub struct OverviewRow {
    #[tabled(rename = "Response")]
    pub response: String,
    #[tabled(rename = "Count")]
    pub count: usize,
    #[tabled(rename = "Percentage")]
    pub percentage: String,
}
