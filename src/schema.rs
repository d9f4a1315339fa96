// Single column-presence pass over a loaded dataset. Downstream code asks the
// descriptor instead of probing the dataset's headers itself.
use crate::types::{Dataset, Dimension, Question, GEOGRAPHY_COLUMN};
use log::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    questions: Vec<Question>,
    dimensions: Vec<Dimension>,
    geography: Option<String>,
}

impl Capabilities {
    pub fn detect(data: &Dataset) -> Self {
        Self::detect_with_geography(data, GEOGRAPHY_COLUMN)
    }

    pub fn detect_with_geography(data: &Dataset, geography_column: &str) -> Self {
        let questions: Vec<Question> = Question::ALL
            .into_iter()
            .filter(|q| data.has_column(q.column()))
            .collect();
        let dimensions: Vec<Dimension> = Dimension::ALL
            .into_iter()
            .filter(|d| data.has_column(d.column()))
            .collect();
        let geography = data
            .has_column(geography_column)
            .then(|| geography_column.to_string());

        for d in Dimension::ALL.iter().filter(|d| !dimensions.contains(d)) {
            warn!("Demographic column '{}' not found in the data", d.column());
        }
        if geography.is_none() {
            warn!(
                "Geography column '{}' not found; filtering disabled",
                geography_column
            );
        }
        debug!(
            "{} questions, {} dimensions available among {:?}",
            questions.len(),
            dimensions.len(),
            data.columns()
        );
        Capabilities {
            questions,
            dimensions,
            geography,
        }
    }

    pub fn has_question(&self, q: Question) -> bool {
        self.questions.contains(&q)
    }

    pub fn has_dimension(&self, d: Dimension) -> bool {
        self.dimensions.contains(&d)
    }

    pub fn has_geography(&self) -> bool {
        self.geography.is_some()
    }

    /// Selectable questions, in menu order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn geography_column(&self) -> Option<&str> {
        self.geography.as_deref()
    }
}
