use crate::schema::Capabilities;
use crate::types::{Dataset, Record, ALL, NOT_SPECIFIED};
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub const ALL_LABEL: &str = "All Constituencies";
pub const DEFAULT_ALL_LABEL: &str = "All Constituencies (Default - None Selected)";

/// A borrowed subset of the dataset rows that one set of tables is computed over.
#[derive(Debug, Clone)]
pub struct Scope<'a> {
    pub label: String,
    data: &'a Dataset,
    rows: Vec<&'a Record>,
}

impl<'a> Scope<'a> {
    pub fn all(data: &'a Dataset) -> Self {
        Scope::new(ALL_LABEL, data, data.rows().iter().collect())
    }

    pub fn new(label: impl Into<String>, data: &'a Dataset, rows: Vec<&'a Record>) -> Self {
        Scope {
            label: label.into(),
            data,
            rows,
        }
    }

    pub fn rows(&self) -> &[&'a Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.data.column_index(name)
    }

    /// Values of one column, row by row, `None` for blanks.
    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = Option<&'a str>> + '_ {
        self.rows
            .iter()
            .map(move |&r| r.cells.get(idx).and_then(|c| c.as_deref()))
    }
}

/// User-visible remark attached to a resolved geography selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    AllTakesPrecedence,
    NothingSelected,
    FilterUnavailable,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::AllTakesPrecedence => {
                f.write_str("Showing data for 'All' constituencies as 'All' was selected.")
            }
            Notice::NothingSelected => f.write_str(
                "No Assembly Constituency selected. Showing data for ALL constituencies by default.",
            ),
            Notice::FilterUnavailable => f.write_str(
                "Constituency data is not available in the source. Showing data for ALL constituencies.",
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Selection<'a> {
    pub scope: Scope<'a>,
    pub notice: Option<Notice>,
}

/// `["All"]` followed by every distinct geography value, sorted.
pub fn geography_options(data: &Dataset, caps: &Capabilities) -> Vec<String> {
    let mut options = vec![ALL.to_string()];
    if let Some(idx) = caps.geography_column().and_then(|c| data.column_index(c)) {
        let values: BTreeSet<&str> = data
            .rows()
            .iter()
            .filter_map(|r| r.cells.get(idx).and_then(|c| c.as_deref()))
            .collect();
        options.extend(values.into_iter().map(str::to_string));
    }
    options
}

/// Resolves an interactive geography filter. `All` wins over specific values
/// and an empty selection falls back to `All`; both carry a notice.
pub fn select_scope<'a>(data: &'a Dataset, caps: &Capabilities, selected: &[String]) -> Selection<'a> {
    let has_all = selected.iter().any(|s| s == ALL);
    if selected.is_empty() {
        warn!("{}", Notice::NothingSelected);
        return Selection {
            scope: Scope::new(DEFAULT_ALL_LABEL, data, data.rows().iter().collect()),
            notice: Some(Notice::NothingSelected),
        };
    }
    if has_all {
        let notice = (selected.len() > 1).then_some(Notice::AllTakesPrecedence);
        if let Some(n) = notice {
            info!("{}", n);
        }
        return Selection {
            scope: Scope::all(data),
            notice,
        };
    }

    let Some(idx) = caps.geography_column().and_then(|c| data.column_index(c)) else {
        warn!("{}", Notice::FilterUnavailable);
        return Selection {
            scope: Scope::all(data),
            notice: Some(Notice::FilterUnavailable),
        };
    };
    let wanted: BTreeSet<&str> = selected.iter().map(String::as_str).collect();
    let rows: Vec<&Record> = data
        .rows()
        .iter()
        .filter(|r| {
            r.cells
                .get(idx)
                .and_then(|c| c.as_deref())
                .map(|v| wanted.contains(v))
                .unwrap_or(false)
        })
        .collect();
    debug!("selection {:?} matched {} rows", selected, rows.len());
    Selection {
        scope: Scope::new(selected.join(", "), data, rows),
        notice: None,
    }
}

/// One scope per distinct geography value of the *full* dataset, in sorted
/// order. Rows without a value are grouped under `Not Specified`. Without a
/// geography column the whole dataset is the only scope.
pub fn partition_by_geography<'a>(data: &'a Dataset, caps: &Capabilities) -> Vec<Scope<'a>> {
    let Some(idx) = caps.geography_column().and_then(|c| data.column_index(c)) else {
        return vec![Scope::all(data)];
    };
    let mut groups: BTreeMap<&'a str, Vec<&'a Record>> = BTreeMap::new();
    for r in data.rows() {
        let key = r
            .cells
            .get(idx)
            .and_then(|c| c.as_deref())
            .unwrap_or(NOT_SPECIFIED);
        groups.entry(key).or_default().push(r);
    }
    groups
        .into_iter()
        .map(|(label, rows)| Scope::new(label, data, rows))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::dataset_from_str;

    const SHEET: &str = "AC Name,Whom will you vote for?\n\
                         South,A\n\
                         North,B\n\
                         North,A\n\
                         ,A\n\
                         East,B\n";

    fn sel(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn all_with_other_values_collapses_to_all() {
        let data = dataset_from_str(SHEET);
        let caps = Capabilities::detect(&data);
        let s = select_scope(&data, &caps, &sel(&["All", "North"]));
        assert_eq!(s.notice, Some(Notice::AllTakesPrecedence));
        assert_eq!(s.scope.len(), 5);
        assert_eq!(s.scope.label, ALL_LABEL);
    }

    #[test]
    fn empty_selection_behaves_like_all_with_a_warning() {
        let data = dataset_from_str(SHEET);
        let caps = Capabilities::detect(&data);
        let empty = select_scope(&data, &caps, &[]);
        let all = select_scope(&data, &caps, &sel(&["All"]));
        assert_eq!(empty.notice, Some(Notice::NothingSelected));
        assert_eq!(all.notice, None);
        assert_eq!(empty.scope.len(), all.scope.len());
        assert_eq!(empty.scope.label, DEFAULT_ALL_LABEL);
    }

    #[test]
    fn specific_values_restrict_to_their_union() {
        let data = dataset_from_str(SHEET);
        let caps = Capabilities::detect(&data);
        let s = select_scope(&data, &caps, &sel(&["North", "East"]));
        assert_eq!(s.scope.len(), 3);
        assert_eq!(s.scope.label, "North, East");
        assert_eq!(s.notice, None);

        let none = select_scope(&data, &caps, &sel(&["Nowhere"]));
        assert!(none.scope.is_empty());
    }

    #[test]
    fn filter_degrades_without_geography_column() {
        let data = dataset_from_str("Whom will you vote for?\nA\nB\n");
        let caps = Capabilities::detect(&data);
        let s = select_scope(&data, &caps, &sel(&["North"]));
        assert_eq!(s.notice, Some(Notice::FilterUnavailable));
        assert_eq!(s.scope.len(), 2);
        assert_eq!(geography_options(&data, &caps), vec!["All".to_string()]);
        assert_eq!(partition_by_geography(&data, &caps).len(), 1);
    }

    #[test]
    fn options_are_sorted_after_all() {
        let data = dataset_from_str(SHEET);
        let caps = Capabilities::detect(&data);
        assert_eq!(
            geography_options(&data, &caps),
            sel(&["All", "East", "North", "South"])
        );
    }

    #[test]
    fn partition_covers_every_value() {
        let data = dataset_from_str(SHEET);
        let caps = Capabilities::detect(&data);
        let parts = partition_by_geography(&data, &caps);
        let labels: Vec<&str> = parts.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["East", "North", "Not Specified", "South"]);
        assert_eq!(parts.iter().map(Scope::len).sum::<usize>(), data.len());
    }
}
