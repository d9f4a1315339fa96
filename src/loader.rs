use crate::error::{LoadResult, OpenFileSnafu, ReadHeadersSnafu};
use crate::types::{Dataset, Record};
use csv::ReaderBuilder;
use log::{debug, warn};
use snafu::ResultExt;
use std::fs::File;
use std::io::Read;

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
}

pub fn load_and_clean(path: &str) -> LoadResult<(Dataset, LoadReport)> {
    let file = File::open(path).context(OpenFileSnafu { path })?;
    load_from_reader(file, path)
}

/// Same as [`load_and_clean`] over any byte source; `source` only labels errors.
pub fn load_from_reader<R: Read>(reader: R, source: &str) -> LoadResult<(Dataset, LoadReport)> {
    let rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    read_dataset(rdr, source)
}

fn read_dataset<R: Read>(mut rdr: csv::Reader<R>, source: &str) -> LoadResult<(Dataset, LoadReport)> {
    let columns: Vec<String> = rdr
        .headers()
        .context(ReadHeadersSnafu { path: source })?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    debug!("columns of {}: {:?}", source, columns);

    let mut total_rows = 0usize;
    let mut parse_errors = 0usize;
    let mut rows: Vec<Record> = Vec::new();
    for result in rdr.records() {
        total_rows += 1;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("skipping row {} of {}: {}", total_rows, source, e);
                parse_errors += 1;
                continue;
            }
        };
        // Short rows are padded so every record has one cell per column.
        let cells = (0..columns.len())
            .map(|i| normalize_cell(record.get(i)))
            .collect();
        rows.push(Record { cells });
    }

    let dataset = Dataset::new(columns, rows);
    let report = LoadReport {
        total_rows,
        loaded_rows: dataset.len(),
        parse_errors,
    };
    Ok((dataset, report))
}

/// Trims a cell; blank cells become missing.
pub fn normalize_cell(raw: Option<&str>) -> Option<String> {
    let s = raw?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
pub(crate) fn dataset_from_str(text: &str) -> Dataset {
    load_from_reader(text.as_bytes(), "inline")
        .expect("inline fixture parses")
        .0
}
