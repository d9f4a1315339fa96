use crate::crosstab::formatted_rows;
use crate::error::{FormatSnafu, JsonSnafu, OutputResult, WriteCsvSnafu, WriteFileSnafu};
use crate::reports::{DimensionTable, ExportDocument, InteractiveReport, SectionBody};
use crate::types::{CrossTabTable, OverviewRow};
use crate::util::escape_html;
use serde::Serialize;
use serde_json::{json, Value as JSValue};
use snafu::ResultExt;
use std::fmt::Write as _;
use tabled::{builder::Builder, settings::Style, Table};

pub fn write_json<T: Serialize>(path: &str, value: &T) -> OutputResult<()> {
    let s = serde_json::to_string_pretty(value).context(JsonSnafu)?;
    std::fs::write(path, s).context(WriteFileSnafu { path })?;
    Ok(())
}

pub fn write_bytes(path: &str, bytes: &[u8]) -> OutputResult<()> {
    std::fs::write(path, bytes).context(WriteFileSnafu { path })
}

/// Markdown rendering of one cross-tab for the console.
pub fn render_crosstab(table: &CrossTabTable) -> String {
    let mut builder = Builder::default();
    builder.push_record(table.header());
    for row in formatted_rows(table) {
        builder.push_record(row);
    }
    builder.build().with(Style::markdown()).to_string()
}

pub fn preview_overview(rows: &[OverviewRow]) {
    if rows.is_empty() {
        println!("No response data to display for the selected question at the state level.\n");
        return;
    }
    let table_str = Table::new(rows.to_vec()).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

fn preview_dimension(t: &DimensionTable) {
    println!("{}\n", t.dimension);
    match &t.outcome {
        Ok(table) => println!("{}\n", render_crosstab(table)),
        Err(e) => println!("Could not generate table for {}: {}\n", t.dimension, e),
    }
}

/// Prints the interactive view the way the dashboard laid it out.
pub fn preview_interactive(report: &InteractiveReport) {
    println!("State Level Overview");
    println!("Summary for: {}\n", report.question);
    preview_overview(&report.overview);

    if let Some(n) = report.notice {
        println!("Note: {}\n", n);
    }
    println!("Constituency Filter: {}", report.scope_label);
    println!("Responses: {}\n", report.vocabulary.labels().join(", "));
    for t in &report.tables {
        preview_dimension(t);
    }
}

/// Flat CSV of the export document. Tables have different widths, so each
/// table starts with its own header record.
pub fn write_csv(path: &str, doc: &ExportDocument) -> OutputResult<()> {
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .context(WriteCsvSnafu { path })?;
    for section in &doc.sections {
        match &section.body {
            SectionBody::NoData => {
                wtr.write_record([section.geography.as_str(), "No data available"])
                    .context(WriteCsvSnafu { path })?;
            }
            SectionBody::Tables(tables) => {
                for t in tables {
                    match &t.outcome {
                        Ok(table) => {
                            let mut header = vec!["Section".to_string()];
                            header.extend(table.header());
                            wtr.write_record(&header).context(WriteCsvSnafu { path })?;
                            for row in formatted_rows(table) {
                                let mut record = vec![section.geography.clone()];
                                record.extend(row);
                                wtr.write_record(&record).context(WriteCsvSnafu { path })?;
                            }
                        }
                        Err(e) => {
                            let msg = e.to_string();
                            wtr.write_record([section.geography.as_str(), t.dimension.label(), msg.as_str()])
                                .context(WriteCsvSnafu { path })?;
                        }
                    }
                }
            }
        }
    }
    wtr.flush().context(WriteFileSnafu { path })?;
    Ok(())
}

fn table_to_json(t: &DimensionTable) -> JSValue {
    match &t.outcome {
        Ok(table) => json!({
            "dimension": t.dimension.label(),
            "header": table.header(),
            "rows": formatted_rows(table),
        }),
        Err(e) => json!({
            "dimension": t.dimension.label(),
            "error": e.to_string(),
        }),
    }
}

pub fn document_to_json(doc: &ExportDocument) -> JSValue {
    let sections: Vec<JSValue> = doc
        .sections
        .iter()
        .map(|s| match &s.body {
            SectionBody::NoData => json!({"geography": s.geography, "noData": true}),
            SectionBody::Tables(tables) => json!({
                "geography": s.geography,
                "responses": s.vocabulary.labels(),
                "tables": tables.iter().map(table_to_json).collect::<Vec<_>>(),
            }),
        })
        .collect();
    json!({ "question": doc.question.column(), "sections": sections })
}

fn write_table_html(html: &mut String, table: &CrossTabTable) -> std::fmt::Result {
    writeln!(html, "<table class=\"crosstab\">")?;
    write!(html, "<thead><tr>")?;
    for h in table.header() {
        write!(html, "<th>{}</th>", escape_html(&h))?;
    }
    writeln!(html, "</tr></thead>")?;
    writeln!(html, "<tbody>")?;
    for (row, cells) in table.rows.iter().zip(formatted_rows(table)) {
        if row.grand_total {
            write!(html, "<tr class=\"grand-total\">")?;
        } else {
            write!(html, "<tr>")?;
        }
        for c in cells {
            write!(html, "<td>{}</td>", escape_html(&c))?;
        }
        writeln!(html, "</tr>")?;
    }
    writeln!(html, "</tbody>")?;
    writeln!(html, "</table>")
}

fn write_document_html(html: &mut String, doc: &ExportDocument) -> std::fmt::Result {
    let title = escape_html(doc.question.column());
    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, "<html lang=\"en\">")?;
    writeln!(html, "<head>")?;
    writeln!(html, "<meta charset=\"utf-8\"/>")?;
    writeln!(html, "<title>Survey Report: {}</title>", title)?;
    writeln!(html, "<style>")?;
    writeln!(html, "@page{{size:A4 landscape;margin:15mm;}}")?;
    writeln!(html, "body{{font-family:Arial,Helvetica,sans-serif;color:#222;font-size:11px;}}")?;
    writeln!(html, "h1{{font-size:20px;margin:0 0 8px 0;}}")?;
    writeln!(html, "h2{{font-size:16px;margin:0 0 8px 0;}}")?;
    writeln!(html, "h3{{font-size:13px;margin:14px 0 4px 0;}}")?;
    writeln!(html, "section{{page-break-before:always;break-before:page;}}")?;
    writeln!(html, "section:first-of-type{{page-break-before:auto;break-before:auto;}}")?;
    writeln!(html, ".crosstab{{border-collapse:collapse;width:100%;page-break-inside:avoid;}}")?;
    writeln!(html, ".crosstab th,.crosstab td{{border:1px solid #999;padding:3px 6px;text-align:right;}}")?;
    writeln!(html, ".crosstab th:first-child,.crosstab td:first-child{{text-align:left;}}")?;
    writeln!(html, ".crosstab thead th{{background:#dce6f1;font-weight:bold;}}")?;
    writeln!(html, ".grand-total td{{font-weight:bold;background:#f2f2f2;}}")?;
    writeln!(html, ".note{{color:#a00;font-style:italic;}}")?;
    writeln!(html, "</style>")?;
    writeln!(html, "</head>")?;
    writeln!(html, "<body>")?;

    for section in &doc.sections {
        writeln!(html, "<section>")?;
        writeln!(html, "<h1>Constituency: {}</h1>", escape_html(&section.geography))?;
        writeln!(html, "<h2>{}</h2>", title)?;
        match &section.body {
            SectionBody::NoData => {
                writeln!(html, "<p class=\"note\">No data available for this constituency.</p>")?;
            }
            SectionBody::Tables(tables) => {
                for t in tables {
                    writeln!(html, "<h3>{}</h3>", escape_html(t.dimension.label()))?;
                    match &t.outcome {
                        Ok(table) => write_table_html(html, table)?,
                        Err(e) => writeln!(html, "<p class=\"note\">{}</p>", escape_html(&e.to_string()))?,
                    }
                }
            }
        }
        writeln!(html, "</section>")?;
    }
    writeln!(html, "</body>")?;
    writeln!(html, "</html>")
}

/// Paginated, print-ready document: one page-broken section per geography.
pub fn render_document(doc: &ExportDocument) -> OutputResult<Vec<u8>> {
    let mut html = String::with_capacity(64 * 1024);
    write_document_html(&mut html, doc).context(FormatSnafu)?;
    Ok(html.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::dataset_from_str;
    use crate::reports::{assemble_export, ReportSection};
    use crate::reports::tests::SHEET;
    use crate::schema::Capabilities;
    use crate::types::{Question, Vocabulary};

    fn export() -> ExportDocument {
        let data = dataset_from_str(SHEET);
        let caps = Capabilities::detect(&data);
        assemble_export(&data, &caps, Question::VotingIntention).unwrap()
    }

    #[test]
    fn document_has_a_section_per_geography() {
        let bytes = render_document(&export()).unwrap();
        let html = String::from_utf8(bytes).unwrap();
        assert_eq!(html.matches("<section>").count(), 3);
        assert!(html.contains("<h1>Constituency: East</h1>"));
        assert!(html.contains("<tr class=\"grand-total\"><td>Grand Total</td>"));
        assert!(html.contains("<th>Total Number</th>"));
        // Religion and community are absent from the sheet.
        assert!(html.contains("Demographic column &#x27;What is your religion?&#x27; not found"));
    }

    #[test]
    fn json_mirrors_sections() {
        let js = document_to_json(&export());
        assert_eq!(js["question"], "Whom will you vote for?");
        let sections = js["sections"].as_array().unwrap();
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[1]["geography"], "North");
        assert_eq!(sections[1]["responses"], json!(["Party A", "Party B"]));
        let gender = &sections[1]["tables"][0];
        assert_eq!(
            gender["rows"].as_array().unwrap().last().unwrap(),
            &json!(["Grand Total", "3", "66.67%", "33.33%"])
        );
        assert!(sections[1]["tables"][2]["error"].is_string());
    }

    #[test]
    fn csv_export_repeats_headers_per_table() {
        let path = std::env::temp_dir().join("survey_report_csv_export_test.csv");
        let path = path.display().to_string();
        write_csv(&path, &export()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        let headers = text
            .lines()
            .filter(|l| l.starts_with("Section,What is your gender?"))
            .count();
        assert_eq!(headers, 3);
        assert!(text.contains("North,Grand Total,3,66.67%,33.33%"));
    }

    #[test]
    fn empty_section_renders_a_placeholder_everywhere() {
        let doc = ExportDocument {
            question: Question::VotingIntention,
            sections: vec![ReportSection {
                geography: "West".to_string(),
                question: Question::VotingIntention,
                vocabulary: Vocabulary::default(),
                body: SectionBody::NoData,
            }],
        };
        let html = String::from_utf8(render_document(&doc).unwrap()).unwrap();
        assert!(html.contains("<h1>Constituency: West</h1>"));
        assert!(html.contains("No data available for this constituency."));

        let js = document_to_json(&doc);
        assert_eq!(js["sections"][0]["geography"], "West");
        assert_eq!(js["sections"][0]["noData"], true);

        let path = std::env::temp_dir().join("survey_report_empty_section_test.csv");
        let path = path.display().to_string();
        write_csv(&path, &doc).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(text.trim_end(), "West,No data available");
    }

    #[test]
    fn console_table_lists_header_and_rows() {
        let doc = export();
        let SectionBody::Tables(tables) = &doc.sections[0].body else {
            panic!("East has data");
        };
        let rendered = render_crosstab(tables[0].outcome.as_ref().unwrap());
        assert!(rendered.contains("Total Number"));
        assert!(rendered.contains("Not Specified"));
        assert!(rendered.contains("Grand Total"));
    }
}
