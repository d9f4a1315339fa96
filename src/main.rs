// Entry point and high-level CLI flow.
//
// The menu mirrors the hosted survey dashboard:
// - [1] (re)loads the sheet and prints load diagnostics,
// - [2] and [3] pick the question and the constituency filter,
// - [4] prints the overview and one table per demographic,
// - [5] writes the per-constituency export documents.
// `--batch` runs [4] (and [5] with `--export`) once and exits.
mod args;
mod cache;
mod crosstab;
mod error;
mod loader;
mod output;
mod reports;
mod schema;
mod scope;
mod types;
mod util;
mod vocabulary;

use args::Args;
use cache::DatasetCache;
use chrono::{Duration, Utc};
use clap::Parser;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use schema::Capabilities;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use types::{Dataset, Question, ALL};

// Loaded sheets and the current selection, shared by every menu action.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        cache: DatasetCache::default(),
        source: String::new(),
        export_dir: String::from("."),
        question: None,
        selected: vec![ALL.to_string()],
    })
});

struct AppState {
    cache: DatasetCache,
    source: String,
    export_dir: String,
    question: Option<Question>,
    selected: Vec<String>,
}

fn state() -> MutexGuard<'static, AppState> {
    // The state holds plain data; a panic elsewhere does not make it invalid.
    APP_STATE.lock().unwrap_or_else(|e| e.into_inner())
}

/// One trimmed line, or `None` once the input is closed or unreadable.
fn read_line_from<R: BufRead>(input: &mut R) -> Option<String> {
    let mut buf = String::new();
    match input.read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Read a single line of input after printing the common "Enter choice:" prompt.
fn read_choice() -> Option<String> {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    read_line_from(&mut io::stdin().lock())
}

/// Ask the user whether to go back to the menu after a report.
///
/// Returns `true` if the user chose `Y`, `false` if they chose `N` or the
/// input ended.
fn prompt_back_to_menu() -> bool {
    back_to_menu_from(&mut io::stdin().lock())
}

fn back_to_menu_from<R: BufRead>(input: &mut R) -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let Some(resp) = read_line_from(input) else {
            return false;
        };
        match resp.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Returns the normalized sheet, reading it again when the cached copy is
/// stale. Load failures and empty sheets are reported and yield `None`.
fn current_dataset() -> Option<Arc<Dataset>> {
    let mut st = state();
    let source = st.source.clone();
    let loaded = st.cache.get_or_refresh(&source, Utc::now(), |path| {
        let (data, load_report) = loader::load_and_clean(path)?;
        println!(
            "Processing dataset... ({} rows read, {} loaded)",
            util::format_int(load_report.total_rows),
            util::format_int(load_report.loaded_rows)
        );
        if load_report.parse_errors > 0 {
            println!(
                "Note: {} rows skipped due to parse errors.",
                util::format_int(load_report.parse_errors)
            );
        }
        println!();
        Ok(data)
    });
    match loaded {
        Ok(data) if data.is_empty() => {
            println!("{}\n", error::ReportError::EmptyDataset {});
            None
        }
        Ok(data) => Some(data),
        Err(e) => {
            warn!("load of {} failed: {:?}", source, e);
            println!("Error loading data: {}", e);
            println!("Could not load survey data. Please check the file path and format.\n");
            None
        }
    }
}

/// Menu number (1-based, among available questions) or exact question text.
fn parse_question(text: &str, caps: &Capabilities) -> Option<Question> {
    if let Ok(n) = text.trim().parse::<usize>() {
        return n.checked_sub(1).and_then(|i| caps.questions().get(i).copied());
    }
    Question::from_column(text).filter(|q| caps.has_question(*q))
}

/// The chosen question, defaulting to the first one present in the sheet.
fn active_question(caps: &Capabilities) -> Option<Question> {
    let chosen = state().question.filter(|q| caps.has_question(*q));
    let q = chosen.or_else(|| caps.questions().first().copied());
    if q.is_none() {
        println!("No recognized survey question found in the data.\n");
    }
    q
}

fn handle_load() {
    {
        let mut st = state();
        let source = st.source.clone();
        st.cache.invalidate(&source);
    }
    if let Some(data) = current_dataset() {
        let caps = Capabilities::detect(&data);
        println!(
            "{} questions and {} demographic columns available.\n",
            caps.questions().len(),
            caps.dimensions().len()
        );
    }
}

fn handle_select_question() {
    let Some(data) = current_dataset() else { return };
    let caps = Capabilities::detect(&data);
    println!("Select Survey Question:");
    for (i, q) in caps.questions().iter().enumerate() {
        println!("[{}] {}", i + 1, q);
    }
    let Some(choice) = read_choice() else { return };
    match parse_question(&choice, &caps) {
        Some(q) => {
            println!("Selected: {}\n", q);
            state().question = Some(q);
        }
        None => println!("Invalid choice.\n"),
    }
}

fn handle_select_geography() {
    let Some(data) = current_dataset() else { return };
    let caps = Capabilities::detect(&data);
    if !caps.has_geography() {
        println!("{}\n", scope::Notice::FilterUnavailable);
        return;
    }
    let options = scope::geography_options(&data, &caps);
    println!("Select Assembly Constituency (comma-separated numbers; 'All' for overall):");
    for (i, o) in options.iter().enumerate() {
        println!("[{}] {}", i + 1, o);
    }
    let Some(input) = read_choice() else { return };
    let mut selected = Vec::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.parse::<usize>().ok().and_then(|n| n.checked_sub(1)).and_then(|i| options.get(i)) {
            Some(o) => selected.push(o.clone()),
            None => println!("Ignoring unknown choice '{}'.", part),
        }
    }
    debug!("geography selection: {:?}", selected);
    println!();
    state().selected = selected;
}

fn handle_show_tables() {
    let Some(data) = current_dataset() else { return };
    let caps = Capabilities::detect(&data);
    let Some(question) = active_question(&caps) else { return };
    let selected = state().selected.clone();
    match reports::assemble_interactive(&data, &caps, question, &selected) {
        Ok(report) => output::preview_interactive(&report),
        Err(e) => println!("{}\n", e),
    }
}

fn handle_export() {
    let Some(data) = current_dataset() else { return };
    let caps = Capabilities::detect(&data);
    let Some(question) = active_question(&caps) else { return };
    let doc = match reports::assemble_export(&data, &caps, question) {
        Ok(doc) => doc,
        Err(e) => {
            println!("{}\n", e);
            return;
        }
    };
    let dir = state().export_dir.clone();
    let path_for = |ext: &str| {
        Path::new(&dir)
            .join(util::export_file_name(question.column(), ext))
            .display()
            .to_string()
    };

    println!("Generating report for {} constituencies...", doc.sections.len());
    let html_path = path_for("html");
    match output::render_document(&doc).and_then(|bytes| output::write_bytes(&html_path, &bytes)) {
        Ok(()) => println!("Report exported to {}", html_path),
        Err(e) => eprintln!("Write error: {}", e),
    }
    let csv_path = path_for("csv");
    if let Err(e) = output::write_csv(&csv_path, &doc) {
        eprintln!("Write error: {}", e);
    }
    let json_path = path_for("json");
    if let Err(e) = output::write_json(&json_path, &output::document_to_json(&doc)) {
        eprintln!("Write error: {}", e);
    }
    println!("(Tables also exported to {} and {})\n", csv_path, json_path);
}

fn run_batch(args: &Args) {
    if let Some(text) = &args.question {
        let Some(data) = current_dataset() else { return };
        let caps = Capabilities::detect(&data);
        match parse_question(text, &caps) {
            Some(q) => state().question = Some(q),
            None => {
                println!("Selected question '{}' not found in the data.", text);
                return;
            }
        }
    }
    handle_show_tables();
    if args.export {
        handle_export();
    }
}

fn main() {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    info!("args: {:?}", args);

    {
        let mut st = state();
        st.cache = DatasetCache::new(Duration::seconds(args.cache_ttl));
        st.source = args.input.clone();
        st.export_dir = args.export_dir.clone();
        if !args.geo.is_empty() {
            st.selected = args.geo.clone();
        }
    }

    if args.batch {
        run_batch(&args);
        return;
    }

    loop {
        println!("Survey Data Analysis");
        println!("[1] Load the file");
        println!("[2] Select question");
        println!("[3] Select constituencies");
        println!("[4] Show tables");
        println!("[5] Export report");
        println!("[0] Exit\n");
        let Some(choice) = read_choice() else {
            println!("\nExiting the program.");
            break;
        };
        match choice.as_str() {
            "1" => handle_load(),
            "2" => handle_select_question(),
            "3" => handle_select_geography(),
            "4" => {
                println!();
                handle_show_tables();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "5" => {
                println!();
                handle_export();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => {
                println!("Invalid choice. Please enter a number from the menu.\n");
            }
        }
    }
}
