use clap::Parser;

use crate::cache::DEFAULT_TTL_SECS;

/// Cross-tabulated survey reports by demographic group and constituency.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The survey sheet, exported as CSV with a header row.
    #[clap(short, long, value_parser, default_value = "survey_data.csv")]
    pub input: String,

    /// (number or question text) The question to tabulate. Numbers follow the
    /// order of the question menu, starting at 1.
    #[clap(short, long, value_parser)]
    pub question: Option<String>,

    /// (repeatable) Constituency to restrict the tables to. 'All' shows every
    /// constituency and takes precedence over other values.
    #[clap(short, long, value_parser)]
    pub geo: Vec<String>,

    /// (directory) Where exported reports are written.
    #[clap(short, long, value_parser, default_value = ".")]
    pub export_dir: String,

    /// (seconds) How long a loaded sheet is reused before it is read again.
    #[clap(long, value_parser, default_value_t = DEFAULT_TTL_SECS)]
    pub cache_ttl: i64,

    /// Print the tables once (and export when --export is given) instead of
    /// running the menu.
    #[clap(long, takes_value = false)]
    pub batch: bool,

    /// With --batch, also write the export documents.
    #[clap(long, takes_value = false)]
    pub export: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
