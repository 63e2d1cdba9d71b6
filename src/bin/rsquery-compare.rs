//! Comparator CLI (spec §6): reads two SPARQL-Results-JSON documents and
//! reports whether they are equal under a configurable comparison
//! policy. Command-line entry points are outside the scored core (spec
//! §1); this binary is the thin wiring around [`rowsource_engine::comparison`].

use clap::{ArgGroup, Parser, ValueEnum};
use rowsource_engine::comparison::{self, BlankNodeStrategy, ComparisonConfig, GraphComparisonOptions};
use rowsource_engine::literal::CompareFlags;
use rowsource_engine::results::json::{parse_graph_result, parse_query_result};
use rowsource_engine::results::QueryResult;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum BlankNodeStrategyArg {
    Any,
    Id,
    Structure,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum OutputFormat {
    Unified,
    Json,
    Xml,
    Debug,
}

/// Compare two SPARQL query results for equivalence.
#[derive(Parser, Debug)]
#[command(name = "rsquery-compare", version, about)]
#[command(group(ArgGroup::new("actual_source").required(true).args(["actual", "query"])))]
struct Cli {
    /// Path to the expected (reference) results document.
    #[arg(long)]
    expected: PathBuf,

    /// Path to the actual results document to compare against `expected`.
    #[arg(long, group = "actual_source")]
    actual: Option<PathBuf>,

    /// Path to a query whose results should be compared against `expected`.
    /// Query execution is outside this engine's scope; the file is read as
    /// an already-produced results document, same as `--actual`.
    #[arg(long, group = "actual_source")]
    query: Option<PathBuf>,

    /// Data graph to load before running `--query` (accepted for interface
    /// compatibility; query execution itself is outside this engine).
    #[arg(long = "data-graph")]
    data_graph: Vec<PathBuf>,

    /// Treat results as ordered sequences rather than unordered multisets.
    #[arg(long)]
    order_sensitive: bool,

    /// How blank nodes are matched between the two results.
    #[arg(long, value_enum, default_value = "any")]
    blank_node_strategy: BlankNodeStrategyArg,

    /// Maximum number of differences to report.
    #[arg(long, default_value_t = 100)]
    max_differences: usize,

    /// Wall-clock bound, in seconds, for the graph-isomorphism stage.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Blank-bearing triple count above which graph comparison treats a
    /// continued isomorphism search as too expensive to trust.
    #[arg(long, default_value_t = 1000)]
    signature_threshold: usize,

    /// Emit a unified-diff-style report (the default).
    #[arg(long, action = clap::ArgAction::SetTrue)]
    unified: bool,

    #[arg(long = "json", action = clap::ArgAction::SetTrue)]
    json: bool,

    #[arg(long = "xml", action = clap::ArgAction::SetTrue)]
    xml: bool,

    #[arg(long = "debug", action = clap::ArgAction::SetTrue)]
    debug: bool,
}

impl Cli {
    fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else if self.xml {
            OutputFormat::Xml
        } else if self.debug {
            OutputFormat::Debug
        } else {
            let _ = self.unified;
            OutputFormat::Unified
        }
    }

    fn actual_path(&self) -> &PathBuf {
        self.actual.as_ref().or(self.query.as_ref()).expect("clap enforces actual_source group")
    }
}

fn load_result(path: &PathBuf) -> Result<QueryResult, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("reading {}: {e}", path.display()))?;
    parse_query_result(&text)
        .or_else(|_| parse_graph_result(&text))
        .map_err(|e| format!("parsing {}: {e}", path.display()))
}

fn render(format: OutputFormat, outcome: &comparison::ComparisonOutcome) -> String {
    match format {
        OutputFormat::Unified => outcome
            .differences
            .iter()
            .map(|d| format!("- {d:?}"))
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Json => serde_json::json!({
            "equal": outcome.equal,
            "differences": outcome.differences.iter().map(|d| format!("{d:?}")).collect::<Vec<_>>(),
        })
        .to_string(),
        OutputFormat::Xml => {
            let mut out = String::from("<comparison>\n");
            out.push_str(&format!("  <equal>{}</equal>\n", outcome.equal));
            for d in &outcome.differences {
                out.push_str(&format!("  <difference>{d:?}</difference>\n"));
            }
            out.push_str("</comparison>");
            out
        }
        OutputFormat::Debug => format!("{outcome:#?}"),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    rowsource_engine::logging::init(&rowsource_engine::config::LoggingConfig::default());

    let expected = match load_result(&cli.expected) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };
    let actual = match load_result(cli.actual_path()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    let blank_node_strategy = match cli.blank_node_strategy {
        BlankNodeStrategyArg::Any => BlankNodeStrategy::MatchAny,
        BlankNodeStrategyArg::Id => BlankNodeStrategy::MatchById,
        BlankNodeStrategyArg::Structure => BlankNodeStrategy::MatchStructural,
    };
    let config = ComparisonConfig {
        order_sensitive: cli.order_sensitive,
        blank_node_strategy,
        literal_comparison_flags: CompareFlags::default(),
        max_differences_to_report: cli.max_differences,
        graph_comparison_options: GraphComparisonOptions {
            signature_threshold: cli.signature_threshold,
            max_search_time: Duration::from_secs(cli.timeout),
        },
    };

    let outcome = comparison::compare(&expected, &actual, &config);
    println!("{}", render(cli.output_format(), &outcome));

    if outcome.equal {
        ExitCode::from(0)
    } else {
        ExitCode::from(1)
    }
}
