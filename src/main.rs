mod debug_report;

use clap::{Parser, ValueEnum};
use rollscribe::config::RuleFile;
use rollscribe::plugin::{AnalysisReport, PluginRegistry};
use rollscribe::render::{HtmlRenderer, JsonRenderer, MarkdownRenderer, Renderer};
use rollscribe::rules::default_rule_file;
use rollscribe::{Error, Options, PriorityOrder, tokenize_log_verbose_with};
use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Tokenize a tabletop role-playing session log.
///
/// Exit codes: 0 success, 1 I/O or render failure, 2 invalid arguments or rules.
#[derive(Parser)]
#[command(name = "rollscribe", author, version, about)]
struct Cli {
    /// Log file to read; stdin when omitted or `-`.
    input: Option<PathBuf>,

    /// JSON rule file. The built-in rules are used when omitted.
    #[arg(short, long, value_name = "FILE")]
    rules: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Pretty-print JSON output.
    #[arg(long)]
    pretty: bool,

    /// Override the rule file's priority direction.
    #[arg(long, value_enum)]
    priority_order: Option<OrderArg>,

    /// Drop empty and whitespace-only lines.
    #[arg(long)]
    skip_blank: bool,

    /// Run the built-in plugins and print their reports (to stderr unless --format report).
    #[arg(long)]
    analyze: bool,

    /// Print the built-in rules as a rule file and exit.
    #[arg(long)]
    dump_rules: bool,

    /// Force ANSI color in the report.
    #[arg(long, overrides_with = "no_color")]
    color: bool,

    /// Disable ANSI color in the report.
    #[arg(long, overrides_with = "color")]
    no_color: bool,

    /// More logging on stderr (-v info, -vv debug, -vvv trace). ROLLSCRIBE_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Markdown,
    Html,
    /// Human-readable debug report with metrics.
    Report,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderArg {
    LowerFirst,
    HigherFirst,
}

impl From<OrderArg> for PriorityOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::LowerFirst => PriorityOrder::LowerFirst,
            OrderArg::HigherFirst => PriorityOrder::HigherFirst,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(&cli) {
        eprintln!("error: {err}");
        let code = match err {
            Error::Configuration(_) | Error::RuleFile(_) => 2,
            _ => 1,
        };
        std::process::exit(code);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("ROLLSCRIBE_LOG").unwrap_or_else(|_| EnvFilter::new(format!("rollscribe={level}")));

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(io::stderr).init();
}

fn run(cli: &Cli) -> Result<(), Error> {
    if cli.dump_rules {
        let json = serde_json::to_string_pretty(&default_rule_file()).map_err(Error::Render)?;
        return write_stdout(&json);
    }

    let file = match &cli.rules {
        Some(path) => RuleFile::from_path(path)?,
        None => default_rule_file(),
    };
    let order = cli.priority_order.map(PriorityOrder::from).unwrap_or(file.priority_order);
    let tokenizer = file.build_with_order(order)?;
    debug!(rules = tokenizer.rules().len(), ?order, "tokenizer ready");

    let text = read_input(cli.input.as_ref())?;
    let options = Options { skip_blank_lines: cli.skip_blank };
    let mut report = tokenize_log_verbose_with(&tokenizer, &text, &options);

    let mut analysis: Vec<AnalysisReport> = Vec::new();
    if cli.analyze {
        let registry = PluginRegistry::with_builtins();
        report.batches = registry.process(std::mem::take(&mut report.batches));
        analysis = registry.analyze_batches(&report.batches);
    }

    let rendered = match cli.format {
        Format::Json => JsonRenderer { pretty: cli.pretty }.render(&report.batches)?,
        Format::Markdown => MarkdownRenderer.render(&report.batches)?,
        Format::Html => HtmlRenderer::default().render(&report.batches)?,
        Format::Report => {
            let color = if cli.no_color { false } else { cli.color || io::stdout().is_terminal() };
            debug_report::print_run(&text, &report, cli.analyze.then_some(analysis.as_slice()), color);
            return Ok(());
        }
    };
    write_stdout(&rendered)?;

    if cli.analyze {
        let json = serde_json::to_string_pretty(&analysis).map_err(Error::Render)?;
        eprintln!("{json}");
    }
    Ok(())
}

fn read_input(path: Option<&PathBuf>) -> Result<String, Error> {
    match path {
        Some(path) if path.as_os_str() != "-" => {
            fs::read_to_string(path).map_err(|source| Error::Io { path: path.clone(), source })
        }
        _ => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).map_err(Error::Read)?;
            Ok(buffer)
        }
    }
}

fn write_stdout(text: &str) -> Result<(), Error> {
    let mut out = io::stdout().lock();
    writeln!(out, "{text}").map_err(Error::Write)
}
