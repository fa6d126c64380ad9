use rollscribe::plugin::AnalysisReport;
use rollscribe::{LineBatch, TokenizeReport};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const MAGENTA: &str = "\x1b[35m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

const PREVIEW_CHARS: usize = 60;

pub fn print_run(input: &str, report: &TokenizeReport, analysis: Option<&[AnalysisReport]>, color: bool) {
    let palette = ansi::Palette::new(color);
    let lines = input.lines().count();
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Tokenizing {lines} line(s)"), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Lines ━━━", ansi::GRAY));
    if report.batches.iter().all(|b| b.tokens.is_empty()) {
        println!("{}", palette.dim("  No tokens produced"));
        println!("\n{}", palette.paint("Possible reasons:", ansi::YELLOW));
        println!("  • No rule pattern matched (prefix rules only match at the start of the remainder)");
        println!("  • The metadata pattern swallowed the whole line");
        println!("\n{}", palette.dim("  Tip: set ROLLSCRIBE_LOG=rollscribe=trace to see rejected candidates"));
    } else {
        for batch in &report.batches {
            print_batch(batch, &palette);
        }
    }

    println!("\n{}", palette.paint("━━━ Summary ━━━", ansi::GRAY));
    print_summary(report, &palette);

    if let Some(analysis) = analysis {
        println!("\n{}", palette.paint("━━━ Analysis ━━━", ansi::GRAY));
        for entry in analysis {
            println!("  {} {}", palette.paint(&entry.plugin, ansi::MAGENTA), palette.dim(entry.report.to_string()));
        }
    }

    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    let per_line = if report.metrics.lines > 0 { report.metrics.total / report.metrics.lines as u32 } else { Default::default() };
    println!(
        "  Total: {}  │  Per line: {}",
        palette.paint(format!("{:?}", report.metrics.total), ansi::GREEN),
        palette.dim(format!("{per_line:?}")),
    );
    println!();
}

fn print_batch(batch: &LineBatch, palette: &ansi::Palette) {
    let header = match (batch.speaker(), batch.time()) {
        (Some(speaker), Some(time)) => format!("{} {}", palette.bold(speaker), palette.dim(time)),
        (Some(speaker), None) => palette.bold(speaker),
        _ => String::new(),
    };
    println!("  {} {}", palette.paint(format!("L{}", batch.line_number), ansi::GRAY), header);

    for token in &batch.tokens {
        println!(
            "    {} {} {} {}",
            palette.paint(format!("{:<10}", token.kind()), ansi::BLUE),
            palette.paint(format!("{}..{}", token.start(), token.end()), ansi::YELLOW),
            palette.dim("│"),
            palette.paint(preview(token.content()), ansi::GREEN),
        );
    }
    for residual in batch.residual.iter().filter(|r| !r.is_blank()) {
        println!(
            "    {} {} {} {}",
            palette.dim(format!("{:<10}", "residual")),
            palette.paint(format!("{}..{}", residual.span.start, residual.span.end), ansi::YELLOW),
            palette.dim("│"),
            palette.dim(preview(&residual.text)),
        );
    }
}

fn print_summary(report: &TokenizeReport, palette: &ansi::Palette) {
    let m = &report.metrics;
    println!(
        "  Lines: {}  │  Blank: {}  │  Unmatched: {}  │  With metadata: {}",
        palette.paint(m.lines.to_string(), ansi::BLUE),
        palette.dim(m.blank_lines.to_string()),
        palette.paint(m.unmatched_lines.to_string(), if m.unmatched_lines > 0 { ansi::YELLOW } else { ansi::GREEN }),
        palette.paint(m.lines_with_metadata.to_string(), ansi::BLUE),
    );
    println!(
        "  Tokens: {}  │  Candidates: {}  │  Rejected: {}",
        palette.paint(m.tokens.to_string(), ansi::GREEN),
        palette.dim(m.candidates.to_string()),
        palette.dim(m.rejected.to_string()),
    );
    for (kind, count) in &m.by_type {
        println!("    {} {}", palette.paint(format!("{kind:<10}"), ansi::CYAN), count);
    }
    if !report.active_rules.is_empty() {
        println!("  {} {}", palette.dim("Active rules:"), report.active_rules.join(", "));
    }
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        out.push('…');
    }
    format!("{out:?}")
}
