use clap::{Parser, Subcommand};
use healthspark::report::{FileReport, Summary};
use healthspark::runs::{self, chart, HoverPanel};
use healthspark::{filter, render_file, Document, RenderOptions, DEFAULT_MARKER};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(name = "healthspark")]
#[command(author, version, about = "Render sparklines, table filters and run charts for health dashboards")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// HTML file or directory to render
    path: Option<PathBuf>,

    /// Directory for rendered pages
    #[arg(long, default_value = "healthspark-out")]
    out_dir: PathBuf,

    /// Overwrite the input files instead of writing to --out-dir
    #[arg(long)]
    in_place: bool,

    /// Number of parallel workers (default: number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Class token marking sparkline sources
    #[arg(long, default_value = DEFAULT_MARKER)]
    marker: String,

    /// Pixel size of 1em for fallback heights
    #[arg(long, default_value = "16")]
    em_px: f64,

    /// Write a report file (.json, .csv)
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Only show summary
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Preview a dashboard directory with sparklines rendered on the fly
    Serve {
        /// Directory holding the HTML pages
        dir: PathBuf,

        /// Port to listen on
        #[arg(short, long, default_value = "3001")]
        port: u16,

        /// Don't open the browser
        #[arg(long)]
        no_open: bool,

        /// Class token marking sparkline sources
        #[arg(long, default_value = DEFAULT_MARKER)]
        marker: String,
    },

    /// Filter the resource tables of a page and print the result
    Filter {
        /// HTML file with a searchable table
        file: PathBuf,

        /// Search term, optionally prefixed with title:, type:, url: or site:
        term: String,
    },

    /// Print an embeddable run chart for a run history
    Chart {
        /// JSON array of runs ({datetime, value, id, success})
        runs: PathBuf,

        /// Base URL of the resource; run details live at <URL>/<run id>
        #[arg(long)]
        resource_url: String,

        /// Id of the chart element
        #[arg(long, default_value = chart::DEFAULT_ELEMENT_ID)]
        element_id: String,

        /// Plotly hover template
        #[arg(long, default_value = chart::DEFAULT_HOVER_TEMPLATE)]
        hover_template: String,
    },

    /// Print the detail panel for a run detail response
    RunDetail {
        /// Run detail JSON ({"runs": [...]})
        detail: PathBuf,

        /// URL the detail was fetched from
        #[arg(long)]
        run_url: String,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "healthspark=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_tracing();
    let args = Args::parse();

    // Handle subcommands first
    if let Some(cmd) = args.command {
        match cmd {
            Command::Serve { dir, port, no_open, marker } => {
                let options = RenderOptions::default().with_marker(&marker);
                if let Err(e) = healthspark::serve::start(port, dir, options, !no_open) {
                    eprintln!("Server error: {}", e);
                    std::process::exit(1);
                }
            }
            Command::Filter { file, term } => run_filter(&file, &term),
            Command::Chart { runs, resource_url, element_id, hover_template } => {
                run_chart(&runs, &resource_url, &element_id, &hover_template)
            }
            Command::RunDetail { detail, run_url } => run_detail(&detail, &run_url),
        }
        return;
    }

    let path = if let Some(p) = args.path.clone() {
        p
    } else {
        eprintln!("Usage: healthspark <PATH>");
        eprintln!("Run 'healthspark --help' for more options.");
        std::process::exit(1);
    };

    // Set up thread pool
    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    let files = collect_pages(&path);
    if files.is_empty() {
        eprintln!("No HTML files found (supported: html, htm)");
        std::process::exit(1);
    }

    if !args.quiet {
        eprintln!("\x1b[1mHealthspark - Dashboard Sparkline Renderer\x1b[0m");
        eprintln!("{}", "─".repeat(70));
        eprintln!("Found {} page(s)\n", files.len());
    }

    // Set up progress bar
    let pb = if !args.quiet && files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let options = RenderOptions::default()
        .with_marker(&args.marker)
        .with_em_px(args.em_px);

    // Each worker parses and owns its own document
    let reports: Vec<FileReport> = files
        .par_iter()
        .map(|file| {
            let output = output_path(&path, file, &args.out_dir, args.in_place);
            let report = render_file(file, &output, &options);
            if let Some(ref pb) = pb {
                pb.inc(1);
                pb.set_message(file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default());
            }
            report
        })
        .collect();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    // Print results
    if !args.quiet {
        for r in &reports {
            match &r.error {
                None => println!(
                    "\x1b[32m{:<8}\x1b[0m {:>4} sparkline(s)  {}",
                    "[OK]",
                    r.summary.rendered,
                    r.output.as_deref().unwrap_or(&r.input)
                ),
                Some(err) => println!("\x1b[31m{:<8}\x1b[0m {}  {}", "[FAIL]", &r.input, err),
            }
        }
    }

    let summary = Summary::from_reports(&reports);

    if !args.quiet {
        eprintln!("\n{}", "─".repeat(70));
        eprintln!("\x1b[1mSummary:\x1b[0m");
        eprintln!("  \x1b[32m✓ Pages:\x1b[0m       {}", summary.files - summary.failed);
        eprintln!("  \x1b[32m▁▃▅ Sparklines:\x1b[0m {}", summary.sparklines);
        if summary.unsupported > 0 {
            eprintln!("  \x1b[33m? Unsupported:\x1b[0m {}", summary.unsupported);
        }
        if summary.failed > 0 {
            eprintln!("  \x1b[31m✗ Failed:\x1b[0m      {}", summary.failed);
        }
    }

    if let Some(ref report_path) = args.report {
        if let Err(e) = healthspark::report::generate(report_path, &reports) {
            eprintln!("Failed to write report: {}", e);
            std::process::exit(1);
        }
        if !args.quiet {
            eprintln!("\n\x1b[32mReport saved: {}\x1b[0m", report_path.display());
        }
    }

    if summary.failed > 0 {
        std::process::exit(1);
    }
}

fn is_page(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "html" | "htm"))
        .unwrap_or(false)
}

fn collect_pages(path: &Path) -> Vec<PathBuf> {
    if path.is_dir() {
        WalkDir::new(path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_page(e.path()))
            .map(|e| e.path().to_path_buf())
            .collect()
    } else {
        vec![path.to_path_buf()]
    }
}

/// Where a rendered page goes: the input itself, or the same relative path
/// below `out_dir`
fn output_path(base: &Path, file: &Path, out_dir: &Path, in_place: bool) -> PathBuf {
    if in_place {
        return file.to_path_buf();
    }
    let relative = if base.is_dir() {
        file.strip_prefix(base).unwrap_or(file)
    } else {
        file.file_name().map(Path::new).unwrap_or(file)
    };
    out_dir.join(relative)
}

fn read_or_exit(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn run_filter(file: &Path, term: &str) {
    let markup = read_or_exit(file);
    let result = Document::parse(&markup).and_then(|mut doc| {
        let result = filter::apply(&mut doc, term)?;
        Ok((doc.to_html(), result))
    });

    match result {
        Ok((html, result)) => {
            println!("{}", html);
            eprintln!("\x1b[1m{}\x1b[0m ({} row(s) visible)", result.label, result.visible_rows);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_chart(runs_file: &Path, resource_url: &str, element_id: &str, hover_template: &str) {
    let points = match runs::parse_points(&read_or_exit(runs_file)) {
        Ok(points) => points,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = chart::write_html(&mut out, element_id, &points, resource_url, hover_template) {
        eprintln!("Failed to write chart: {}", e);
        std::process::exit(1);
    }
}

fn run_detail(detail_file: &Path, run_url: &str) {
    let panel = HoverPanel::from_response(&read_or_exit(detail_file), run_url);
    println!("{}", panel);
    if matches!(panel, HoverPanel::Error { .. }) {
        std::process::exit(1);
    }
}
