use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use samelist::config::{ConfigLayer, Settings};
use samelist::core::{Engine, LineRange, MalformedPolicy, Strategy};
use samelist::report::{self, OutputFormat};
use std::fs::File;
use std::ffi::OsString;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(
    name = "samelist",
    version,
    about = "Curate duplicate image groups for manual review",
    override_usage = "cat <same list> | samelist [OPTIONS] <START_LINE> <END_LINE>"
)]
struct Cli {
    /// First input line to process (1-based)
    start_line: usize,

    /// Last input line to process (inclusive)
    end_line: usize,

    /// Read groups from FILE instead of stdin
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Write the report to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// How each group is resolved [default: prune]
    #[arg(short, long, value_enum)]
    strategy: Option<Strategy>,

    /// What to do with tokens that fail to parse [default: drop]
    #[arg(long, value_enum, value_name = "POLICY")]
    on_malformed: Option<MalformedPolicy>,

    /// Report format [default: html]
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Base URL of the image server; cards link to `<URL>/imageno/<id>`
    #[arg(long, value_name = "URL")]
    image_base_url: Option<String>,

    /// Title of the HTML page
    #[arg(long)]
    title: Option<String>,

    /// JSON config file (default: `<config dir>/samelist/config.json` if present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn overrides(&self) -> ConfigLayer {
        ConfigLayer {
            strategy: self.strategy,
            on_malformed: self.on_malformed,
            format: self.format,
            image_base_url: self.image_base_url.clone(),
            title: self.title.clone(),
        }
    }
}

/// Parses `args`, printing clap's message on failure. Usage errors map to
/// exit code 1; `--help` and `--version` map to 0.
fn parse_args<I, T>(args: I) -> std::result::Result<Cli, i32>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args).map_err(|err| {
        let _ = err.print();
        if err.use_stderr() { 1 } else { 0 }
    })
}

fn main() -> Result<()> {
    let cli = parse_args(std::env::args_os()).unwrap_or_else(|code| process::exit(code));
    init_logging(cli.verbose);

    let range = LineRange::new(cli.start_line, cli.end_line)?;
    let file_layer = ConfigLayer::discover(cli.config.as_deref())?;
    let settings = Settings::from(cli.overrides().over(file_layer));
    log::debug!("Settings: {:?}", settings);

    let reader: Box<dyn BufRead> = match &cli.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open input {:?}", path))?,
        )),
        None => Box::new(io::stdin().lock()),
    };
    let writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create output {:?}", path))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    let mut sink = report::renderer(settings.format, writer, settings.html.clone());

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.green} {pos} line(s) read")?);
    spinner.enable_steady_tick(Duration::from_millis(100));

    let engine = Engine::new(settings.engine);
    log::info!(
        "Processing lines {} to {} with strategy {}",
        range.start,
        range.end,
        engine.strategy()
    );
    let result = benchmark("processing groups", || {
        engine.run(reader, range, sink.as_mut(), |_| spinner.inc(1))
    });
    spinner.finish_and_clear();
    let report = result?;

    if !report.discarded.is_empty() {
        log::info!("Discarded {} image(s): {:?}", report.discarded.len(), report.discarded);
    }

    eprintln!("{}", report.summary_line());
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

/// Run `f()`, log how long it took (with `label`), and return its result.
fn benchmark<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
    let start = Instant::now();
    let result = f();
    log::info!("{} took {:.2?}", label, start.elapsed());
    result
}
