use clap::{Parser, ValueEnum};
use critgen::{Error, Generator, GraphSink, JsonLinesSink, MulticodeSink, SearchConfig, USAGE};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
  /// Concatenated binary multicode
  Multicode,
  /// One JSON object per line with 1-indexed edges
  Json,
}

/// Generates every (k+1)-critical graph of a hereditary class up to n vertices.
#[derive(Debug, Parser)]
#[command(name = "critgen", version, after_help = USAGE)]
struct Cli {
  /// `n c<k>` followed by class tokens, e.g. `12 c3 P5 diamondfree`
  #[arg(required = true, value_name = "TOKENS")]
  tokens: Vec<String>,

  /// Write graphs here instead of stdout
  #[arg(short, long)]
  output: Option<PathBuf>,

  #[arg(long, value_enum, default_value_t = Format::Multicode)]
  format: Format,

  /// Grow from a single vertex instead of the K_{k+1}/hole/antihole seeds
  #[arg(long)]
  from_single_vertex: bool,

  /// Extend with every neighbourhood instead of the lemma targets
  #[arg(long)]
  no_lemmas: bool,

  /// From this vertex count on, pick the target with the fewest children
  #[arg(long, value_name = "N")]
  least_children: Option<usize>,

  /// Emit uncolourable vertex-critical graphs without the edge test
  #[arg(long)]
  no_edge_check: bool,

  /// Hide the progress spinner
  #[arg(short, long)]
  quiet: bool,

  /// Print the parsed configuration as JSON and exit
  #[arg(long)]
  print_config: bool,
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(io::stderr)
    .init();

  match run(&cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      eprintln!("critgen: {err}");
      if matches!(err, Error::Usage(_) | Error::InvalidArgument { .. } | Error::TooManyVertices { .. }) {
        eprintln!("{USAGE}");
      }
      ExitCode::FAILURE
    }
  }
}

fn configure(cli: &Cli) -> critgen::Result<SearchConfig> {
  let mut config = SearchConfig::from_tokens(&cli.tokens)?;
  config.from_single_vertex = cli.from_single_vertex;
  config.lemmas = !cli.no_lemmas;
  config.least_children = cli.least_children;
  config.edge_check = !cli.no_edge_check;
  config.validate()?;
  Ok(config)
}

fn run(cli: &Cli) -> critgen::Result<()> {
  let config = configure(cli)?;
  if cli.print_config {
    println!("{}", serde_json::to_string_pretty(&config)?);
    return Ok(());
  }

  let out: Box<dyn Write> = match &cli.output {
    Some(path) => {
      info!("writing graphs to {}", path.display());
      Box::new(BufWriter::new(File::create(path)?))
    }
    None => Box::new(BufWriter::new(io::stdout().lock())),
  };
  match cli.format {
    Format::Multicode => search(config, &mut MulticodeSink::new(out), cli.quiet),
    Format::Json => search(config, &mut JsonLinesSink::new(out), cli.quiet),
  }
}

fn search(config: SearchConfig, sink: &mut dyn GraphSink, quiet: bool) -> critgen::Result<()> {
  let mut generator = Generator::new(config, sink)?;
  if !quiet {
    generator = generator.with_progress(spinner());
  }
  let summary = generator.run()?;

  info!(emitted = summary.emitted(), accepted = summary.accepted(), "search finished");
  for stage in summary.stages.iter().filter(|s| s.pruned > 0) {
    debug!(stage = %stage.stage, pruned = stage.pruned, "pruned");
  }
  Ok(())
}

fn spinner() -> ProgressBar {
  let pb = ProgressBar::new_spinner();
  pb.set_style(
    ProgressStyle::with_template("[gen  ] {spinner} {pos} accepted, {msg} {elapsed_precise}")
      .unwrap_or_else(|_| ProgressStyle::default_spinner())
      .tick_chars("█▉▊▋▌▍▎▏  "),
  );
  pb.set_message("0 emitted");
  pb.enable_steady_tick(Duration::from_millis(120));
  pb
}
