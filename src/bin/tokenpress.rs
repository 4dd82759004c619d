use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tokenpress", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Arrange the configured tokens and write the output document.
    Make(MakeArgs),
    /// Only compute the arrangement and print it.
    Arrange(ArrangeArgs),
    /// List the format graph entries.
    Formats(FormatsArgs),
}

#[derive(Parser, Debug)]
struct MakeArgs {
    /// Run configuration JSON.
    #[arg(long)]
    config: PathBuf,

    /// Output path, overriding `output_file`.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Target format, overriding the output extension.
    #[arg(long)]
    format: Option<String>,

    /// Format graph entry to build instead of the target format, e.g. `png` or `html`.
    #[arg(long)]
    canvas: Option<String>,

    /// Write one numbered file per page for per-page formats.
    #[arg(long)]
    split_pages: bool,

    /// Log progress and let external tools print to the terminal.
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Parser, Debug)]
struct ArrangeArgs {
    /// Run configuration JSON.
    #[arg(long)]
    config: PathBuf,

    #[arg(long, short)]
    verbose: bool,
}

#[derive(Parser, Debug)]
struct FormatsArgs {
    /// Merge the user entries and priorities from this configuration.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let verbose = match &cli.cmd {
        Command::Make(a) => a.verbose,
        Command::Arrange(a) => a.verbose,
        Command::Formats(_) => false,
    };
    init_tracing(verbose);
    match cli.cmd {
        Command::Make(args) => cmd_make(args),
        Command::Arrange(args) => cmd_arrange(args),
        Command::Formats(args) => cmd_formats(args),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "tokenpress=info" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: &Path) -> anyhow::Result<tokenpress::RunConfig> {
    tokenpress::RunConfig::from_path(path)
        .with_context(|| format!("load config '{}'", path.display()))
}

fn cmd_make(args: MakeArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(&args.config)?;
    if let Some(out) = args.out {
        cfg.output_file = out;
    }
    if let Some(format) = args.format {
        cfg.output_format = Some(format);
    }
    if let Some(canvas) = args.canvas {
        cfg.canvas = Some(canvas);
    }
    cfg.split_pages |= args.split_pages;
    cfg.verbose |= args.verbose;

    let summary = tokenpress::run(&mut cfg)?;
    eprintln!(
        "wrote {} ({} tokens on {} pages via {})",
        summary.output.display(),
        summary.tokens,
        summary.pages,
        summary.canvas
    );
    Ok(())
}

fn cmd_arrange(args: ArrangeArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(&args.config)?;
    cfg.verbose |= args.verbose;
    let tokens = tokenpress::cards_from_specs(&cfg.tokens);
    let (layout, arrangement) = tokenpress::arrange_tokens(&cfg, &tokens)?;

    println!("{layout}: {} pages", arrangement.page_count());
    for (i, page) in arrangement.pages.iter().enumerate() {
        println!("page {i} ({}x{}mm)", page.size.width, page.size.height);
        for p in &page.placements {
            println!(
                "  token {} at ({:.2}, {:.2}) {:.2}x{:.2}{}",
                p.token,
                p.x,
                p.y,
                p.width,
                p.height,
                if p.rotated { " rotated" } else { "" }
            );
        }
    }
    Ok(())
}

fn cmd_formats(args: FormatsArgs) -> anyhow::Result<()> {
    let cfg = match &args.config {
        Some(path) => load_config(path)?,
        None => tokenpress::RunConfig::default(),
    };
    let graph = tokenpress::FormatGraph::for_config(&cfg);
    for name in graph.names() {
        match graph.entry(name) {
            Some(tokenpress::FormatEntry::Source(source)) => println!("{name} <- {source}"),
            Some(tokenpress::FormatEntry::Constructor(_)) => println!("{name}"),
            None => {}
        }
    }
    Ok(())
}
