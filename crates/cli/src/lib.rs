use anyhow::Result;
use ccg_graph::{Direction, RelationshipEngine, RelationshipQuery, TargetMatching};
use ccg_indexer::{
    clear_repo_cache, load_graph, process_repo, GraphSnapshot, OutputsLayout, ScanOptions,
    SourceScanner,
};
use ccg_protocol::{serialize_json_pretty, ClearCacheResponse};
use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

mod envelope;

pub use envelope::{classify_error, exit_code};

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "ccg")]
#[command(about = "Build and query code call graphs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,

    /// Root holding one working directory per repository (overrides CCG_OUTPUTS_DIR)
    #[arg(long, global = true)]
    outputs_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Cache docs, build ccg.json and clean a repository working directory
    Process(ProcessArgs),

    /// Print the stored call graph of a repository
    Graph(RepoArgs),

    /// Find callers and callees of a function
    Query(QueryArgs),

    /// Delete a repository's working directory
    #[command(name = "clear-cache")]
    ClearCache(ClearCacheArgs),

    /// Build the call graph of a directory without writing anything
    Scan(ScanArgs),
}

#[derive(Args)]
struct ProcessArgs {
    /// Repository working directory (usually <outputs>/<repo>)
    repo_dir: PathBuf,

    /// Honour .gitignore and skip hidden files while scanning
    #[arg(long)]
    respect_ignore: bool,
}

#[derive(Args)]
struct RepoArgs {
    /// Repository name under the outputs root
    #[arg(long)]
    repo: String,
}

#[derive(Args)]
struct QueryArgs {
    /// Repository name under the outputs root
    #[arg(long)]
    repo: String,

    /// Function name, `Class.method`, or full node id
    #[arg(long, short = 'f')]
    function: String,

    /// callers | callees | both
    #[arg(long, default_value = "both")]
    direction: String,

    /// Hops to follow, 1..=10
    #[arg(long, short = 'd', default_value_t = 1)]
    depth: usize,

    /// How call text is tied to functions: literal (raw call text) | resolved
    #[arg(long, default_value = "literal")]
    matching: String,
}

#[derive(Args)]
struct ClearCacheArgs {
    /// Repository name under the outputs root
    repo: String,
}

#[derive(Args)]
struct ScanArgs {
    /// Directory to scan
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Honour .gitignore and skip hidden files
    #[arg(long)]
    respect_ignore: bool,

    /// Print only node/edge counts and scan statistics
    #[arg(long)]
    summary: bool,
}

pub async fn main_entry() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let layout = OutputsLayout::resolve(cli.outputs_dir);
    log::debug!("Outputs root: {}", layout.root().display());

    let outcome = match cli.command {
        Commands::Process(args) => run_process(args).await,
        Commands::Graph(args) => run_graph(&layout, args).await,
        Commands::Query(args) => run_query(&layout, args).await,
        Commands::ClearCache(args) => run_clear_cache(&layout, args).await,
        Commands::Scan(args) => run_scan(args).await,
    };

    match outcome {
        Ok(json) => {
            print_stdout(&json)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            let envelope = classify_error(&err);
            log::debug!("Command failed: {err:#}");
            print_stdout(&serialize_json_pretty(&envelope)?)?;
            Ok(exit_code(&envelope))
        }
    }
}

async fn run_process(args: ProcessArgs) -> Result<String> {
    let options = ScanOptions {
        respect_ignore: args.respect_ignore,
    };
    let report = process_repo(&args.repo_dir, options).await?;
    serialize_json_pretty(&report)
}

async fn run_graph(layout: &OutputsLayout, args: RepoArgs) -> Result<String> {
    let graph = load_graph(layout, &args.repo).await?;
    serialize_json_pretty(&GraphSnapshot::new(args.repo, graph))
}

async fn run_query(layout: &OutputsLayout, args: QueryArgs) -> Result<String> {
    let direction: Direction = args.direction.parse()?;
    let matching: TargetMatching = args.matching.parse()?;
    let query = RelationshipQuery::new(args.function)
        .direction(direction)
        .depth(args.depth);
    query.validate()?;

    let graph = load_graph(layout, &args.repo).await?;
    let engine = RelationshipEngine::with_matching(&graph, matching);
    let response = engine.query(&args.repo, &query)?;
    serialize_json_pretty(&response)
}

async fn run_clear_cache(layout: &OutputsLayout, args: ClearCacheArgs) -> Result<String> {
    let removed = clear_repo_cache(layout, &args.repo).await?;
    let response = ClearCacheResponse::new(&args.repo, removed.display().to_string());
    serialize_json_pretty(&response)
}

async fn run_scan(args: ScanArgs) -> Result<String> {
    let options = ScanOptions {
        respect_ignore: args.respect_ignore,
    };
    let root = args.path;
    let outcome =
        tokio::task::spawn_blocking(move || SourceScanner::new(root).with_options(options).scan())
            .await??;

    if args.summary {
        return serialize_json_pretty(&serde_json::json!({
            "nodes_count": outcome.graph.node_count(),
            "edges_count": outcome.graph.edge_count(),
            "stats": outcome.stats,
        }));
    }
    serialize_json_pretty(&outcome.graph)
}
