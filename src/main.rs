use appendix_render::process::{self, Mode};
use appendix_render::types::ArticleContext;
use appendix_render::{config, load, output};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

/// Issue identifiers and the content files of that issue.
#[derive(clap::Args, Clone)]
struct IssueArgs {
    /// Volume number of the issue
    volume: String,
    /// Issue number within the volume
    number: String,
    /// Content files, or directories to search for *.json content files
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

#[derive(Parser)]
#[command(name = "appendix-render")]
#[command(about = "Render Appendix article content records for the static site")]
#[command(long_about = "\
Render Appendix article content records for the static site

Each content file is a JSON record with article metadata, the article body
as a list of typed elements, and optional supernotes. Output goes to one
directory per article:

  {output}/
  └── issue-{volume}-{number}/
      └── {short-reference}/
          ├── web_content.html     # web, build
          ├── metadata.yml         # web, build
          └── supernotes.json      # supernotes, build

Files named contributors, bundle.json, cover.jpg and cover-chapter-N.jpg are
skipped wherever they appear among the inputs.

Run 'appendix-render gen-config' to generate a documented render.toml.")]
#[command(version)]
struct Cli {
    /// Renderer config file (stock defaults when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output root directory
    #[arg(long, default_value = ".", global = true)]
    output: PathBuf,

    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write web_content.html and metadata.yml for each article
    Web(IssueArgs),
    /// Write supernotes.json for each article that has supernotes
    Supernotes(IssueArgs),
    /// Write both web and supernote output
    Build(IssueArgs),
    /// Print the CDN URLs of every supernote image
    Images(IssueArgs),
    /// Validate and render every article without writing
    Check(IssueArgs),
    /// Print a stock render.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let (mode, args) = match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            return Ok(());
        }
        Command::Images(args) => {
            let config = config::load_config(cli.config.as_deref())?;
            return list_images(&args, &config);
        }
        Command::Web(args) => (Mode::Web, args),
        Command::Supernotes(args) => (Mode::Supernotes, args),
        Command::Build(args) => (Mode::Build, args),
        Command::Check(args) => (Mode::Check, args),
    };

    let config = config::load_config(cli.config.as_deref())?;
    init_thread_pool(&config.processing);

    let ctx = ArticleContext::new(args.volume, args.number);
    let inputs = load::discover_inputs(&args.paths, &config.input.skip_names);
    if inputs.is_empty() {
        return Err("no content files found among the given paths".into());
    }

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_process_event(&event);
        }
    });
    let summary = process::process_batch(&inputs, &ctx, &cli.output, mode, &config, Some(tx));
    printer
        .join()
        .map_err(|_| "progress printer thread panicked")?;
    output::print_summary(&summary, &cli.output);

    if !summary.is_success() {
        return Err(format!(
            "{} of {} articles failed",
            summary.failed.len(),
            inputs.len()
        )
        .into());
    }
    Ok(())
}

/// Print CDN image URLs for every input, in input order.
fn list_images(
    args: &IssueArgs,
    config: &config::RenderConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let inputs = load::discover_inputs(&args.paths, &config.input.skip_names);
    let mut failed = 0;
    for source in &inputs {
        match process::image_listing(source, config) {
            Ok(urls) => output::print_image_urls(&urls),
            Err(err) => {
                failed += 1;
                eprintln!("FAILED {}: {}", source.display(), err);
            }
        }
    }
    if failed > 0 {
        return Err(format!("{} of {} files failed", failed, inputs.len()).into());
    }
    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
