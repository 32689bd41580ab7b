use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, bail};
use clap::{ArgGroup, Parser};
use clipblock_core::{
    Clipper, ClipConfig, Document, DocumentTree, FetchConfig, Language, NodeId, OutputFormat, Settings, SettingsFile,
    fetch_file, fetch_stdin, fetch_url, tree_from_snapshot, validate_url,
};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;
use url::Url;

mod echo;

pub(crate) const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Copy the content block at a point of a web page as Markdown or plain text
#[derive(Parser, Debug)]
#[command(name = "clipblock")]
#[command(author = "Clipblock Contributors")]
#[command(version)]
#[command(about = "Copy the content block at a point of a web page", long_about = None)]
#[command(group(ArgGroup::new("at").required(true).args(["target", "point"])))]
struct Args {
    /// URL to fetch, local HTML or snapshot file, or "-" for stdin
    #[arg(value_name = "INPUT", default_value = "-")]
    input: String,

    /// CSS selector of the interaction target (HTML input)
    #[arg(short, long, value_name = "SELECTOR")]
    target: Option<String>,

    /// Viewport point of the interaction target, as X,Y
    #[arg(short, long, value_name = "X,Y", value_parser = parse_point)]
    point: Option<(f64, f64)>,

    /// Treat the input as a JSON layout snapshot instead of HTML
    #[arg(long)]
    snapshot: bool,

    /// Widen the located block to its nearest copyable ancestor
    #[arg(long)]
    promote: bool,

    /// Output format (markdown, plaintext)
    #[arg(short, long, value_name = "FORMAT")]
    format: Option<OutputFormat>,

    /// Append the page title as the source
    #[arg(long)]
    attach_title: bool,

    /// Append the page URL as the source
    #[arg(long)]
    attach_url: bool,

    /// Language of the source label (system, en, zh)
    #[arg(long, value_name = "LANG")]
    lang: Option<Language>,

    /// Settings file (default: ~/.config/clipblock/settings.json)
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Page URL used for the source attachment
    #[arg(long, value_name = "URL")]
    page_url: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_point(s: &str) -> Result<(f64, f64), String> {
    let (x, y) = s.split_once(',').ok_or_else(|| format!("expected X,Y but got `{}`", s))?;
    let x = x.trim().parse::<f64>().map_err(|e| format!("invalid X `{}`: {}", x.trim(), e))?;
    let y = y.trim().parse::<f64>().map_err(|e| format!("invalid Y `{}`: {}", y.trim(), e))?;
    Ok((x, y))
}

/// The loaded page: HTML keeps its selector index, snapshots are just a tree.
enum Page {
    Html(Document),
    Snapshot(DocumentTree),
}

impl Page {
    fn tree(&self) -> &DocumentTree {
        match self {
            Page::Html(doc) => doc.tree(),
            Page::Snapshot(tree) => tree,
        }
    }

    fn tree_mut(&mut self) -> &mut DocumentTree {
        match self {
            Page::Html(doc) => doc.tree_mut(),
            Page::Snapshot(tree) => tree,
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "clipblock_core=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn is_web_url(input: &str) -> bool {
    Url::parse(input).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

fn load_settings(args: &Args) -> anyhow::Result<SettingsFile> {
    let mut file = match &args.settings {
        Some(path) => SettingsFile::load(path).with_context(|| format!("Failed to load settings: {}", path.display()))?,
        None => SettingsFile::load_default().context("Failed to load default settings")?,
    };

    if let Some(format) = args.format {
        file.settings.output_format = format;
    }
    if let Some(lang) = args.lang {
        file.settings.language = lang;
    }
    file.settings.attach_title |= args.attach_title;
    file.settings.attach_url |= args.attach_url;

    Ok(file)
}

async fn read_input(args: &Args) -> anyhow::Result<String> {
    if args.input == "-" {
        if args.verbose {
            echo::print_step(1, 4, "Reading from stdin");
        }
        return fetch_stdin().context("Failed to read from stdin");
    }

    if is_web_url(&args.input) {
        if args.verbose {
            echo::print_step(1, 4, &format!("Fetching from {}", args.input.bright_white().underline()));
        }
        let defaults = FetchConfig::default();
        let config = FetchConfig { timeout: args.timeout, user_agent: args.user_agent.clone().unwrap_or(defaults.user_agent) };
        return fetch_url(&args.input, &config).await.context("Failed to fetch URL");
    }

    if args.verbose {
        echo::print_step(1, 4, &format!("Reading from file {}", args.input.bright_white()));
    }
    fetch_file(Path::new(&args.input)).with_context(|| format!("Failed to read file: {}", args.input))
}

fn load_page(args: &Args, source: &str) -> anyhow::Result<Page> {
    let mut page = if args.snapshot {
        Page::Snapshot(tree_from_snapshot(source).context("Failed to parse layout snapshot")?)
    } else {
        Page::Html(Document::parse(source).context("Failed to parse HTML")?)
    };

    let page_url = args.page_url.clone().or_else(|| is_web_url(&args.input).then(|| args.input.clone()));
    if let Some(page_url) = page_url {
        let url = validate_url(&page_url).with_context(|| format!("Invalid page URL: {}", page_url))?;
        page.tree_mut().set_url(Some(url.to_string()));
    }

    Ok(page)
}

fn locate(args: &Args, page: &Page, clipper: &Clipper) -> anyhow::Result<Option<NodeId>> {
    let tree = page.tree();

    let block = match (&args.target, args.point) {
        (Some(selector), _) => {
            let Page::Html(doc) = page else {
                bail!("--target needs HTML input; use --point with snapshots");
            };
            let target = doc
                .select_first(selector)
                .with_context(|| format!("Invalid selector: {}", selector))?
                .with_context(|| format!("No element matches {}", selector))?;
            clipper.locate(tree, target)
        }
        (None, Some((x, y))) => clipper.locate_at(tree, x, y),
        (None, None) => bail!("Specify --target or --point"),
    };

    Ok(match block {
        Some(block) if args.promote => clipper.promote(tree, block),
        other => other,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.verbose {
        echo::print_banner();
        echo::print_info("Debug logging enabled");
        eprintln!();
    }

    let file = load_settings(&args)?;
    let settings: Settings = file.settings;
    let editors = file.editor_exclusion().context("Invalid editor exclusion settings")?;

    let source = read_input(&args).await?;
    if args.verbose {
        eprintln!("  {} {}", "Size:".dimmed(), echo::format_size(source.len()).bright_white());
        eprintln!();
        echo::print_step(2, 4, if args.snapshot { "Loading layout snapshot" } else { "Parsing HTML document" });
    }

    let page = load_page(&args, &source)?;
    if args.verbose {
        if let Some(title) = page.tree().title() {
            eprintln!("  {} {}", "Title:".dimmed(), title.bright_white());
        }
        eprintln!();
        echo::print_step(3, 4, "Locating content block");
    }

    let clipper = Clipper::with_config(ClipConfig::builder().editor_exclusion(editors).build());
    let started = Instant::now();
    let Some(block) = locate(&args, &page, &clipper)? else {
        bail!("No copyable content block at the target");
    };
    let located_in = started.elapsed();

    if args.verbose {
        echo::print_block(page.tree(), block);
        echo::print_step(4, 4, "Serializing");
    }

    let started = Instant::now();
    let output = clipper.process(page.tree(), block, &settings);
    let serialized_in = started.elapsed();

    if args.verbose {
        eprintln!("  {} {}", "Format:".dimmed(), settings.output_format.to_string().bright_white());
        echo::print_timing("Locate", located_in);
        echo::print_timing("Serialize", serialized_in);
        eprintln!();
    }

    match args.output {
        Some(path) => {
            fs::write(&path, &output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            echo::print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => {
            println!("{}", output);
        }
    }

    Ok(())
}
