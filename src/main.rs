use std::path::{Path, PathBuf};

use clap::Parser;
use miette::{Context, IntoDiagnostic, Result};

use revsight_core::{OutputFormat, RevsightConfig, VcsKind};
use revsight_difflens::filter::PathFilter;
use revsight_ownership::aggregate::Grouping;
use revsight_ownership::pipeline::{attribute_reviewers, AttributionRequest, Scope};
use revsight_ownership::report::DisplayOptions;
use revsight_vcs::{Backend, BackendOptions, VersionControlBackend};

#[derive(Parser)]
#[command(
    name = "revsight",
    version,
    about = "Suggest reviewers from the authorship of the lines a change touches",
    long_about = "Suggest reviewers from the authorship of the lines a change touches.\n\n\
                   Every base-revision line that a pending change modifies or deletes is\n\
                   attributed to the author who last touched it; the authors with the most\n\
                   lines are the suggested reviewers. Works with git and Mercurial.\n\n\
                   Examples:\n  \
                     revsight                        Rank authors of all pending changes\n  \
                     revsight src/lib.rs -n 5        Top five for one file\n  \
                     revsight -f                     One ranking per file\n  \
                     revsight -w src/parser.rs       Authors of the whole file\n  \
                     revsight -r main --format json  Diff against main, JSON output"
)]
struct Cli {
    /// Files to analyze (default: every modified or deleted file)
    files: Vec<PathBuf>,

    /// Base revision to diff and annotate against (default: HEAD for git, . for hg)
    #[arg(long, short)]
    revision: Option<String>,

    /// Number of reviewers to suggest (default: 3)
    #[arg(long, short = 'n')]
    num_reviewers: Option<usize>,

    /// Attribute every line of each file instead of only the changed lines
    #[arg(long, short)]
    whole_file: bool,

    /// Rank reviewers separately for each file
    #[arg(long, short = 'f')]
    output_per_file: bool,

    /// Revision to skip while annotating (repeatable)
    #[arg(long, short = 'i', value_name = "REV")]
    ignore: Vec<String>,

    /// Version control system (default: detect from the repository)
    #[arg(long)]
    vcs: Option<VcsKind>,

    /// Repository path (default: current directory)
    #[arg(long, short = 'C')]
    repo: Option<PathBuf>,

    /// Path to configuration file (default: .revsight.toml in the repository)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        default_value = "text",
        long_help = "Output format for the ranking.\n\n\
                       Formats:\n  \
                         text      One '<author>: <n> lines (<pct>%)' line per reviewer (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown tables"
    )]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

/// Explicit `--config`, else `.revsight.toml` at the detected repository root.
fn load_config(cli: &Cli, repo: &Path) -> Result<RevsightConfig> {
    if let Some(path) = &cli.config {
        return RevsightConfig::from_file(path)
            .wrap_err(format!("loading config {}", path.display()));
    }
    let default_path = revsight_vcs::detect::detect_repository(repo)
        .map(|(_, root)| root.join(".revsight.toml"))
        .unwrap_or_else(|_| repo.join(".revsight.toml"));
    if default_path.exists() {
        if cli.verbose {
            eprintln!("config: {}", default_path.display());
        }
        Ok(RevsightConfig::from_file(&default_path)?)
    } else {
        Ok(RevsightConfig::default())
    }
}

/// CLI flags take precedence over the config file.
fn apply_overrides(cli: &Cli, config: &mut RevsightConfig) {
    if let Some(n) = cli.num_reviewers {
        config.reviewers.num_reviewers = n;
    }
    if let Some(revision) = &cli.revision {
        config.backend.revision = Some(revision.clone());
    }
    if let Some(vcs) = cli.vcs {
        config.backend.vcs = vcs;
    }
    config
        .backend
        .ignore_revisions
        .extend(cli.ignore.iter().cloned());
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let cwd = std::env::current_dir().into_diagnostic()?;
    let repo = match &cli.repo {
        Some(path) => revsight_vcs::paths::absolutize(&cwd, path),
        None => cwd.clone(),
    };

    let mut config = load_config(&cli, &repo)?;
    apply_overrides(&cli, &mut config);
    config.validate()?;

    let filter = PathFilter::from_config(&config.reviewers)?;
    let backend = Backend::open(
        config.backend.vcs,
        &repo,
        BackendOptions::from_config(&config.backend),
    )?;

    let scope = if cli.whole_file {
        Scope::WholeFile
    } else {
        Scope::Diff
    };
    let grouping = if cli.output_per_file {
        Grouping::PerFile
    } else {
        Grouping::Global
    };

    if cli.verbose {
        eprintln!(
            "backend: {} at {}",
            backend.name(),
            backend.root().display()
        );
        eprintln!(
            "revision: {}",
            config
                .backend
                .revision
                .as_deref()
                .unwrap_or(backend.default_revision())
        );
        eprintln!("scope: {scope}, grouping: {grouping}");
        if !config.backend.ignore_revisions.is_empty() {
            eprintln!(
                "ignoring revisions: {}",
                config.backend.ignore_revisions.join(", ")
            );
        }
        if !filter.is_empty() {
            eprintln!("exclude patterns: {}", config.reviewers.exclude.len());
        }
    }

    let request = AttributionRequest {
        files: cli
            .files
            .iter()
            .map(|f| revsight_vcs::paths::absolutize(&cwd, f))
            .collect(),
        revision: config.backend.revision.clone(),
        scope,
        grouping,
        num_reviewers: config.reviewers.num_reviewers,
        filter,
    };

    let report = attribute_reviewers(&backend, &request).await?;

    if cli.verbose {
        let stats = &report.stats;
        eprintln!("--- Attribution Stats ---");
        eprintln!(
            "Files: {} considered, {} with lines, {} annotated",
            stats.files_considered, stats.files_with_lines, stats.files_annotated
        );
        eprintln!("Lines attributed: {}", stats.changed_lines);
        eprintln!("-------------------------");
    }

    if report.scopes.is_empty() && cli.format == OutputFormat::Text {
        eprintln!("No lines to attribute against {}.", report.stats.revision);
        return Ok(());
    }

    let display = DisplayOptions::new(config.reviewers.strip_domains.clone());
    print!("{}", report.render(cli.format, &display)?);

    Ok(())
}
