use std::fs;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde_json::json;

use crate::config::TrackerConfig;
use crate::query::{self, GraphSubType, GraphType, ProjectSort};
use crate::runtime;
use crate::scan::ScanError;
use crate::stats::{is_valid_delay, Edits, NetAddRemove, RangeName, TimeRange};
use crate::store::SqliteStore;
use crate::usage::UsageTime;
use crate::util::{self, ms_to_time};

#[derive(Parser)]
#[command(author, version, about = "devtally coding activity tracker")]
pub struct Cli {
    #[arg(short, long, global = true, action = ArgAction::Count, help = "Increase verbosity (-v, -vv)")]
    verbose: u8,
    #[arg(long, global = true, value_name = "DIR", help = "Data directory (defaults to ~/.devtally)")]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Count lines and characters under a folder
    Scan(ScanArgs),
    /// Feed activity into the tracker
    #[command(subcommand)]
    Record(RecordCommands),
    /// Totals for one time range
    Progress(ProgressArgs),
    /// Most used languages of all time
    Languages(LanguagesArgs),
    /// Known projects of a time range
    Projects(ProjectsArgs),
    /// Inspect or edit a single project
    #[command(subcommand)]
    Project(ProjectCommands),
    /// Ranked breakdown of projects or languages
    Graph(GraphArgs),
    /// Write the full snapshot as JSON
    Export(ExportArgs),
    /// Merge an exported snapshot into the stored one
    Import(ImportArgs),
    /// Forget the language breakdown of every range and project
    ResetLanguages,
    /// Forget everything
    Reset(ResetArgs),
}

#[derive(Args)]
pub struct ScanArgs {
    #[arg(help = "Folder to scan (defaults to CWD)")]
    pub path: Option<PathBuf>,
    #[arg(long = "allow", value_name = "EXT", help = "Allowed file extension, repeatable")]
    pub allow: Vec<String>,
    #[arg(long = "deny", value_name = "GLOB", help = "Excluded glob, repeatable")]
    pub deny: Vec<String>,
    #[arg(long, help = "Also skip entries listed in .gitignore")]
    pub gitignore: bool,
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum RecordCommands {
    /// Add coding time
    Time(RecordTimeArgs),
    /// Add an edit
    Edit(RecordEditArgs),
    /// Add inter-keystroke delays
    Keys(RecordKeysArgs),
}

#[derive(Args)]
pub struct RecordTimeArgs {
    #[arg(long, value_name = "MS")]
    pub ms: f64,
    #[arg(short, long)]
    pub language: String,
    #[arg(short, long)]
    pub project: Option<String>,
    #[arg(long, help = "Window was not focused")]
    pub inactive: bool,
}

#[derive(Args)]
pub struct RecordEditArgs {
    #[arg(short, long)]
    pub language: String,
    #[arg(short, long)]
    pub project: Option<String>,
    #[arg(long, default_value_t = 0)]
    pub lines_added: i64,
    #[arg(long, default_value_t = 0)]
    pub lines_removed: i64,
    #[arg(long, default_value_t = 0)]
    pub chars_added: i64,
    #[arg(long, default_value_t = 0)]
    pub chars_removed: i64,
    #[arg(long, help = "Paste or autofill; left out of the without-bulk counter")]
    pub bulk: bool,
}

#[derive(Args)]
pub struct RecordKeysArgs {
    #[arg(required = true, value_name = "MS", allow_negative_numbers = true)]
    pub delays: Vec<f64>,
}

#[derive(Args)]
pub struct ProgressArgs {
    #[arg(short, long, default_value = "todayTime")]
    pub range: RangeName,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct LanguagesArgs {
    #[arg(long)]
    pub top: Option<usize>,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ProjectsArgs {
    #[arg(short, long, default_value = "allTime")]
    pub range: RangeName,
    #[arg(long, default_value = "time")]
    pub sort: ProjectSort,
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// Stats and metadata of one project
    Show(ProjectShowArgs),
    /// Change the display name
    Rename(ProjectRenameArgs),
    /// Fold projects into the first one given
    Merge(ProjectMergeArgs),
    /// Remember scan filters for a project
    Filters(ProjectFiltersArgs),
}

#[derive(Args)]
pub struct ProjectShowArgs {
    pub path: String,
    #[arg(short, long, default_value = "allTime")]
    pub range: RangeName,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ProjectRenameArgs {
    pub path: String,
    pub name: String,
}

#[derive(Args)]
pub struct ProjectMergeArgs {
    #[arg(help = "Project that is kept")]
    pub kept: String,
    #[arg(required = true, help = "Projects merged into it")]
    pub sources: Vec<String>,
}

#[derive(Args)]
pub struct ProjectFiltersArgs {
    pub path: String,
    #[arg(long = "allow", value_name = "EXT")]
    pub allow: Vec<String>,
    #[arg(long = "deny", value_name = "GLOB")]
    pub deny: Vec<String>,
}

#[derive(Args)]
pub struct GraphArgs {
    #[arg(short, long, default_value = "allTime")]
    pub range: RangeName,
    #[arg(long, default_value = "project", help = "project, language or a project path")]
    pub rank: String,
    #[arg(long = "type", default_value = "time")]
    pub kind: GraphType,
    #[arg(long, default_value = "total")]
    pub subtype: GraphSubType,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ExportArgs {
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ImportArgs {
    #[arg(help = "Snapshot file, or - for stdin")]
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ResetArgs {
    #[arg(long, help = "Confirm wiping every statistic")]
    pub yes: bool,
}

struct Session {
    usage: UsageTime,
    config: TrackerConfig,
    dirty: bool,
}

pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    runtime::init_tracing(cli.verbose)?;

    let data_dir = util::resolve_data_root(cli.data_dir)?;
    let config = TrackerConfig::load(&data_dir)?;
    let store = SqliteStore::open(&data_dir)?;
    tracing::debug!(db = %store.path().display(), "opened snapshot store");
    let mut usage = UsageTime::load(Box::new(store), config.save_interval())?;
    let rolled = usage.roll_over(util::now_millis(), &config.roll_over_policy());

    let mut session = Session {
        usage,
        config,
        dirty: !rolled.is_empty(),
    };
    match cli.command {
        Commands::Scan(args) => handle_scan(&session, args),
        Commands::Record(cmd) => handle_record(&mut session, cmd),
        Commands::Progress(args) => handle_progress(&session, args),
        Commands::Languages(args) => handle_languages(&session, args),
        Commands::Projects(args) => handle_projects(&session, args),
        Commands::Project(cmd) => handle_project(&mut session, cmd),
        Commands::Graph(args) => handle_graph(&session, args),
        Commands::Export(args) => handle_export(&session, args),
        Commands::Import(args) => handle_import(&mut session, args),
        Commands::ResetLanguages => {
            session.usage.delete_all_language_data();
            session.dirty = true;
            println!("Language data deleted");
            Ok(())
        }
        Commands::Reset(args) => handle_reset(&mut session, args),
    }?;

    if session.dirty {
        session.usage.save(true)?;
    }
    Ok(())
}

fn handle_scan(session: &Session, args: ScanArgs) -> Result<()> {
    let root = match args.path {
        Some(path) => path,
        None => std::env::current_dir().context("failed to get current working directory")?,
    };
    let key = root.to_string_lossy().to_string();

    let (allowed, denied) = if args.allow.is_empty() && args.deny.is_empty() {
        match session.usage.project_info.get(&key) {
            Some(info) => session.config.search_filters(&info.search),
            None => (
                session.config.default_allowed_extensions.clone(),
                session.config.default_excluded_globs.clone(),
            ),
        }
    } else {
        (args.allow, args.deny)
    };
    let mut options = session.config.scan_options();
    if args.gitignore && !options.ignore_files.iter().any(|f| f == ".gitignore") {
        options.ignore_files.push(".gitignore".to_string());
    }

    match query::scan_lines(&key, &allowed, &denied, &options) {
        Ok(stats) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Scanned {}", root.display());
                println!("  Lines:      {}", stats.lines);
                println!("  Characters: {}", stats.characters);
                println!("  Files:      {}", stats.files);
                println!("  Folders:    {}", stats.folders);
                if stats.has_unreachable_files {
                    println!("  Some files or folders could not be read and were skipped.");
                }
            }
            Ok(())
        }
        Err(query::QueryError::Scan(err)) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&err)?);
            }
            match err {
                ScanError::InvalidPath => bail!("{err} ({})", root.display()),
                ScanError::Unexpected(_) => bail!(err),
            }
        }
        Err(err) => Err(err.into()),
    }
}

fn handle_record(session: &mut Session, cmd: RecordCommands) -> Result<()> {
    if !session.config.track_stats {
        bail!("stat tracking is turned off (track_stats = false)");
    }
    let usage = &mut session.usage;
    match cmd {
        RecordCommands::Time(args) => {
            if !args.ms.is_finite() || args.ms < 0.0 {
                bail!("--ms must be a non-negative number");
            }
            usage.update_code_time(
                args.ms,
                &args.language,
                !args.inactive,
                args.project.as_deref(),
            );
            println!("Recorded {} of {}", ms_to_time(args.ms, 0), args.language);
        }
        RecordCommands::Edit(args) => {
            let characters = NetAddRemove::new(args.chars_added, args.chars_removed);
            let edits = Edits {
                lines: NetAddRemove::new(args.lines_added, args.lines_removed),
                characters,
                characters_wb: if args.bulk {
                    NetAddRemove::default()
                } else {
                    characters
                },
            };
            usage.update_edits(&edits, &args.language, args.project.as_deref());
            println!(
                "Recorded edit: +{} -{} lines",
                args.lines_added, args.lines_removed
            );
        }
        RecordCommands::Keys(args) => {
            if let Some(bad) = args.delays.iter().find(|delay| !is_valid_delay(**delay)) {
                bail!("keystroke delays must be non-negative numbers (got {bad})");
            }
            for delay in &args.delays {
                usage.add_to_wpm(*delay);
            }
            println!("Recorded {} keystrokes", args.delays.len());
        }
    }
    session.dirty = true;
    Ok(())
}

fn handle_progress(session: &Session, args: ProgressArgs) -> Result<()> {
    let response = query::progress(&session.usage, args.range);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }
    let range = response.progress;
    println!("{} (tracking since {})", args.range, util::format_timestamp(session.usage.start_time));
    println!(
        "  Code time:  {} ({} active)",
        ms_to_time(range.code_time.total_time, 0),
        ms_to_time(range.code_time.active_time, 0)
    );
    print_edits(range);
    println!(
        "  Typing:     {} chars/s, {} wpm",
        response.cps,
        range.typing.wpm()
    );
    println!("  Projects:   {}", range.projects.len());
    if args.range != RangeName::AllTime {
        println!("  Resets:     {}", util::format_timestamp(range.resets));
    }
    Ok(())
}

fn print_edits(range: &TimeRange) {
    let edits = &range.edits;
    println!(
        "  Lines:      +{} -{} (net {})",
        edits.lines.added, edits.lines.removed, edits.lines.net
    );
    println!(
        "  Characters: +{} -{} (net {}, {} without bulk)",
        edits.characters.added,
        edits.characters.removed,
        edits.characters.net,
        edits.characters_wb.net
    );
}

fn handle_languages(session: &Session, args: LanguagesArgs) -> Result<()> {
    let top = query::top_languages(&session.usage, args.top);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&top)?);
    } else if top.top.is_empty() {
        println!("No languages recorded yet");
    } else {
        println!("Most used languages:");
        for (name, language) in &top.top {
            println!("  - {:<20} {}", name, ms_to_time(language.time.total_time, 0));
        }
        if let Some(other) = &top.other {
            println!(
                "  - {:<20} {}",
                format!("{} others", other.amount),
                ms_to_time(other.time.total_time, 0)
            );
        }
    }
    Ok(())
}

fn handle_projects(session: &Session, args: ProjectsArgs) -> Result<()> {
    let projects = query::all_project_info(&session.usage, args.range, args.sort);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&projects)?);
    } else if projects.is_empty() {
        println!("No projects tracked yet");
    } else {
        println!("Projects ({}):", args.range);
        for project in projects {
            println!(
                "  - {} ({}) {}",
                project.name,
                project.path,
                ms_to_time(project.time, 0)
            );
        }
    }
    Ok(())
}

fn handle_project(session: &mut Session, cmd: ProjectCommands) -> Result<()> {
    match cmd {
        ProjectCommands::Show(args) => {
            let response = query::project(&mut session.usage, args.range, &args.path)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
                return Ok(());
            }
            let project = &response.project;
            println!("Project: {}", response.info.name);
            println!("Path: {}", response.path);
            println!(
                "Code time: {} ({} active)",
                ms_to_time(project.time.total_time, 0),
                ms_to_time(project.time.active_time, 0)
            );
            println!(
                "Lines: +{} -{} (net {})",
                project.edits.lines.added, project.edits.lines.removed, project.edits.lines.net
            );
            println!("Languages:");
            for (name, language) in &project.languages {
                println!("  - {:<20} {}", name, ms_to_time(language.time.total_time, 0));
            }
            let search = &response.info.search;
            if !search.is_default_ia {
                println!(
                    "Scan filters: allow [{}] deny [{}]",
                    search.allowed_file_extensions.join(", "),
                    search.ignored_file_folder_names.join(", ")
                );
            }
        }
        ProjectCommands::Rename(args) => {
            session.usage.rename_project(&args.path, &args.name)?;
            session.dirty = true;
            println!("Renamed {}", args.path);
        }
        ProjectCommands::Merge(args) => {
            let mut paths = vec![args.kept.clone()];
            paths.extend(args.sources);
            query::merge_projects(&mut session.usage, &paths)?;
            session.dirty = true;
            println!("Merged {} project(s) into {}", paths.len() - 1, args.kept);
        }
        ProjectCommands::Filters(args) => {
            session
                .usage
                .update_search(&args.path, args.allow, args.deny)?;
            session.dirty = true;
            println!("Saved scan filters for {}", args.path);
        }
    }
    Ok(())
}

fn handle_graph(session: &Session, args: GraphArgs) -> Result<()> {
    let data = query::graph_data(
        &session.usage,
        args.range,
        &args.rank,
        args.kind,
        args.subtype,
    )?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }
    println!("{} {} by {} ({})", args.kind, args.subtype, args.rank, args.range);
    for slice in &data.data {
        let share = if data.total_amount != 0.0 {
            slice.amount / data.total_amount * 100.0
        } else {
            0.0
        };
        println!("  - {:<30} {:>12} {:>5.1}%", slice.name, slice.amount, share);
    }
    println!("Total: {}", data.total_amount);
    Ok(())
}

fn handle_export(session: &Session, args: ExportArgs) -> Result<()> {
    let text = query::export_json(&session.usage)?;
    match args.output {
        Some(path) => {
            fs::write(&path, text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Exported snapshot to {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn handle_import(session: &mut Session, args: ImportArgs) -> Result<()> {
    let text = if args.file.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read snapshot from stdin")?;
        buf
    } else {
        fs::read_to_string(&args.file)
            .with_context(|| format!("failed to read {}", args.file.display()))?
    };
    query::import_json(&mut session.usage, &text)?;
    session.dirty = true;
    println!("Combined and updated stats");
    Ok(())
}

fn handle_reset(session: &mut Session, args: ResetArgs) -> Result<()> {
    if !args.yes {
        let summary = json!({
            "projects": session.usage.project_info.len(),
            "allTimeMs": session.usage.all_time.code_time.total_time,
        });
        bail!("refusing to reset without --yes (would drop {summary})");
    }
    session.usage.reset_all(util::now_millis());
    session.dirty = true;
    println!("All statistics reset");
    Ok(())
}
