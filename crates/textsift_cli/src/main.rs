//! Command-line front end for textsift.
//!
//! # Responsibility
//! - Translate subcommands into lifecycle manager calls.
//! - Render entries as plain text or JSON.
//!
//! # Invariants
//! - `NotFound` is reported as a no-op with exit code 0, whether the id was
//!   given in full or as a prefix that matches nothing.
//! - Persistence failures always exit non-zero.

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fmt::Display;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use textsift_core::{
    classify, default_config_path, init_logging, CoreConfig, Entry, EntryId, EntryStore,
    LifecycleError, LifecycleManager, StoreState,
};

const EXIT_USAGE: u8 = 1;
const EXIT_STORE: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "textsift", version, about = "Classify text and manage its trash lifecycle")]
struct Cli {
    /// Config file (defaults to the platform config directory).
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Store document, overriding `data_file` from the config.
    #[arg(short = 'f', long = "data-file", global = true)]
    data_file: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error.
    #[arg(long = "log-level", global = true)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files.
    #[arg(long = "log-dir", global = true)]
    log_dir: Option<PathBuf>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the category of each argument without storing anything.
    Classify {
        #[arg(required = true)]
        texts: Vec<String>,
    },
    #[command(flatten)]
    Store(StoreCommand),
}

/// Subcommands that read or write the store document.
#[derive(Subcommand, Debug)]
enum StoreCommand {
    /// Classify and store one entry per argument.
    Submit {
        #[arg(required = true)]
        texts: Vec<String>,
    },
    /// List stored entries.
    List {
        #[arg(value_enum, default_value_t = ListTarget::Active)]
        target: ListTarget,
    },
    /// Move an active entry to the trash.
    Trash { id: String },
    /// Move a trashed entry back to the active collection.
    Restore { id: String },
    /// Permanently delete a trashed entry.
    Delete { id: String },
    /// Permanently delete every trashed entry.
    EmptyTrash,
    /// Show per-category counts.
    Stats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ListTarget {
    Active,
    Trash,
    All,
}

/// Failure that ends the process with a specific exit code.
#[derive(Debug)]
struct CliFailure {
    code: u8,
    message: String,
}

impl CliFailure {
    fn usage(message: impl Into<String>) -> Self {
        Self {
            code: EXIT_USAGE,
            message: message.into(),
        }
    }

    fn store(message: impl Into<String>) -> Self {
        Self {
            code: EXIT_STORE,
            message: message.into(),
        }
    }
}

impl From<LifecycleError> for CliFailure {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Persistence(_) => Self::store(format!("store failure: {err}")),
            other => Self::usage(other.to_string()),
        }
    }
}

impl From<io::Error> for CliFailure {
    fn from(err: io::Error) -> Self {
        Self::usage(format!("failed to write output: {err}"))
    }
}

impl From<serde_json::Error> for CliFailure {
    fn from(err: serde_json::Error) -> Self {
        Self::usage(format!("failed to encode output: {err}"))
    }
}

/// JSON envelope for commands that do not return entries.
#[derive(Debug, Serialize)]
struct ActionResponse {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    entry_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    removed: Option<usize>,
    message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            entry_id: None,
            removed: None,
            message: message.into(),
        }
    }

    fn noop(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            ..Self::success(message)
        }
    }

    fn with_entry_id(mut self, id: EntryId) -> Self {
        self.entry_id = Some(id.to_string());
        self
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            eprintln!("error: {}", failure.message);
            ExitCode::from(failure.code)
        }
    }
}

fn run(cli: Cli) -> Result<(), CliFailure> {
    let config = resolve_config(&cli)?;

    // Logging is diagnostic only; a broken log dir must not block commands.
    if let Err(err) = init_logging(&config.log_level, &config.log_dir) {
        eprintln!("warning: logging disabled: {err}");
    }
    log::info!(
        "event=cli_start module=cli status=ok version={}",
        textsift_core::core_version()
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Command::Classify { texts } => print_classification(&mut out, &texts, cli.json),
        Command::Store(command) => {
            let manager = config.open_manager()?;
            dispatch(&manager, command, cli.json, &mut out)
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<CoreConfig, CliFailure> {
    let path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = CoreConfig::load(&path).map_err(|err| CliFailure::usage(err.to_string()))?;
    if let Some(data_file) = &cli.data_file {
        config.data_file = data_file.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = dir.clone();
    }
    config
        .validate()
        .map_err(|err| CliFailure::usage(err.to_string()))?;
    Ok(config)
}

fn dispatch<S: EntryStore, W: Write>(
    manager: &LifecycleManager<S>,
    command: StoreCommand,
    json: bool,
    out: &mut W,
) -> Result<(), CliFailure> {
    match command {
        StoreCommand::Submit { texts } => {
            let created = if texts.len() == 1 {
                vec![manager.submit(texts.into_iter().next().unwrap_or_default())?]
            } else {
                let outcome = manager.submit_batch(texts)?;
                outcome.kept.into_iter().chain(outcome.trashed).collect()
            };
            print_entries(out, &created, json)
        }
        StoreCommand::List { target } => {
            let entries = match target {
                ListTarget::Active => manager.list_active(),
                ListTarget::Trash => manager.list_trash(),
                ListTarget::All => {
                    let snapshot = manager.snapshot();
                    snapshot
                        .active()
                        .iter()
                        .chain(snapshot.trash())
                        .cloned()
                        .collect()
                }
            };
            print_entries(out, &entries, json)
        }
        StoreCommand::Trash { id } => {
            let noop = "nothing to move to trash";
            match resolve_id(&manager.snapshot(), &id)? {
                Some(id) => report(out, manager.move_to_trash(id), noop, json),
                None => print_noop(out, noop, unmatched(&id), json),
            }
        }
        StoreCommand::Restore { id } => {
            let noop = "nothing to restore";
            match resolve_id(&manager.snapshot(), &id)? {
                Some(id) => report(out, manager.restore(id), noop, json),
                None => print_noop(out, noop, unmatched(&id), json),
            }
        }
        StoreCommand::Delete { id } => {
            let noop = "nothing to delete";
            let Some(id) = resolve_id(&manager.snapshot(), &id)? else {
                return print_noop(out, noop, unmatched(&id), json);
            };
            match manager.delete_permanently(id) {
                Ok(()) => {
                    let message = format!("deleted {id}");
                    if json {
                        print_json(out, &ActionResponse::success(message).with_entry_id(id))
                    } else {
                        writeln!(out, "{message}")?;
                        Ok(())
                    }
                }
                Err(err) if err.is_not_found() => print_noop(out, noop, err, json),
                Err(err) => Err(err.into()),
            }
        }
        StoreCommand::EmptyTrash => {
            let removed = manager.empty_trash()?;
            let message = format!("removed {removed} entries from trash");
            if json {
                let mut response = ActionResponse::success(message);
                response.removed = Some(removed);
                print_json(out, &response)
            } else {
                writeln!(out, "{message}")?;
                Ok(())
            }
        }
        StoreCommand::Stats => {
            let stats = manager.stats();
            if json {
                return print_json(out, &stats);
            }
            writeln!(out, "active formulas: {}", stats.active_formulas)?;
            writeln!(out, "active normal:   {}", stats.active_normal)?;
            writeln!(out, "trash:           {}", stats.trash)?;
            writeln!(out, "total:           {}", stats.total)?;
            Ok(())
        }
    }
}

/// Prints the transitioned entry, or a no-op notice for `NotFound`.
fn report<W: Write>(
    out: &mut W,
    result: Result<Entry, LifecycleError>,
    noop: &str,
    json: bool,
) -> Result<(), CliFailure> {
    match result {
        Ok(entry) => print_entries(out, std::slice::from_ref(&entry), json),
        Err(err) if err.is_not_found() => print_noop(out, noop, err, json),
        Err(err) => Err(err.into()),
    }
}

fn print_noop<W: Write>(
    out: &mut W,
    noop: &str,
    reason: impl Display,
    json: bool,
) -> Result<(), CliFailure> {
    let message = format!("{noop}: {reason}");
    if json {
        return print_json(out, &ActionResponse::noop(message));
    }
    writeln!(out, "{message}")?;
    Ok(())
}

fn unmatched(raw: &str) -> String {
    format!("no entry id starts with `{raw}`")
}

/// Accepts a full UUID or a unique prefix of one.
///
/// Returns `None` when a prefix matches no stored entry, so callers can
/// treat it like any other missing id.
fn resolve_id(state: &StoreState, raw: &str) -> Result<Option<EntryId>, CliFailure> {
    if let Ok(id) = EntryId::parse_str(raw) {
        return Ok(Some(id));
    }

    let prefix = raw.trim().to_ascii_lowercase();
    if prefix.is_empty() {
        return Err(CliFailure::usage("entry id cannot be empty"));
    }
    let matches: Vec<EntryId> = state
        .active()
        .iter()
        .chain(state.trash())
        .map(|entry| entry.id)
        .filter(|id| id.to_string().starts_with(&prefix))
        .collect();

    match matches.as_slice() {
        [] => Ok(None),
        [id] => Ok(Some(*id)),
        _ => Err(CliFailure::usage(format!(
            "id prefix `{raw}` matches {} entries",
            matches.len()
        ))),
    }
}

fn print_classification<W: Write>(
    out: &mut W,
    texts: &[String],
    json: bool,
) -> Result<(), CliFailure> {
    if json {
        let items: Vec<_> = texts
            .iter()
            .map(|text| serde_json::json!({ "content": text, "type": classify(text) }))
            .collect();
        return print_json(out, &items);
    }
    for text in texts {
        writeln!(out, "{:<8} {text:?}", classify(text).as_str())?;
    }
    Ok(())
}

fn print_entries<W: Write>(out: &mut W, entries: &[Entry], json: bool) -> Result<(), CliFailure> {
    if json {
        return print_json(out, entries);
    }
    if entries.is_empty() {
        writeln!(out, "(no entries)")?;
        return Ok(());
    }
    for entry in entries {
        writeln!(
            out,
            "{}  {}  {:<7} {:<6} {:?}",
            entry.id,
            entry.created_at.format(textsift_core::TIMESTAMP_FORMAT),
            entry.category.as_str(),
            entry.status.as_str(),
            entry.content
        )?;
    }
    Ok(())
}

fn print_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<(), CliFailure> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{dispatch, resolve_id, ListTarget, StoreCommand, EXIT_STORE, EXIT_USAGE};
    use textsift_core::{Category, Entry, EntryId, LifecycleManager, MemoryStore, StoreState};

    fn manager() -> LifecycleManager<MemoryStore> {
        LifecycleManager::open(MemoryStore::new()).unwrap()
    }

    fn run(
        manager: &LifecycleManager<MemoryStore>,
        command: StoreCommand,
        json: bool,
    ) -> Result<String, u8> {
        let mut out = Vec::new();
        dispatch(manager, command, json, &mut out).map_err(|failure| failure.code)?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn entry_with_id(raw: &str, content: &str, category: Category) -> Entry {
        let mut entry = Entry::new(content, category);
        entry.id = EntryId::parse_str(raw).unwrap();
        entry
    }

    #[test]
    fn unmatched_prefix_is_a_noop_like_a_full_id() {
        let manager = manager();
        let entry = manager.submit("!!!").unwrap();
        manager.delete_permanently(entry.id).unwrap();
        let full = entry.id.to_string();
        let prefix = full[..8].to_string();

        let by_prefix = run(&manager, StoreCommand::Restore { id: prefix.clone() }, false).unwrap();
        assert!(by_prefix.starts_with("nothing to restore:"));
        let by_full = run(&manager, StoreCommand::Restore { id: full }, false).unwrap();
        assert!(by_full.starts_with("nothing to restore:"));

        for command in [
            StoreCommand::Trash { id: prefix.clone() },
            StoreCommand::Delete { id: prefix },
        ] {
            assert!(run(&manager, command, false).unwrap().starts_with("nothing to"));
        }
        assert_eq!(manager.store().save_count(), 2);
    }

    #[test]
    fn unique_prefix_resolves_to_the_entry() {
        let manager = manager();
        let entry = manager.submit("x = 1").unwrap();
        let prefix = entry.id.to_string()[..6].to_uppercase();

        assert_eq!(
            resolve_id(&manager.snapshot(), &prefix).unwrap(),
            Some(entry.id)
        );
        run(&manager, StoreCommand::Trash { id: prefix }, false).unwrap();
        assert_eq!(manager.list_trash()[0].id, entry.id);
    }

    #[test]
    fn empty_or_ambiguous_id_is_a_usage_failure() {
        let state = StoreState::from_parts(
            vec![
                entry_with_id("aaaa0000-0000-4000-8000-000000000001", "a+b", Category::Formula),
                entry_with_id("aaaa0000-0000-4000-8000-000000000002", "c+d", Category::Formula),
            ],
            Vec::new(),
        )
        .unwrap();
        let manager = LifecycleManager::open(MemoryStore::with_state(state)).unwrap();

        let empty = run(&manager, StoreCommand::Trash { id: "  ".into() }, false);
        assert_eq!(empty.unwrap_err(), EXIT_USAGE);
        let ambiguous = run(&manager, StoreCommand::Trash { id: "aaaa".into() }, false);
        assert_eq!(ambiguous.unwrap_err(), EXIT_USAGE);
        assert_eq!(manager.list_active().len(), 2);
    }

    #[test]
    fn failed_flush_exits_with_store_code() {
        let manager = manager();
        manager.store().fail_writes(true);

        let result = run(
            &manager,
            StoreCommand::Submit {
                texts: vec!["a = b".into()],
            },
            false,
        );
        assert_eq!(result.unwrap_err(), EXIT_STORE);
    }

    #[test]
    fn list_all_prints_active_then_trash() {
        let manager = manager();
        let kept = manager.submit("y = 2").unwrap();
        let junk = manager.submit("???").unwrap();

        let text = run(
            &manager,
            StoreCommand::List {
                target: ListTarget::All,
            },
            true,
        )
        .unwrap();
        let listed: serde_json::Value = serde_json::from_str(&text).unwrap();
        let ids: Vec<_> = listed
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec![kept.id.to_string(), junk.id.to_string()]);
    }

    #[test]
    fn delete_and_empty_trash_render_json() {
        let manager = manager();
        let first = manager.submit("!").unwrap();
        manager.submit("@@").unwrap();

        let deleted = run(
            &manager,
            StoreCommand::Delete {
                id: first.id.to_string(),
            },
            true,
        )
        .unwrap();
        let deleted: serde_json::Value = serde_json::from_str(&deleted).unwrap();
        assert_eq!(deleted["ok"], true);
        assert_eq!(deleted["entry_id"], first.id.to_string());

        let emptied = run(&manager, StoreCommand::EmptyTrash, true).unwrap();
        let emptied: serde_json::Value = serde_json::from_str(&emptied).unwrap();
        assert_eq!(emptied["ok"], true);
        assert_eq!(emptied["removed"], 1);

        let missing = run(
            &manager,
            StoreCommand::Delete {
                id: first.id.to_string(),
            },
            true,
        )
        .unwrap();
        let missing: serde_json::Value = serde_json::from_str(&missing).unwrap();
        assert_eq!(missing["ok"], false);
    }
}
