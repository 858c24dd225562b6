mod init;
pub use init::cmd_init;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::debug;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::recovery;
use crate::io::store::JsonStore;
use crate::model::config::Config;
use crate::model::{ItemId, ListId, NodeId};
use crate::ops::check::{self, CheckError};
use crate::ops::editor::Editor;
use crate::ops::item_ops::{InsertPosition, clean_title};
use crate::ops::sections::sections;
use crate::parse::{parse_checklist, serialize_list};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// A loaded data directory, ready for reads and edits
struct Session {
    editor: Editor<JsonStore>,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let dir = cli.dir.as_deref();

    match cli.command {
        Commands::Init(args) => cmd_init(args, dir),

        // Read commands
        Commands::Lists => cmd_lists(dir, json),
        Commands::Show(args) => cmd_show(dir, args, json),
        Commands::Check => cmd_check(dir, json),
        Commands::Export(args) => cmd_export(dir, args),
        Commands::Recovery(args) => cmd_recovery(dir, args, json),

        // Write commands
        Commands::New(args) => cmd_new(dir, args, json),
        Commands::Drop(args) => cmd_drop(dir, args, json),
        Commands::Add(args) => cmd_add(dir, args, json),
        Commands::Title(args) => cmd_title(dir, args, json),
        Commands::Rm(args) => cmd_rm(dir, args, json),
        Commands::Mv(args) => cmd_mv(dir, args, json),
        Commands::Reparent(args) => cmd_reparent(dir, args, json),
        Commands::Indent(args) => cmd_indent(dir, args, json, true),
        Commands::Outdent(args) => cmd_indent(dir, args, json, false),
        Commands::Toggle(args) => cmd_toggle(dir, args, json),
        Commands::Done(args) => cmd_set_completion(dir, args, json, true),
        Commands::Reopen(args) => cmd_set_completion(dir, args, json, false),
        Commands::Import(args) => cmd_import(dir, args, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The directory named by `-C`, or the current directory
pub(super) fn start_dir(dir: Option<&str>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match dir {
        Some(d) => Ok(std::fs::canonicalize(d)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", d, e))?),
        None => Ok(std::env::current_dir()?),
    }
}

/// Locate the data directory and its config. Used by `main` before logging
/// is set up, so it must not fail loudly.
pub fn discover_config(dir: Option<&str>) -> Option<Config> {
    let start = start_dir(dir).ok()?;
    let data_dir = config_io::discover_data_dir(&start).ok()?;
    config_io::read_config(&data_dir).ok()
}

/// Load the store. With `write`, the store lock is taken before reading and
/// held until the session is dropped.
fn open_session(dir: Option<&str>, write: bool) -> Result<Session, Box<dyn std::error::Error>> {
    let start = start_dir(dir)?;
    let data_dir = config_io::discover_data_dir(&start)?;
    let config = config_io::read_config(&data_dir)?;
    let mut json_store = JsonStore::open(&data_dir, &config);
    if write {
        json_store.hold_lock()?;
    }
    let store = json_store.load()?;
    debug!(path = %json_store.path().display(), write, "opened session");

    let editor = Editor::new(store, json_store, config.drag.collapse_timeout())
        .with_recovery(data_dir);
    Ok(Session { editor })
}

fn resolve_list(session: &Session, key: &str) -> Result<ListId, Box<dyn std::error::Error>> {
    session
        .editor
        .store()
        .find(key)
        .map(|l| l.id)
        .ok_or_else(|| format!("no list matching '{}'", key).into())
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}' (expected YYYY-MM-DD)", s))
}

/// `root` (or `0`) means the top level; anything else must be an item id
fn parse_parent(s: &str) -> Result<NodeId, String> {
    if s.eq_ignore_ascii_case("root") || s == "0" {
        return Ok(NodeId::Root);
    }
    s.parse::<u64>()
        .map(|n| NodeId::Item(ItemId(n)))
        .map_err(|_| format!("invalid parent '{}' (expected an item id or 'root')", s))
}

fn print_change(json: bool, change: ChangeJson, text: &str) -> CmdResult {
    if json {
        println!("{}", serde_json::to_string_pretty(&change)?);
    } else {
        println!("{}", text);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_lists(dir: Option<&str>, json: bool) -> CmdResult {
    let session = open_session(dir, false)?;
    let lists = session.editor.store().lists();

    if json {
        let out: Vec<ListSummaryJson> = lists.iter().map(list_summary_json).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if lists.is_empty() {
        println!("No lists. Create one with: ck new <name>");
    } else {
        for list in lists {
            println!("{}", format_list_summary(list));
        }
    }
    Ok(())
}

fn cmd_show(dir: Option<&str>, args: ShowArgs, json: bool) -> CmdResult {
    let session = open_session(dir, false)?;
    let id = resolve_list(&session, &args.list)?;
    let list = session.editor.list(id)?;

    if args.sections {
        let split = sections(list);
        if json {
            println!("{}", serde_json::to_string_pretty(&sections_json(list, &split))?);
            return Ok(());
        }
        println!("# {}", list.name);
        for (heading, ids) in [("Open", &split.open), ("Completed", &split.completed)] {
            if ids.is_empty() {
                continue;
            }
            println!("\n{} ({})", heading, ids.len());
            let mut lines = Vec::new();
            for &item in ids {
                format_subtree(list, item, 0, &mut lines);
            }
            for line in lines {
                println!("{}", line);
            }
        }
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&list_json(list))?);
    } else {
        println!("# {}", list.name);
        for line in format_tree(list) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_check(dir: Option<&str>, json: bool) -> CmdResult {
    let session = open_session(dir, false)?;
    let result = check::check_store(session.editor.store());

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if result.valid {
        println!("All lists valid.");
    } else {
        println!("Errors:");
        for err in &result.errors {
            match err {
                CheckError::DanglingParent { list, item, parent } => {
                    println!("  [{}] {} has missing parent: {}", list, item, parent);
                }
                CheckError::Cycle { list, item } => {
                    println!("  [{}] {} is its own ancestor", list, item);
                }
                CheckError::UnbalancedSiblings {
                    list,
                    parent,
                    orders,
                } => {
                    println!(
                        "  [{}] children of {} have sort orders {:?}",
                        list, parent, orders
                    );
                }
            }
        }
    }

    if !result.valid {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_export(dir: Option<&str>, args: ExportArgs) -> CmdResult {
    let session = open_session(dir, false)?;
    let id = resolve_list(&session, &args.list)?;
    let markdown = serialize_list(session.editor.list(id)?);

    match args.output {
        Some(path) => {
            recovery::atomic_write(Path::new(&path), markdown.as_bytes())?;
            eprintln!("Wrote {}", path);
        }
        None => print!("{}", markdown),
    }
    Ok(())
}

fn cmd_recovery(dir: Option<&str>, args: RecoveryCmd, json: bool) -> CmdResult {
    let start = start_dir(dir)?;
    let data_dir = config_io::discover_data_dir(&start)?;

    match args.action {
        Some(RecoveryAction::Path) => {
            println!("{}", recovery::recovery_log_path(&data_dir).display());
        }
        Some(RecoveryAction::Clear) => {
            let removed = recovery::clear_recovery(&data_dir)?;
            println!("Removed {} entries", removed);
        }
        None => {
            let entries = recovery::read_recovery_entries(&data_dir, Some(args.limit.unwrap_or(10)));
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("Recovery log is empty.");
            } else {
                for entry in &entries {
                    println!(
                        "{}  {}: {}",
                        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        entry.category,
                        entry.description
                    );
                    for (key, value) in &entry.fields {
                        println!("  {}: {}", key, value);
                    }
                    for line in entry.body.lines() {
                        println!("    {}", line);
                    }
                }
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_new(dir: Option<&str>, args: NewArgs, json: bool) -> CmdResult {
    let date = args.date.as_deref().map(parse_date).transpose()?;
    let name = clean_title(&args.name);
    if name.is_empty() {
        return Err("list name cannot be empty".into());
    }

    let mut session = open_session(dir, true)?;
    if session.editor.store().find(&name).is_some() {
        return Err(format!("a list named '{}' already exists", name).into());
    }
    let id = session.editor.create_list(&name, args.template, date)?;
    print_change(
        json,
        ChangeJson {
            list: id.0,
            item: None,
            changed: true,
            completed: None,
        },
        &format!("Created list {}: {}", id, name),
    )
}

fn cmd_drop(dir: Option<&str>, args: ListArg, json: bool) -> CmdResult {
    let mut session = open_session(dir, true)?;
    let id = resolve_list(&session, &args.list)?;
    let removed = session.editor.delete_list(id)?;
    print_change(
        json,
        ChangeJson {
            list: id.0,
            item: None,
            changed: true,
            completed: None,
        },
        &format!(
            "Deleted list {} ({} items, see `ck recovery`)",
            removed.name,
            removed.len()
        ),
    )
}

fn cmd_add(dir: Option<&str>, args: AddArgs, json: bool) -> CmdResult {
    if args.title.trim().is_empty() {
        return Err("item title cannot be empty".into());
    }
    let position = match (args.under, args.after) {
        (Some(parent), _) => InsertPosition::LastChildOf(NodeId::Item(ItemId(parent))),
        (None, Some(sibling)) => InsertPosition::After(ItemId(sibling)),
        (None, None) => InsertPosition::LastChildOf(NodeId::Root),
    };

    let mut session = open_session(dir, true)?;
    let list = resolve_list(&session, &args.list)?;
    let id = session.editor.add_item(list, &args.title, position)?;
    print_change(
        json,
        ChangeJson {
            list: list.0,
            item: Some(id.0),
            changed: true,
            completed: Some(false),
        },
        &format!("Added #{}", id),
    )
}

fn cmd_title(dir: Option<&str>, args: TitleArgs, json: bool) -> CmdResult {
    if args.title.trim().is_empty() {
        return Err("item title cannot be empty".into());
    }
    let mut session = open_session(dir, true)?;
    let list = resolve_list(&session, &args.list)?;
    session.editor.rename(list, ItemId(args.id), &args.title)?;
    print_change(
        json,
        ChangeJson {
            list: list.0,
            item: Some(args.id),
            changed: true,
            completed: None,
        },
        &format!("Renamed #{}", args.id),
    )
}

fn cmd_rm(dir: Option<&str>, args: ItemArgs, json: bool) -> CmdResult {
    let mut session = open_session(dir, true)?;
    let list = resolve_list(&session, &args.list)?;
    let removed = session.editor.delete_item(list, ItemId(args.id))?;
    print_change(
        json,
        ChangeJson {
            list: list.0,
            item: Some(args.id),
            changed: true,
            completed: None,
        },
        &format!("Deleted #{} ({} items)", args.id, removed.len()),
    )
}

fn cmd_mv(dir: Option<&str>, args: MvArgs, json: bool) -> CmdResult {
    let mut session = open_session(dir, true)?;
    let list = resolve_list(&session, &args.list)?;

    let moved = if args.collapse {
        let now = std::time::Instant::now();
        match session.editor.begin_drag(list, args.from, now)? {
            Some(_) => session.editor.drop_drag(list, args.to, now)?,
            None => None,
        }
    } else {
        session.editor.move_rows(list, args.from, args.to)?
    };

    let text = match moved {
        Some(id) => format!("Moved #{}", id),
        None => "Nothing to move".to_string(),
    };
    print_change(
        json,
        ChangeJson {
            list: list.0,
            item: moved.map(|id| id.0),
            changed: moved.is_some(),
            completed: None,
        },
        &text,
    )
}

fn cmd_reparent(dir: Option<&str>, args: ReparentArgs, json: bool) -> CmdResult {
    let parent = parse_parent(&args.parent)?;
    let mut session = open_session(dir, true)?;
    let list = resolve_list(&session, &args.list)?;
    session.editor.move_under(
        list,
        ItemId(args.id),
        parent,
        args.at.unwrap_or(usize::MAX),
    )?;
    print_change(
        json,
        ChangeJson {
            list: list.0,
            item: Some(args.id),
            changed: true,
            completed: None,
        },
        &format!("Moved #{} under {}", args.id, parent),
    )
}

fn cmd_indent(dir: Option<&str>, args: ItemArgs, json: bool, indent: bool) -> CmdResult {
    let mut session = open_session(dir, true)?;
    let list = resolve_list(&session, &args.list)?;
    let id = ItemId(args.id);
    let changed = if indent {
        session.editor.indent(list, id)?
    } else {
        session.editor.outdent(list, id)?
    };

    let text = match (changed, indent) {
        (true, true) => format!("Indented #{}", id),
        (true, false) => format!("Outdented #{}", id),
        (false, true) => format!("#{} has no previous sibling to nest under", id),
        (false, false) => format!("#{} is already at the top level", id),
    };
    print_change(
        json,
        ChangeJson {
            list: list.0,
            item: Some(args.id),
            changed,
            completed: None,
        },
        &text,
    )
}

fn cmd_toggle(dir: Option<&str>, args: ItemArgs, json: bool) -> CmdResult {
    let mut session = open_session(dir, true)?;
    let list = resolve_list(&session, &args.list)?;
    let completed = session.editor.toggle(list, ItemId(args.id))?;
    print_change(
        json,
        ChangeJson {
            list: list.0,
            item: Some(args.id),
            changed: true,
            completed: Some(completed),
        },
        &format!(
            "#{} {}",
            args.id,
            if completed { "completed" } else { "reopened" }
        ),
    )
}

fn cmd_set_completion(dir: Option<&str>, args: ItemArgs, json: bool, completed: bool) -> CmdResult {
    let mut session = open_session(dir, true)?;
    let list = resolve_list(&session, &args.list)?;
    session
        .editor
        .set_completion(list, ItemId(args.id), completed)?;
    print_change(
        json,
        ChangeJson {
            list: list.0,
            item: Some(args.id),
            changed: true,
            completed: Some(completed),
        },
        &format!(
            "#{} {}",
            args.id,
            if completed { "completed" } else { "reopened" }
        ),
    )
}

fn cmd_import(dir: Option<&str>, args: ImportArgs, json: bool) -> CmdResult {
    let text = std::fs::read_to_string(&args.file)
        .map_err(|e| format!("could not read {}: {}", args.file, e))?;
    let parsed = parse_checklist(&text);
    for (line_no, line) in &parsed.skipped {
        eprintln!("warning: {}:{}: not a checklist item: {}", args.file, line_no, line);
    }
    if parsed.entries.is_empty() {
        return Err(format!("no checklist items found in {}", args.file).into());
    }

    let mut session = open_session(dir, true)?;
    let (list, added) = match &args.into {
        Some(key) => {
            let list = resolve_list(&session, key)?;
            (list, session.editor.import(list, &parsed.entries)?)
        }
        None => {
            let name = args
                .name
                .clone()
                .or_else(|| parsed.name.clone())
                .or_else(|| {
                    Path::new(&args.file)
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                })
                .unwrap_or_else(|| "Imported".to_string());
            let name = clean_title(&name);
            if session.editor.store().find(&name).is_some() {
                return Err(format!(
                    "a list named '{}' already exists (use --into to append)",
                    name
                )
                .into());
            }
            session.editor.import_new_list(&name, &parsed.entries)?
        }
    };

    print_change(
        json,
        ChangeJson {
            list: list.0,
            item: None,
            changed: !added.is_empty(),
            completed: None,
        },
        &format!("Imported {} items into list {}", added.len(), list),
    )
}
