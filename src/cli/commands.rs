use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ck", about = concat!("[x] ck v", env!("CARGO_PKG_VERSION"), " - nested checklists"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different directory
    #[arg(short = 'C', long = "dir", global = true)]
    pub dir: Option<String>,

    /// Verbose logging to stderr (-d info, -dd debug, -ddd trace)
    #[arg(short = 'd', long = "debug", action = ArgAction::Count, global = true)]
    pub debug: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a .checklist/ directory here
    Init(InitArgs),
    /// List all checklists
    Lists,
    /// Create a checklist
    New(NewArgs),
    /// Delete a checklist and all of its items
    Drop(ListArg),
    /// Show a checklist as a tree with row numbers
    Show(ShowArgs),
    /// Add an item
    Add(AddArgs),
    /// Change an item's title
    Title(TitleArgs),
    /// Delete an item and its subtree
    Rm(ItemArgs),
    /// Move the row at FROM to row TO (rows as printed by `show`)
    Mv(MvArgs),
    /// Move an item under another item (or the top level) by id
    Reparent(ReparentArgs),
    /// Nest an item under its previous sibling
    Indent(ItemArgs),
    /// Lift an item to its grandparent
    Outdent(ItemArgs),
    /// Flip an item's completion
    Toggle(ItemArgs),
    /// Mark an item (and its subtree) completed
    Done(ItemArgs),
    /// Mark an item, its subtree and its ancestors not completed
    Reopen(ItemArgs),
    /// Validate the structure of every list
    Check,
    /// Print a checklist as markdown
    Export(ExportArgs),
    /// Import a markdown checklist
    Import(ImportArgs),
    /// View or manage the recovery log
    Recovery(RecoveryCmd),
}

#[derive(Args)]
pub struct InitArgs {
    /// Rewrite config.toml even if .checklist/ already exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ListArg {
    /// List id or name
    pub list: String,
}

#[derive(Args)]
pub struct NewArgs {
    /// Name of the new list
    pub name: String,
    /// Mark the list as a template
    #[arg(long)]
    pub template: bool,
    /// Date the list is for (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    /// List id or name
    pub list: String,
    /// Group top-level items into open and completed sections
    #[arg(long)]
    pub sections: bool,
}

#[derive(Args)]
pub struct AddArgs {
    /// List id or name
    pub list: String,
    /// Item title
    pub title: String,
    /// Add as the last child of this item
    #[arg(long, conflicts_with = "after")]
    pub under: Option<u64>,
    /// Add as the next sibling of this item
    #[arg(long)]
    pub after: Option<u64>,
}

#[derive(Args)]
pub struct ItemArgs {
    /// List id or name
    pub list: String,
    /// Item id
    pub id: u64,
}

#[derive(Args)]
pub struct TitleArgs {
    /// List id or name
    pub list: String,
    /// Item id
    pub id: u64,
    /// New title
    pub title: String,
}

#[derive(Args)]
pub struct MvArgs {
    /// List id or name
    pub list: String,
    /// Source row
    pub from: usize,
    /// Destination row
    pub to: usize,
    /// Drag semantics: hide the moved subtree while resolving rows
    #[arg(long)]
    pub collapse: bool,
}

#[derive(Args)]
pub struct ReparentArgs {
    /// List id or name
    pub list: String,
    /// Item id
    pub id: u64,
    /// New parent item id, or "root" for the top level
    pub parent: String,
    /// Position among the new siblings (default: last)
    #[arg(long)]
    pub at: Option<usize>,
}

#[derive(Args)]
pub struct ExportArgs {
    /// List id or name
    pub list: String,
    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Markdown file to import
    pub file: String,
    /// Append to this list instead of creating a new one
    #[arg(long)]
    pub into: Option<String>,
    /// Name for the new list (default: the file's `# ` heading, then its file name)
    #[arg(long, conflicts_with = "into")]
    pub name: Option<String>,
}

#[derive(Args)]
pub struct RecoveryCmd {
    #[command(subcommand)]
    pub action: Option<RecoveryAction>,
    /// Maximum number of entries to show (default: 10)
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Subcommand)]
pub enum RecoveryAction {
    /// Remove every entry
    Clear,
    /// Print the absolute path to the recovery log
    Path,
}
