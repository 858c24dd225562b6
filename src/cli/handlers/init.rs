use std::path::{Path, PathBuf};

use super::start_dir;
use crate::cli::commands::InitArgs;
use crate::io::config_io::{self, DATA_DIR};

/// A data directory in some ancestor of `root`, which a new one would shadow
fn enclosing_data_dir(root: &Path) -> Option<PathBuf> {
    let parent = root.parent()?;
    config_io::discover_data_dir(parent).ok()
}

pub fn cmd_init(args: InitArgs, dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let root = start_dir(dir)?;

    if let Some(outer) = enclosing_data_dir(&root) {
        eprintln!("Note: enclosing checklist directory found at {}/", outer.display());
        eprintln!("Creating new one in ./{}/", DATA_DIR);
    }

    let data_dir = config_io::init_data_dir(&root, args.force)?;
    println!("Initialized {}", data_dir.display());
    Ok(())
}
