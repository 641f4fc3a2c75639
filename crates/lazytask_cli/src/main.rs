//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `lazytask_core` linkage.
//! - Print the saved task outline of a database file when one is given.
//!
//! Usage: `lazytask_cli [DB_PATH]`. Set `LAZYTASK_LOG_DIR` to an absolute
//! directory to enable file logging.

use lazytask_core::db::open_db;
use lazytask_core::{
    init_logging, CoreConfig, NodeId, Session, SqliteDocumentRepository, Store,
};
use log::error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = CoreConfig::default();
    if let Ok(log_dir) = std::env::var("LAZYTASK_LOG_DIR") {
        if let Err(err) = init_logging(&config.log_level, log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    println!("lazytask_core ping={}", lazytask_core::ping());
    println!("lazytask_core version={}", lazytask_core::core_version());

    let Some(db_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };
    match print_outline(&db_path, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_outline module=cli status=error error={message}");
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn print_outline(db_path: &str, config: CoreConfig) -> Result<(), String> {
    let conn = open_db(db_path).map_err(|err| err.to_string())?;
    let repo = SqliteDocumentRepository::try_new(&conn).map_err(|err| err.to_string())?;
    let session = Session::from_repository(&repo, config).map_err(|err| err.to_string())?;
    let store = session.document().store();

    let mut path = Vec::new();
    print_children(store, store.root_id(), &mut path)
}

fn print_children(store: &Store, parent: NodeId, path: &mut Vec<NodeId>) -> Result<(), String> {
    path.push(parent);
    for child in store.ordered_children(parent).map_err(|err| err.to_string())? {
        let marker = if child.is_completed() { "[x]" } else { "[ ]" };
        println!("{}{marker} {}", "  ".repeat(path.len() - 1), child.title);
        // A cycle would recurse forever; print the node once and stop.
        if !path.contains(&child.id) {
            print_children(store, child.id, path)?;
        }
    }
    path.pop();
    Ok(())
}
