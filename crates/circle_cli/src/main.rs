//! CLI smoke and inspection entry point.
//!
//! # Responsibility
//! - Verify `circle_core` linkage and open the snapshot database.
//! - Print category trees and contact counts for quick local checks.
//!
//! Usage: `circle [DB_PATH]`. Without a path, `CIRCLE_DB_PATH` or the temp-dir
//! default is used.

use circle_core::config::resolve_db_path;
use circle_core::db::open_db;
use circle_core::{AppState, Dimension, SqliteSnapshotRepository};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("circle_core ping={}", circle_core::ping());
    println!("circle_core version={}", circle_core::core_version());

    let explicit = std::env::args().nth(1);
    let db_path = resolve_db_path(explicit.as_deref());
    println!("db_path={}", db_path.display());

    let app = match open_db(&db_path)
        .map_err(|err| err.to_string())
        .and_then(|conn| SqliteSnapshotRepository::try_new(conn).map_err(|err| err.to_string()))
        .and_then(|repo| AppState::open(repo).map_err(|err| err.to_string()))
    {
        Ok(app) => app,
        Err(err) => {
            eprintln!("failed to open state: {err}");
            return ExitCode::FAILURE;
        }
    };

    println!("contacts={}", app.contacts().len());
    println!("favorites={}", app.list_favorites().len());
    for dimension in Dimension::ALL {
        println!(
            "[{}] nodes={} tagged_contacts={}",
            dimension.as_str(),
            app.categories().len(dimension),
            app.count_by_dimension(dimension)
        );
        for entry in app.categories().entries(dimension) {
            println!(
                "{}- {} ({})",
                "  ".repeat(entry.depth + 1),
                entry.node.name,
                entry.node.color.as_str()
            );
        }
    }
    ExitCode::SUCCESS
}
