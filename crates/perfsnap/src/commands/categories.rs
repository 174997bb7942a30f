//! Categories command.

use std::fs;
use std::path::Path;

use perfsnap::{DirSource, Library, LibraryConfig, NameKind, NameTable};
use rayon::prelude::*;
use tracing::{error, info, warn};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};

struct CategoryRow {
    name: String,
    object_id: u32,
    counters: usize,
    instances: Option<usize>,
}

/// Handle the `categories` command.
pub fn cmd_categories(dir: &Path, names: &Path, help: Option<&Path>, jobs: usize) -> i32 {
    let library = match open_library(dir, names, help) {
        Ok(library) => library,
        Err(e) => {
            error!(error = %e, "failed to load library");
            return EXIT_FAILURE;
        }
    };

    let pool = match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "failed to start worker pool");
            return EXIT_FAILURE;
        }
    };

    let categories = library.categories();
    info!(categories = categories.len(), dir = %dir.display(), "decoding categories");

    // Decode every category in parallel; a missing capture only loses its instance count.
    let rows: Vec<CategoryRow> = pool.install(|| {
        categories
            .par_iter()
            .filter_map(|name| {
                let entry = library.category(name).ok()?;
                let instances = match library.sample(name) {
                    Ok(snapshot) => {
                        let count = snapshot.instance_names().len();
                        snapshot.dispose();
                        Some(count)
                    }
                    Err(e) => {
                        warn!(category = %name, error = %e, "cannot sample category");
                        None
                    }
                };
                Some(CategoryRow {
                    name: entry.name,
                    object_id: entry.object_id,
                    counters: library.counters(name).len(),
                    instances,
                })
            })
            .collect()
    });

    for row in &rows {
        let instances = row
            .instances
            .map_or_else(|| "?".to_string(), |count| count.to_string());
        println!(
            "{:>6}  {:<40} counters={:<4} instances={instances}",
            row.object_id, row.name, row.counters
        );
    }
    EXIT_SUCCESS
}

fn open_library(dir: &Path, names: &Path, help: Option<&Path>) -> perfsnap::Result<Library> {
    let names = NameTable::from_lines(NameKind::Counter, &fs::read_to_string(names)?)?;
    let help = match help {
        Some(path) => NameTable::from_lines(NameKind::Help, &fs::read_to_string(path)?)?,
        None => NameTable::new(),
    };
    Library::new(
        Box::new(DirSource::new(dir)),
        names,
        help,
        LibraryConfig::default(),
    )
}
