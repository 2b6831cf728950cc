// src/watcher.rs
//! Reloads the dataset when the source files change on disk.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};

use crate::config::Config;
use crate::dataset::DatasetStore;
use crate::monitoring::Metrics;

/// Keeps the debouncer alive; dropping it stops watching.
pub struct DataWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
}

impl DataWatcher {
    pub fn start(config: &Config, store: DatasetStore, metrics: Arc<Metrics>) -> Result<Self> {
        let watched = config.watched_files();
        let names = watched.clone();

        let mut debouncer = new_debouncer(
            Duration::from_millis(config.hot_reload.debounce_ms),
            move |result: DebounceEventResult| match result {
                Ok(events) => {
                    if touches_watched(events.iter().map(|e| e.path.as_path()), &names) {
                        reload(&store, &metrics);
                    }
                }
                Err(err) => log::warn!("Data file watcher error: {:?}", err),
            },
        )
        .context("Failed to create data file watcher")?;

        // Каталоги, а не файлы: редакторы часто заменяют файл целиком
        for dir in watch_dirs(&watched) {
            debouncer
                .watcher()
                .watch(&dir, RecursiveMode::NonRecursive)
                .with_context(|| format!("Failed to watch directory: {}", dir.display()))?;
        }

        log::info!("👁 Watching data files for changes: {:?}", watched);
        Ok(Self { _debouncer: debouncer })
    }
}

fn reload(store: &DatasetStore, metrics: &Metrics) {
    match store.reload() {
        Ok(dataset) => {
            metrics.record_reload(true);
            log::info!(
                "🔄 Data reloaded from {}: {} stock rows, {} sales rows",
                dataset.source,
                dataset.stock.len(),
                dataset.sales.len()
            );
        }
        Err(e) => {
            metrics.record_reload(false);
            log::error!("Data reload failed, keeping previous data: {}", e);
        }
    }
}

fn watch_dirs(files: &[PathBuf]) -> BTreeSet<PathBuf> {
    files
        .iter()
        .map(|f| match f.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        })
        .collect()
}

/// True when any changed path has the file name of a watched file.
pub fn touches_watched<'a, I>(changed: I, watched: &[PathBuf]) -> bool
where
    I: IntoIterator<Item = &'a Path>,
{
    changed.into_iter().any(|path| {
        watched
            .iter()
            .any(|w| w.file_name().is_some() && w.file_name() == path.file_name())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touches_watched() {
        let watched = vec![PathBuf::from("data/skg_data.xlsx")];

        assert!(touches_watched([Path::new("/srv/app/data/skg_data.xlsx")], &watched));
        assert!(!touches_watched([Path::new("/srv/app/data/~$skg_data.xlsx")], &watched));
        assert!(!touches_watched(Vec::<&Path>::new(), &watched));
    }

    #[test]
    fn test_watch_dirs() {
        let dirs = watch_dirs(&[
            PathBuf::from("stock.csv"),
            PathBuf::from("data/sales.csv"),
            PathBuf::from("data/stock.csv"),
        ]);
        assert_eq!(dirs.len(), 2);
        assert!(dirs.contains(&PathBuf::from(".")));
        assert!(dirs.contains(&PathBuf::from("data")));
    }
}
