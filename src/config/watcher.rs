//! Configuration file watcher for hot reload.
//!
//! Reloaded configs are not applied directly: the server builds and installs
//! a new deployment from each one and stages it as *waiting*.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::{load_config, manifest_path};
use crate::config::schema::ProxyConfig;

/// A watcher that monitors the config file (and its precache manifest).
pub struct ConfigWatcher {
    path: PathBuf,
    watched: Vec<PathBuf>,
    update_tx: mpsc::UnboundedSender<ProxyConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher for `path` with its currently loaded config.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(
        path: &Path,
        current: &ProxyConfig,
    ) -> (Self, mpsc::UnboundedReceiver<ProxyConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        let mut watched = vec![path.to_path_buf()];
        watched.extend(manifest_path(path, current));

        (
            Self {
                path: path.to_path_buf(),
                watched,
                update_tx,
            },
            update_rx,
        )
    }

    /// Files whose changes trigger a reload.
    pub fn watched(&self) -> &[PathBuf] {
        &self.watched
    }

    /// Start watching in a background thread.
    ///
    /// Parent directories are watched so editors that replace files
    /// atomically are still noticed.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();
        let targets = self.watched.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let relevant = (event.kind.is_modify() || event.kind.is_create())
                        && event.paths.iter().any(|p| targets.iter().any(|t| p.ends_with(t) || t.ends_with(p)));
                    if !relevant {
                        return;
                    }
                    tracing::info!(path = %path.display(), "Config change detected, reloading");
                    match load_config(&path) {
                        Ok(new_config) => {
                            let _ = tx.send(new_config);
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to reload config; keeping current deployment");
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        let mut dirs: Vec<&Path> = self
            .watched
            .iter()
            .map(|p| p.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new(".")))
            .collect();
        dirs.sort();
        dirs.dedup();
        for dir in dirs {
            watcher.watch(dir, RecursiveMode::NonRecursive)?;
        }

        tracing::info!(files = ?self.watched, "Config watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watches_manifest_alongside_config() {
        let mut config = ProxyConfig::default();
        config.precache.manifest_path = Some("dist/precache-manifest.json".into());

        let (watcher, _rx) = ConfigWatcher::new(Path::new("/etc/offline-proxy/proxy.toml"), &config);
        assert_eq!(
            watcher.watched(),
            &[
                PathBuf::from("/etc/offline-proxy/proxy.toml"),
                PathBuf::from("/etc/offline-proxy/dist/precache-manifest.json"),
            ]
        );
    }
}
