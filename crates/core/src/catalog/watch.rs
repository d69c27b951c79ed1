use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Notification sent when the custom legend file changes on disk.
#[derive(Debug)]
pub enum LegendFileEvent {
    /// The file was created, modified or removed.
    Changed(PathBuf),
    /// The watcher reported an error.
    Error(String),
}

/// Keeps a filesystem watcher alive for the custom legend file.
///
/// Events are coalesced: if the receiver has not drained the previous
/// notification, new ones are dropped.
pub struct CustomLegendWatcher {
    _watcher: RecommendedWatcher,
    path: PathBuf,
}

impl CustomLegendWatcher {
    /// Watch `path` (its parent directory is created if needed).
    pub fn spawn(path: impl Into<PathBuf>, sender: mpsc::Sender<LegendFileEvent>) -> Result<Self> {
        let path = path.into();
        let parent = path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| anyhow!("{} has no parent directory", path.display()))?;
        fs::create_dir_all(&parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_os_string())
            .ok_or_else(|| anyhow!("{} has no file name", path.display()))?;

        let watched = path.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(err) => {
                    warn!(?err, "Custom legend watcher error");
                    let _ = sender.try_send(LegendFileEvent::Error(err.to_string()));
                    return;
                }
            };
            if !is_content_change(&event.kind) {
                return;
            }
            let touches_file = event
                .paths
                .iter()
                .any(|changed| changed.file_name() == Some(file_name.as_os_str()));
            if touches_file {
                debug!(kind = ?event.kind, "Custom legend file changed");
                let _ = sender.try_send(LegendFileEvent::Changed(watched.clone()));
            }
        })
        .context("failed to create custom legend watcher")?;

        watcher
            .watch(&parent, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", parent.display()))?;

        Ok(Self {
            _watcher: watcher,
            path,
        })
    }

    /// File being watched.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn is_content_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind};

    #[test]
    fn only_content_changes_count() {
        assert!(is_content_change(&EventKind::Create(CreateKind::File)));
        assert!(is_content_change(&EventKind::Modify(ModifyKind::Any)));
        assert!(!is_content_change(&EventKind::Access(
            notify::event::AccessKind::Any
        )));
    }
}
