use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, channel};

use loam_chunk::ChunkStore;
use loam_runtime::GenerationBackend;
use loam_world::load_config_from_path;

/// Watches the directory holding `path` and signals when that file changes.
/// The directory is watched so editors that save by rename are still seen.
pub fn spawn_config_watcher(path: PathBuf) -> Receiver<()> {
    let (tx, rx) = channel::<()>();
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let name = path.file_name().map(|n| n.to_os_string());
    std::thread::spawn(move || {
        use notify::{EventKind, RecursiveMode, Watcher};
        let watcher = notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
            if let Ok(event) = res {
                match event.kind {
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Any => {
                        if event
                            .paths
                            .iter()
                            .any(|p| p.file_name().map(|n| n.to_os_string()) == name)
                        {
                            let _ = tx.send(());
                        }
                    }
                    _ => {}
                }
            }
        });
        match watcher {
            Ok(mut watcher) => {
                if let Err(e) = watcher.watch(dir.as_path(), RecursiveMode::NonRecursive) {
                    log::warn!("cannot watch {}: {}", dir.display(), e);
                    return;
                }
                loop {
                    std::thread::sleep(std::time::Duration::from_secs(3600));
                }
            }
            Err(e) => log::warn!("config watcher unavailable: {}", e),
        }
    });
    rx
}

/// Applies the config at `path` if the watcher fired since the last call.
/// Returns true when the store was reconfigured.
pub fn process_config_events<B: GenerationBackend>(
    rx: &Receiver<()>,
    path: &Path,
    store: &mut ChunkStore<B>,
) -> bool {
    if rx.try_iter().count() == 0 {
        return false;
    }
    if !path.exists() {
        log::warn!("terrain config missing: {}", path.display());
        return false;
    }
    let result = load_config_from_path(path).and_then(|cfg| store.reconfigure(cfg));
    match result {
        Ok(()) => {
            log::info!("terrain config reloaded from {}", path.display());
            true
        }
        Err(e) => {
            log::warn!("terrain config reload failed ({}): {}", path.display(), e);
            false
        }
    }
}
