use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// PID-файл, созданный этим процессом
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn create(path: &Path) -> Result<Self> {
        fs::write(path, format!("{}\n", std::process::id()))?;
        debug!("PID-файл создан: {:?}", path);
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn remove(self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("PID-файл удалён: {:?}", self.path),
            Err(e) => warn!("Не удалось удалить PID-файл {:?}: {}", self.path, e),
        }
    }
}
