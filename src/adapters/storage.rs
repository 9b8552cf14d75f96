use crate::domain::ports::{ConfigProvider, Storage};
use crate::utils::error::{Result, TedError};
use std::fs;
use std::path::{Path, PathBuf};

/// Writes artifacts below a base directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Rooted at the configured output directory.
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self::new(config.output_path())
    }

    fn full_path(&self, path: &str) -> PathBuf {
        Path::new(&self.base_path).join(path)
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let data = fs::read(self.full_path(path))?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);
        let write_error = |source| TedError::FileWriteError {
            path: full_path.display().to_string(),
            source,
        };

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }

        // 已存在的檔案會被覆蓋
        fs::write(&full_path, data).map_err(write_error)?;
        Ok(())
    }

    fn display_path(&self, path: &str) -> String {
        self.full_path(path).display().to_string()
    }
}
