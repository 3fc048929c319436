//! # SaveManager 模块
//!
//! 存档文件管理。游戏只有一个存档位，位置由配置的 `save_path` 决定；
//! 脚本每次执行 `save` 动作都会覆盖它。

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;
use vn_scene::{SaveError, SaveRecord};

/// 存档管理器
pub struct SaveManager {
    /// 存档文件路径
    path: PathBuf,
}

impl SaveManager {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 确保存档所在目录存在
    pub fn ensure_dir(&self) -> Result<(), SaveError> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
            && !dir.exists()
        {
            fs::create_dir_all(dir)
                .map_err(|e| SaveError::Io(format!("无法创建存档目录: {}", e)))?;
        }
        Ok(())
    }

    /// 写入存档（覆盖）
    pub fn save(&self, record: &SaveRecord) -> Result<(), SaveError> {
        self.ensure_dir()?;

        let json = record.to_json()?;
        fs::write(&self.path, json)
            .map_err(|e| SaveError::Io(format!("无法写入存档文件: {}", e)))?;

        info!(path = %self.path.display(), resume = %record.resume(), "存档保存成功");
        Ok(())
    }

    /// 读取存档
    pub fn load(&self) -> Result<SaveRecord, SaveError> {
        if !self.path.exists() {
            return Err(SaveError::NotFound(self.path.display().to_string()));
        }

        let json = fs::read_to_string(&self.path)
            .map_err(|e| SaveError::Io(format!("无法读取存档文件: {}", e)))?;
        let record = SaveRecord::from_json(&json)?;

        info!(path = %self.path.display(), resume = %record.resume(), "存档读取成功");
        Ok(record)
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}
