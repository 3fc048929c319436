//! # Resources 模块
//!
//! 文件系统资源来源。
//!
//! 场景只认识逻辑路径（相对于资源根目录，`/` 分隔），
//! [`FsSource`] 负责把逻辑路径拼接到 `assets_root` 下再做真正的 IO。

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::trace;
use vn_scene::{AssetSource, LoadError, LoadResult, Size, normalize_logical_path};

/// 文件系统资源来源
#[derive(Debug, Clone)]
pub struct FsSource {
    base_path: PathBuf,
}

impl FsSource {
    /// 创建文件系统资源来源
    ///
    /// # 参数
    ///
    /// - `base_path`: 资源根目录
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// 逻辑路径 → 文件系统路径
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.base_path.join(normalize_logical_path(path))
    }
}

impl AssetSource for FsSource {
    fn read_text(&self, path: &str) -> LoadResult<String> {
        let full = self.resolve(path);
        trace!(path = %full.display(), "读取文本资源");
        fs::read_to_string(&full).map_err(|e| match e.kind() {
            ErrorKind::NotFound => LoadError::NotFound {
                path: path.to_string(),
            },
            _ => LoadError::Io {
                path: path.to_string(),
                message: e.to_string(),
            },
        })
    }

    fn image_size(&self, path: &str) -> LoadResult<Size> {
        let full = self.resolve(path);
        if !full.is_file() {
            return Err(LoadError::NotFound {
                path: path.to_string(),
            });
        }
        let (w, h) = image::image_dimensions(&full).map_err(|e| LoadError::InvalidImage {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(Size::new(w as f32, h as f32))
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }
}
