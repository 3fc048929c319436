//! # Source 模块
//!
//! 资源来源抽象层。引擎本身不做 IO，所有文件读取和图片尺寸测量都经过
//! [`AssetSource`]，由宿主提供具体实现（文件系统、内存等）。
//!
//! ## 路径约定
//!
//! 引擎内部统一使用**逻辑路径**：相对于资源根目录，`/` 分隔，
//! 已折叠 `.` 和 `..` 组件（见 [`normalize_logical_path`]）。

use std::collections::HashMap;

use crate::error::{LoadError, LoadResult};
use crate::geometry::Size;

/// 资源来源 trait
pub trait AssetSource {
    /// 读取文本资源（manifest、脚本）
    fn read_text(&self, path: &str) -> LoadResult<String>;

    /// 读取图片尺寸
    ///
    /// 引擎只需要尺寸来做布局，真正的纹理加载由宿主的渲染层负责。
    fn image_size(&self, path: &str) -> LoadResult<Size>;

    /// 检查资源是否存在
    fn exists(&self, path: &str) -> bool;
}

/// 规范化逻辑路径
///
/// - 统一使用 `/` 分隔符
/// - 移除 `.` 和空组件
/// - 处理 `..`（向上一级，越过根目录时忽略）
pub fn normalize_logical_path(path: &str) -> String {
    let normalized = path.replace('\\', "/");

    let mut components: Vec<&str> = Vec::new();
    for component in normalized.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            _ => components.push(component),
        }
    }

    components.join("/")
}

/// 将 manifest 的 prefix 与文件引用拼接成逻辑路径
///
/// prefix 可能带也可能不带结尾的 `/`。
pub fn resolve_prefixed(prefix: &str, file: &str) -> String {
    if prefix.is_empty() {
        return normalize_logical_path(file);
    }
    normalize_logical_path(&format!("{}/{}", prefix, file))
}

/// 内存资源来源
///
/// 用于测试和不需要文件系统的宿主。
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    texts: HashMap<String, String>,
    images: HashMap<String, Size>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加文本资源
    pub fn with_text(mut self, path: &str, content: impl Into<String>) -> Self {
        self.insert_text(path, content);
        self
    }

    /// 添加图片资源（只记录尺寸）
    pub fn with_image(mut self, path: &str, w: f32, h: f32) -> Self {
        self.insert_image(path, Size::new(w, h));
        self
    }

    pub fn insert_text(&mut self, path: &str, content: impl Into<String>) {
        self.texts
            .insert(normalize_logical_path(path), content.into());
    }

    pub fn insert_image(&mut self, path: &str, size: Size) {
        self.images.insert(normalize_logical_path(path), size);
    }
}

impl AssetSource for MemorySource {
    fn read_text(&self, path: &str) -> LoadResult<String> {
        let key = normalize_logical_path(path);
        self.texts
            .get(&key)
            .cloned()
            .ok_or(LoadError::NotFound { path: key })
    }

    fn image_size(&self, path: &str) -> LoadResult<Size> {
        let key = normalize_logical_path(path);
        self.images
            .get(&key)
            .copied()
            .ok_or(LoadError::NotFound { path: key })
    }

    fn exists(&self, path: &str) -> bool {
        let key = normalize_logical_path(path);
        self.texts.contains_key(&key) || self.images.contains_key(&key)
    }
}
