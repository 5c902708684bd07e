//! # 字体解析模块
//!
//! ## 设计思路
//!
//! 候选字体列表是显式可注入的 `FontCatalog`，而不是散落在代码里的字面量，
//! 测试可以替换成确定性的字体环境（例如只用内置字体）。
//!
//! ## 实现思路
//!
//! - 按顺序逐个尝试候选项，第一个成功即停止。
//! - 任一候选失败（不存在、不可读、不是字体、字号非法）都只记 debug 日志并继续，绝不报错。
//! - 裸文件名（如 `arial.ttf`）先查当前目录，再递归查找平台字体目录。
//! - 全部失败时回退到内置 8×8 点阵字体，此时字号被忽略。
//!
//! 每次调用都会重新探测文件系统，不做跨请求缓存。

use rusttype::{Font, Scale, point};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 覆盖默认候选列表的环境变量（按系统 PATH 语法分隔）。
pub const FONT_CANDIDATES_ENV: &str = "IMAGE_API_FONT_CANDIDATES";

/// 默认候选字体，按优先级排列。
pub const DEFAULT_FONT_CANDIDATES: [&str; 6] = [
    "arial.ttf",
    "arialbd.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "C:/Windows/Fonts/arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
];

/// 内置点阵字体的字形边长（像素）。
pub const BUILTIN_GLYPH_SIZE: u32 = 8;

/// 有序的字体候选列表与裸文件名的搜索目录。
#[derive(Debug, Clone)]
pub struct FontCatalog {
    candidates: Vec<PathBuf>,
    search_dirs: Vec<PathBuf>,
}

/// 单次调用内解析得到的字体。
pub enum FontHandle {
    /// 可缩放字体，已绑定字号。
    Scalable {
        font: Font<'static>,
        scale: Scale,
        source: PathBuf,
    },
    /// 内置固定尺寸点阵字体。
    BuiltIn,
}

impl std::fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalable { scale, source, .. } => f
                .debug_struct("Scalable")
                .field("source", source)
                .field("scale", &scale.y)
                .finish(),
            Self::BuiltIn => f.write_str("BuiltIn"),
        }
    }
}

impl Default for FontCatalog {
    fn default() -> Self {
        Self::new(
            DEFAULT_FONT_CANDIDATES.iter().map(PathBuf::from).collect(),
            Self::platform_font_dirs(),
        )
    }
}

impl FontCatalog {
    pub fn new(candidates: Vec<PathBuf>, search_dirs: Vec<PathBuf>) -> Self {
        Self {
            candidates,
            search_dirs,
        }
    }

    /// 没有任何候选项，始终使用内置字体。
    pub fn builtin_only() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    /// 默认目录 + 环境变量覆盖后的候选列表。
    pub fn from_env() -> Self {
        let mut catalog = Self::default();
        if let Some(raw) = std::env::var_os(FONT_CANDIDATES_ENV) {
            let candidates: Vec<PathBuf> = std::env::split_paths(&raw)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
            if !candidates.is_empty() {
                log::info!("🔤 使用环境变量指定的字体候选：{:?}", candidates);
                catalog.candidates = candidates;
            }
        }
        catalog
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// 按优先级解析字体，永不失败。
    pub fn resolve(&self, font_size: i32) -> FontHandle {
        for candidate in &self.candidates {
            match self.try_load(candidate, font_size) {
                Ok(handle) => {
                    log::debug!("🔤 使用字体：{}（字号 {}）", candidate.display(), font_size);
                    return handle;
                }
                Err(reason) => {
                    log::debug!("字体候选不可用：{} - {}", candidate.display(), reason);
                }
            }
        }

        log::warn!(
            "⚠️ 未找到可用的字体，回退到内置 {}px 点阵字体（请求字号 {} 被忽略）",
            BUILTIN_GLYPH_SIZE,
            font_size
        );
        FontHandle::BuiltIn
    }

    fn try_load(&self, candidate: &Path, font_size: i32) -> Result<FontHandle, String> {
        if font_size <= 0 {
            return Err(format!("字号无效：{}", font_size));
        }

        let path = self
            .locate(candidate)
            .ok_or_else(|| "文件不存在".to_string())?;
        let data = std::fs::read(&path).map_err(|e| format!("读取失败：{}", e))?;
        let font = Font::try_from_vec(data).ok_or_else(|| "不是有效的字体文件".to_string())?;
        let scale = Self::em_scale(&font, font_size as f32);

        Ok(FontHandle::Scalable {
            font,
            scale,
            source: path,
        })
    }

    /// 字号按 em 尺寸解释，换算成 rusttype 需要的行高尺寸。
    fn em_scale(font: &Font<'static>, em_px: f32) -> Scale {
        let units_per_em = font.units_per_em() as f32;
        let metrics = font.v_metrics_unscaled();
        let height_units = metrics.ascent - metrics.descent;

        if units_per_em <= 0.0 || height_units <= 0.0 {
            return Scale::uniform(em_px);
        }
        Scale::uniform(em_px * height_units / units_per_em)
    }

    /// 带目录的候选直接判断是否存在；裸文件名先查当前目录再查字体目录。
    fn locate(&self, candidate: &Path) -> Option<PathBuf> {
        if candidate.is_file() {
            return Some(candidate.to_path_buf());
        }

        let is_bare_name = candidate.parent().is_none_or(|p| p.as_os_str().is_empty());
        if !is_bare_name {
            return None;
        }

        let wanted = candidate.file_name()?.to_string_lossy();
        self.search_dirs.iter().find_map(|dir| {
            WalkDir::new(dir)
                .follow_links(true)
                .into_iter()
                .filter_map(Result::ok)
                .find(|entry| {
                    entry.file_type().is_file()
                        && entry
                            .file_name()
                            .to_string_lossy()
                            .eq_ignore_ascii_case(&wanted)
                })
                .map(|entry| entry.into_path())
        })
    }

    fn platform_font_dirs() -> Vec<PathBuf> {
        let mut dirs_found = Vec::new();

        if cfg!(windows) {
            if let Some(windir) = std::env::var_os("WINDIR") {
                dirs_found.push(PathBuf::from(windir).join("Fonts"));
            }
        } else if cfg!(target_os = "macos") {
            dirs_found.push(PathBuf::from("/Library/Fonts"));
            dirs_found.push(PathBuf::from("/System/Library/Fonts"));
        } else {
            dirs_found.push(PathBuf::from("/usr/share/fonts"));
            dirs_found.push(PathBuf::from("/usr/local/share/fonts"));
            if let Some(home) = dirs::home_dir() {
                dirs_found.push(home.join(".fonts"));
            }
        }

        if let Some(user_fonts) = dirs::font_dir() {
            dirs_found.push(user_fonts);
        }

        dirs_found
    }
}

impl FontHandle {
    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::BuiltIn)
    }

    /// 多行文字的基础行距（像素），不含额外行距。
    ///
    /// 取字母 `A` 绘制在行顶时像素包围盒的下边界。
    pub fn line_advance(&self) -> u32 {
        match self {
            Self::Scalable { font, scale, .. } => {
                let ascent = font.v_metrics(*scale).ascent;
                font.glyph('A')
                    .scaled(*scale)
                    .positioned(point(0.0, ascent))
                    .pixel_bounding_box()
                    .map(|bb| bb.max.y.max(0) as u32)
                    .unwrap_or_else(|| ascent.ceil().max(0.0) as u32)
            }
            Self::BuiltIn => BUILTIN_GLYPH_SIZE,
        }
    }
}
