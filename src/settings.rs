//! # 服务配置
//!
//! 加载顺序：内置默认值 → `IMAGE_API_SETTINGS` 指向的 JSON 文件 → 环境变量覆盖。
//! JSON 文件中缺失的字段沿用默认值。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// 指向 JSON 配置文件的环境变量。
pub const SETTINGS_FILE_ENV: &str = "IMAGE_API_SETTINGS";

const HOST_ENV: &str = "HOST";
const PORT_ENV: &str = "PORT";
const MAX_BODY_ENV: &str = "IMAGE_API_MAX_BODY_BYTES";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// 单个请求体上限（字节），作用于 multipart 与表单提取器
    pub max_body_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_body_bytes: 25 * 1024 * 1024,
        }
    }
}

impl ServerSettings {
    /// 按默认值、配置文件、环境变量的顺序加载。
    pub fn load() -> Result<Self, AppError> {
        let mut settings = match std::env::var_os(SETTINGS_FILE_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::Settings(format!("读取配置文件失败 {}: {}", path.display(), e))
        })?;
        let settings = serde_json::from_str::<Self>(&content)
            .map_err(|e| AppError::Settings(format!("解析配置文件失败: {}", e)))?;

        log::info!("⚙️ 已加载配置文件: {}", path.display());
        Ok(settings)
    }

    /// 用外部变量覆盖字段；`lookup` 便于测试时注入。
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(HOST_ENV).filter(|h| !h.trim().is_empty()) {
            self.host = host.trim().to_string();
        }
        if let Some(port) = lookup(PORT_ENV) {
            self.port = port
                .trim()
                .parse()
                .map_err(|e| AppError::Settings(format!("{} 无效 ({}): {}", PORT_ENV, port, e)))?;
        }
        if let Some(limit) = lookup(MAX_BODY_ENV) {
            self.max_body_bytes = limit.trim().parse().map_err(|e| {
                AppError::Settings(format!("{} 无效 ({}): {}", MAX_BODY_ENV, limit, e))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_listen_on_8000() {
        let settings = ServerSettings::default();
        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.port, 8000);
    }

    #[test]
    fn env_overrides_replace_fields() {
        let mut settings = ServerSettings::default();
        settings
            .apply_overrides(lookup(&[("PORT", "9090"), ("HOST", "127.0.0.1")]))
            .expect("overrides should apply");

        assert_eq!(settings.port, 9090);
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.max_body_bytes, ServerSettings::default().max_body_bytes);
    }

    #[test]
    fn invalid_port_is_reported() {
        let mut settings = ServerSettings::default();
        let result = settings.apply_overrides(lookup(&[("PORT", "ochenta")]));
        assert!(matches!(result, Err(AppError::Settings(_))));
    }

    #[test]
    fn partial_json_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"port": 8123}}"#).expect("write settings");

        let settings = ServerSettings::from_file(file.path()).expect("settings should parse");

        assert_eq!(settings.port, 8123);
        assert_eq!(settings.host, "0.0.0.0");
    }

    #[test]
    fn malformed_json_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "port = 1").expect("write settings");

        assert!(ServerSettings::from_file(file.path()).is_err());
    }
}
