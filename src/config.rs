// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use serde_derive::Deserialize;
use serde_derive::Serialize;

use log::{info, warn};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::param::DEFAULT_PORT;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_root")]
    root: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_local")]
    local: bool,
    #[serde(default)]
    verbose: bool,
    #[serde(default = "default_read_buffer_size")]
    read_buffer_size: usize,
    #[serde(default = "default_max_request_size")]
    max_request_size: usize,
    #[serde(default = "default_frame_timeout_ms")]
    frame_timeout_ms: u64,
}

fn default_root() -> String {
    ".".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_local() -> bool {
    true
}

fn default_read_buffer_size() -> usize {
    1024
}

fn default_max_request_size() -> usize {
    1048576 // 1MB
}

fn default_frame_timeout_ms() -> u64 {
    200
}

/// 读取或解析配置文件时的错误
#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Toml(toml::de::Error),
    /// 根目录不存在或不是目录
    InvalidRoot(PathBuf),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "无法读取配置文件：{}", e),
            ConfigError::Toml(e) => write!(f, "配置文件格式错误：{}", e),
            ConfigError::InvalidRoot(path) => {
                write!(f, "根目录{}不存在或不是目录", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Toml(e)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            root: default_root(),
            port: default_port(),
            local: default_local(),
            verbose: false,
            read_buffer_size: default_read_buffer_size(),
            max_request_size: default_max_request_size(),
            frame_timeout_ms: default_frame_timeout_ms(),
        }
    }

    /// 从 TOML 文件载入配置。
    ///
    /// 文件不存在时使用默认配置；文件存在但无法解析时返回错误。
    pub fn from_toml(filename: &str) -> Result<Self, ConfigError> {
        let str_val = match fs::read_to_string(filename) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("配置文件{}不存在，使用默认配置", filename);
                return Ok(Config::new());
            }
            Err(e) => return Err(e.into()),
        };
        let mut raw_config: Config = toml::from_str(&str_val)?;
        if raw_config.read_buffer_size == 0 {
            warn!("read_buffer_size被设置为0，该值将被改为{}。", default_read_buffer_size());
            raw_config.read_buffer_size = default_read_buffer_size();
        }
        info!("配置文件{}已载入", filename);
        Ok(raw_config)
    }

    /// 用命令行参数覆盖配置文件中的值
    pub fn merge_cli(&mut self, verbose: bool, port: Option<u16>, root: Option<String>) -> &mut Self {
        if verbose {
            self.verbose = true;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(root) = root {
            self.root = root;
        }
        self
    }

    /// 启动前校验：根目录必须存在且是目录
    pub fn validate_root(&self) -> Result<(), ConfigError> {
        let root = Path::new(&self.root);
        if root.is_dir() {
            Ok(())
        } else {
            Err(ConfigError::InvalidRoot(root.to_path_buf()))
        }
    }
}

impl Config {
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn read_buffer_size(&self) -> usize {
        self.read_buffer_size
    }

    pub fn max_request_size(&self) -> usize {
        self.max_request_size
    }

    pub fn frame_timeout_ms(&self) -> u64 {
        self.frame_timeout_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.port(), 8080);
        assert_eq!(config.root(), ".");
        assert!(!config.verbose());
        assert_eq!(config.read_buffer_size(), 1024);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::from_toml("/no/such/config.toml").unwrap();
        assert_eq!(config, Config::new());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("server.toml");
        fs::write(&file, "root = \"/srv/files\"\nport = 9000\nread_buffer_size = 0\n").unwrap();

        let config = Config::from_toml(file.to_str().unwrap()).unwrap();

        assert_eq!(config.root(), "/srv/files");
        assert_eq!(config.port(), 9000);
        assert_eq!(config.read_buffer_size(), 1024);
        assert_eq!(config.frame_timeout_ms(), 200);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("server.toml");
        fs::write(&file, "port = \"not a number\"").unwrap();

        let result = Config::from_toml(file.to_str().unwrap());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = Config::new();
        config.merge_cli(true, Some(1234), Some("/tmp".to_string()));
        assert!(config.verbose());
        assert_eq!(config.port(), 1234);
        assert_eq!(config.root(), "/tmp");

        config.merge_cli(false, None, None);
        assert!(config.verbose());
        assert_eq!(config.port(), 1234);
    }

    #[test]
    fn test_validate_root() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, "x").unwrap();

        let mut config = Config::new();
        config.merge_cli(false, None, Some(dir.path().to_string_lossy().into_owned()));
        assert!(config.validate_root().is_ok());

        config.merge_cli(false, None, Some(file.to_string_lossy().into_owned()));
        assert!(matches!(config.validate_root(), Err(ConfigError::InvalidRoot(_))));
    }
}
