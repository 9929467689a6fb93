// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 文件存储模块
//!
//! 在配置的根目录下执行列目录、读文件、写文件三种操作。每个操作的顺序都是：
//! 解析路径 -> 通过仲裁器占用路径 -> 文件 I/O -> 释放路径。
//! 占用由 [`AccessGuard`](crate::arbiter::AccessGuard) 持有，I/O 一结束就释放，
//! 绝不会跨越随后的网络写出。

use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use bytes::Bytes;
use log::debug;

use crate::{arbiter::AccessArbiter, exception::Exception, param::DIR_MARKER, resolver};

/// 读取到的文件内容及其最后修改时间
#[derive(Debug, Clone)]
pub struct FileContent {
    pub content: Bytes,
    pub last_modified: SystemTime,
}

/// 根目录之下的文件读写入口
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    arbiter: Arc<AccessArbiter>,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>, arbiter: Arc<AccessArbiter>) -> Self {
        Self {
            root: root.into(),
            arbiter,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn arbiter(&self) -> &Arc<AccessArbiter> {
        &self.arbiter
    }

    /// 列出 `uri` 对应目录下的条目名，子目录名以 `/` 结尾。
    ///
    /// 返回结果目录在前、文件在后，各自按名称排序。
    ///
    /// # 错误
    /// - 目录不存在或不是目录：[`Exception::NotFound`]
    /// - 目录为空：[`Exception::NoContent`]
    /// - 目录正被占用：[`Exception::AccessDenied`]
    pub fn list(&self, uri: &str, holder: &str) -> Result<Vec<String>, Exception> {
        let path = resolver::resolve(uri, &self.root)?;
        let entries = {
            let _guard = self.arbiter.acquire(&path, holder)?;
            read_entries(&path)?
        };
        debug!("{} 列出目录 {}，共 {} 项", holder, path.display(), entries.len());
        if entries.is_empty() {
            return Err(Exception::NoContent);
        }
        Ok(entries)
    }

    /// 读取 `uri` 对应的普通文件。
    ///
    /// # 错误
    /// - 文件不存在或不是普通文件：[`Exception::NotFound`]
    /// - 文件正被占用：[`Exception::AccessDenied`]
    pub fn read(&self, uri: &str, holder: &str) -> Result<FileContent, Exception> {
        let path = resolver::resolve(uri, &self.root)?;
        let _guard = self.arbiter.acquire(&path, holder)?;

        let metadata = match fs::metadata(&path) {
            Ok(m) if m.is_file() => m,
            _ => return Err(Exception::NotFound),
        };
        let content = fs::read(&path)?;
        let last_modified = metadata.modified()?;
        debug!("{} 读取文件 {}，{} 字节", holder, path.display(), content.len());
        Ok(FileContent {
            content: Bytes::from(content),
            last_modified,
        })
    }

    /// 将 `content` 写入 `uri` 对应的文件。
    ///
    /// 缺失的上级目录与文件本身会被创建；`append` 为 `false` 时覆盖原内容。
    ///
    /// # 错误
    /// - 文件正被占用：[`Exception::AccessDenied`]
    /// - 其余 I/O 失败：[`Exception::StorageIOError`]
    pub fn write(
        &self,
        uri: &str,
        content: &[u8],
        append: bool,
        holder: &str,
    ) -> Result<(), Exception> {
        let path = resolver::resolve(uri, &self.root)?;
        let _guard = self.arbiter.acquire(&path, holder)?;

        write_file(&path, content, append).map_err(|e| Exception::StorageIOError(e.kind()))?;
        debug!(
            "{} {}文件 {}，{} 字节",
            holder,
            if append { "追加" } else { "写入" },
            path.display(),
            content.len()
        );
        Ok(())
    }
}

fn read_entries(path: &Path) -> Result<Vec<String>, Exception> {
    match fs::metadata(path) {
        Ok(m) if m.is_dir() => {}
        _ => return Err(Exception::NotFound),
    }
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.path().is_dir() {
            dirs.push(format!("{}{}", name, DIR_MARKER));
        } else {
            files.push(name);
        }
    }
    dirs.sort();
    files.sort();
    dirs.extend(files);
    Ok(dirs)
}

fn write_file(path: &Path, content: &[u8], append: bool) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut options = OpenOptions::new();
    options.create(true);
    if append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    let mut file = options.open(path)?;
    file.write_all(content)?;
    file.flush()
}
