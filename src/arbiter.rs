// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 文件访问仲裁模块
//!
//! 记录当前正被读写的绝对路径，保证同一路径在任意时刻至多被一个请求占用。
//!
//! - 申请是“一次尝试”的：路径已被占用时立即失败，既不阻塞也不排队。
//! - 读与写一视同仁，均为独占访问，不存在共享读模式。
//! - 登记表由单个互斥锁保护，插入与删除彼此原子。
//!
//! 调用方应当使用 [`AccessArbiter::acquire`] 取得 [`AccessGuard`]，
//! 由守卫在离开作用域时释放路径，这样无论正常返回、`?` 提前返回还是 panic，
//! 登记项都不会泄漏。

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

use log::debug;

use crate::exception::Exception;

/// 活跃文件登记表：绝对路径 -> 占用者标识。
#[derive(Debug, Default)]
pub struct AccessArbiter {
    active_files: Mutex<HashMap<PathBuf, String>>,
}

impl AccessArbiter {
    /// 创建一个空的仲裁器。进程内通常只构造一次，再以 `Arc` 共享。
    pub fn new() -> Self {
        Self::default()
    }

    // 登记表中不存在“更新到一半”的状态，持锁线程 panic 后可以安全地继续使用
    fn registry(&self) -> MutexGuard<'_, HashMap<PathBuf, String>> {
        self.active_files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// 尝试占用 `path`。
    ///
    /// 路径空闲时登记 `holder` 并返回 `Ok(true)`；已被占用时返回 `Ok(false)`，
    /// 调用方应将其视为“忙”，而不是“等待”。
    ///
    /// # 错误
    /// `path` 不是绝对路径时返回 [`Exception::NotAbsolutePath`]。
    pub fn try_acquire(&self, path: &Path, holder: &str) -> Result<bool, Exception> {
        if !path.is_absolute() {
            return Err(Exception::NotAbsolutePath);
        }
        let mut registry = self.registry();
        if registry.contains_key(path) {
            return Ok(false);
        }
        registry.insert(path.to_path_buf(), holder.to_string());
        Ok(true)
    }

    /// 无条件移除 `path` 的登记项。重复调用无副作用。
    pub fn release(&self, path: &Path) {
        self.registry().remove(path);
    }

    /// 占用 `path` 并返回作用域守卫。
    ///
    /// # 错误
    /// - 路径已被占用时返回 [`Exception::AccessDenied`]。
    /// - 路径不是绝对路径时返回 [`Exception::NotAbsolutePath`]。
    pub fn acquire(&self, path: &Path, holder: &str) -> Result<AccessGuard<'_>, Exception> {
        if self.try_acquire(path, holder)? {
            debug!("{} 占用了 {}", holder, path.display());
            Ok(AccessGuard {
                arbiter: self,
                path: path.to_path_buf(),
            })
        } else {
            debug!("{} 申请 {} 失败：路径正被占用", holder, path.display());
            Err(Exception::AccessDenied)
        }
    }

    /// 查询路径当前的占用者。
    pub fn holder(&self, path: &Path) -> Option<String> {
        self.registry().get(path).cloned()
    }

    pub fn is_held(&self, path: &Path) -> bool {
        self.registry().contains_key(path)
    }

    /// 当前被占用的路径数量。
    pub fn active_count(&self) -> usize {
        self.registry().len()
    }
}

/// 路径占用守卫。析构时释放对应路径。
#[derive(Debug)]
pub struct AccessGuard<'a> {
    arbiter: &'a AccessArbiter,
    path: PathBuf,
}

impl AccessGuard<'_> {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for AccessGuard<'_> {
    fn drop(&mut self) {
        self.arbiter.release(&self.path);
    }
}
