// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路径解析模块
//!
//! 将请求 URI 映射到配置根目录下的绝对路径。只做字符串层面的拼接与校验，
//! 不检查文件是否存在，也不访问文件系统。

use std::path::{self, Path, PathBuf};

use crate::exception::Exception;

/// 判断 URI 中是否含有 `..` 路径段。
///
/// 同时按 `/` 与 `\` 切分，避免在 Windows 上被反斜杠绕过。
pub fn has_parent_segment(uri: &str) -> bool {
    uri.split(['/', '\\']).any(|segment| segment == "..")
}

/// 将 `uri` 拼接到 `root` 之下并转换为绝对路径。
///
/// # 错误
/// - URI 含有 `..` 段时返回 [`Exception::PathNotAllowed`]，无论其出现在什么位置。
/// - 无法取得当前工作目录（`root` 为相对路径时需要）时返回
///   [`Exception::StorageIOError`]。
pub fn resolve(uri: &str, root: &Path) -> Result<PathBuf, Exception> {
    if has_parent_segment(uri) {
        return Err(Exception::PathNotAllowed);
    }
    let relative = uri.trim_start_matches(['/', '\\']);
    let joined = if relative.is_empty() {
        root.to_path_buf()
    } else {
        root.join(relative)
    };
    Ok(path::absolute(joined)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_resolve_joins_under_root() {
        let root = Path::new("/srv/data");
        let path = resolve("/docs/a.txt", root).unwrap();
        assert_eq!(path, PathBuf::from("/srv/data/docs/a.txt"));
        assert!(path.is_absolute());
    }

    #[test]
    fn test_resolve_root_uri() {
        let root = Path::new("/srv/data");
        assert_eq!(resolve("/", root).unwrap(), PathBuf::from("/srv/data"));
    }

    #[test]
    fn test_resolve_relative_root_becomes_absolute() {
        let path = resolve("/a.txt", Path::new("data")).unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("data/a.txt"));
    }

    #[test]
    fn test_resolve_does_not_check_existence() {
        let root = Path::new("/definitely/not/here");
        assert!(resolve("/missing.txt", root).is_ok());
    }

    #[test]
    fn test_traversal_rejected() {
        let root = Path::new("/srv/data");
        for uri in ["/../../etc/passwd", "/a/../b", "/a/..", "..", "/a\\..\\b"] {
            assert_eq!(resolve(uri, root), Err(Exception::PathNotAllowed), "{}", uri);
        }
    }

    #[test]
    fn test_dots_inside_names_are_allowed() {
        let root = Path::new("/srv/data");
        assert!(resolve("/a..b/c.txt", root).is_ok());
        assert!(resolve("/.hidden", root).is_ok());
    }

    proptest! {
        #[test]
        fn prop_parent_segment_anywhere_is_rejected(
            before in proptest::collection::vec("[a-z0-9._-]{1,8}", 0..4),
            after in proptest::collection::vec("[a-z0-9._-]{1,8}", 0..4),
        ) {
            let mut segments = before.clone();
            segments.push("..".to_string());
            segments.extend(after.clone());
            let uri = format!("/{}", segments.join("/"));
            prop_assert_eq!(resolve(&uri, Path::new("/srv")), Err(Exception::PathNotAllowed));
        }
    }
}
