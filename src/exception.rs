// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了文件服务器在请求处理生命周期中可能产生的各类异常情况。
//!
//! ## 设计意图
//! - **错误分类**：涵盖协议解析错误、路径越权、文件占用以及底层存储错误。
//! - **语义映射**：每个变体都对应唯一的 HTTP 状态码，由 [`Exception::status_code`]
//!   在分发边界统一转换，各层之间只通过 `Result` 传递，不做任何重试。

use std::{fmt, io};

/// 服务器处理请求过程中发生的异常类型。
///
/// 该枚举通常作为 `Result` 的 `Err` 部分返回，用于指示处理失败的具体原因。
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Exception {
    /// 客户端发送的请求字节流无法解析为合法的 UTF-8 字符串。
    RequestIsNotUtf8,
    /// 请求行或请求头格式不正确。对应 `400 Bad Request`。
    BadRequest,
    /// 请求报文超出了单个连接允许累积的最大长度。
    RequestTooLarge,
    /// 客户端使用了 GET/POST 之外的方法。对应 `501 Not Implemented`。
    NotImplemented,
    /// 请求的 URI 含有 `..` 路径段，试图访问根目录之外的文件。
    /// 对应 `401 Unauthorized`（语义上相当于 403）。
    PathNotAllowed,
    /// 交给仲裁器的路径不是绝对路径。属于内部错误。
    NotAbsolutePath,
    /// 文件或目录不存在，或者请求读取的目标不是普通文件。
    NotFound,
    /// 目录存在但为空。对应 `204 No Content`。
    NoContent,
    /// 该路径正被另一个进行中的请求占用。对应 `503 Service Unavailable`。
    AccessDenied,
    /// 读写文件系统时发生的其余 I/O 错误。
    StorageIOError(io::ErrorKind),
}

use Exception::*;

impl Exception {
    /// 将异常映射为响应状态码。
    ///
    /// 这是整个请求处理流程中唯一的错误到状态码的转换点。
    pub fn status_code(&self) -> u16 {
        match self {
            RequestIsNotUtf8 | BadRequest | RequestTooLarge => 400,
            PathNotAllowed => 401,
            NotFound => 404,
            NoContent => 204,
            AccessDenied => 503,
            NotImplemented => 501,
            NotAbsolutePath | StorageIOError(_) => 500,
        }
    }
}

impl From<io::Error> for Exception {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => NotFound,
            kind => StorageIOError(kind),
        }
    }
}

/// 为 `Exception` 实现 `Display` 特性，使其支持字符串格式化输出。
impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestIsNotUtf8 => write!(f, "Request bytes can't be parsed in UTF-8"),
            BadRequest => write!(f, "Malformed request line or headers"),
            RequestTooLarge => write!(f, "Request exceeds the maximum accepted size"),
            NotImplemented => write!(f, "Request method is not implemented"),
            PathNotAllowed => write!(f, "The path cannot contain \"..\""),
            NotAbsolutePath => write!(f, "The provided file path is not an absolute path"),
            NotFound => write!(f, "File or directory not found"),
            NoContent => write!(f, "Directory is empty"),
            AccessDenied => write!(f, "The file is already being consulted by another request"),
            StorageIOError(kind) => write!(f, "Storage I/O error: {}", kind),
        }
    }
}

impl std::error::Error for Exception {}
