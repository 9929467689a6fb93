// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 协议参数与常量模块
//!
//! 该模块定义了 `fileserver` 遵循的 HTTP/1.0 协议相关常量和数据结构，包括：
//! - 本服务器会产生的状态码及其原因短语（Reason Phrase）。
//! - 响应头的默认值。
//! - HTTP 方法的强类型枚举。

use std::{collections::HashMap, fmt};

use lazy_static::lazy_static;

/// 响应状态行中固定使用的协议版本
pub const PROTOCOL: &str = "HTTP/1.0";

/// 服务器名称标识，用于 HTTP 响应头的 `Server` 字段
pub const SERVER_NAME: &str = "Winnor";

/// HTTP 协议规定的换行符（Carriage Return Line Feed）
pub const CRLF: &str = "\r\n";

/// 请求头与请求体之间的分隔符
pub const HEADER_TERMINATOR: &str = "\r\n\r\n";

/// 响应默认的内容类型。本服务器不做 MIME 协商。
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// 默认监听端口
pub const DEFAULT_PORT: u16 = 8080;

/// 目录列表中标记子目录的后缀
pub const DIR_MARKER: char = '/';

lazy_static! {
    /// HTTP 状态码与其对应的标准原因短语映射表。
    ///
    /// 只收录本服务器实际会返回的状态码。
    pub static ref STATUS_CODES: HashMap<u16, &'static str> = {
        let mut map = HashMap::new();
        // 2xx: 成功响应 (Successful)
        map.insert(200, "OK");
        map.insert(201, "Created");
        map.insert(204, "No Content");

        // 4xx: 客户端错误 (Client Error)
        map.insert(400, "Bad Request");
        map.insert(401, "Unauthorized");
        map.insert(404, "Not Found");

        // 5xx: 服务端错误 (Server Error)
        map.insert(500, "Internal Server Error");
        map.insert(501, "Not Implemented");
        map.insert(503, "Service Unavailable");
        map
    };
}

/// 本服务器支持的 HTTP 请求方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpRequestMethod {
    /// 读取文件或列出目录
    Get,
    /// 写入文件
    Post,
}

impl HttpRequestMethod {
    /// 区分大小写地匹配方法名，其余方法一律视为不支持。
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "GET" => Some(HttpRequestMethod::Get),
            "POST" => Some(HttpRequestMethod::Post),
            _ => None,
        }
    }
}

impl fmt::Display for HttpRequestMethod {
    /// 将枚举格式化为 HTTP 标准大写方法名
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpRequestMethod::Get => write!(f, "GET"),
            HttpRequestMethod::Post => write!(f, "POST"),
        }
    }
}
