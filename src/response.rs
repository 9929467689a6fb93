// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 响应构建模块
//!
//! 包含响应头集合 [`ResponseHeaders`]、状态行 [`StatusLine`] 与完整响应 [`Response`]，
//! 以及按 HTTP/1.0 线格式序列化的逻辑：
//!
//! ```text
//! HTTP/1.0 <code> <reason>\r\n
//! Name: value\r\n
//! ...
//! \r\n
//! <body>\r\n\r\n        (仅当响应体非空)
//! ```

use std::{collections::BTreeMap, fmt, time::SystemTime};

use bytes::Bytes;
use chrono::prelude::*;
use log::error;

use crate::param::*;

/// 响应头集合。头名唯一，输出顺序无语义。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    headers: BTreeMap<String, String>,
}

impl ResponseHeaders {
    /// 每个响应都携带的默认头：`Server`、`Date`、`Connection`、`Content-Type`。
    ///
    /// 每次请求都重新生成，不在请求之间共享。
    pub fn scaffold() -> Self {
        let mut headers = Self::default();
        headers
            .set("Server", SERVER_NAME)
            .set("Date", &format_date(&Utc::now()))
            .set("Connection", "close")
            .set("Content-Type", DEFAULT_CONTENT_TYPE);
        headers
    }

    /// 设置响应头，已存在时覆盖。
    pub fn set(&mut self, name: &str, value: &str) -> &mut Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// 状态行：固定的协议版本、状态码与原因短语
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusLine {
    code: u16,
    reason: &'static str,
}

impl StatusLine {
    pub fn from_code(code: u16) -> Self {
        let reason = match STATUS_CODES.get(&code) {
            Some(&reason) => reason,
            None => {
                error!("非法的状态码：{}。这条错误说明代码编写出现了错误。", code);
                "Unknown"
            }
        };
        Self { code, reason }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn reason(&self) -> &'static str {
        self.reason
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", PROTOCOL, self.code, self.reason)
    }
}

/// 一次请求对应的完整响应
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusLine,
    headers: ResponseHeaders,
    content: Option<Bytes>,
}

impl Response {
    /// 以默认头构建一个 200 响应
    pub fn new() -> Self {
        Self::with_headers(ResponseHeaders::scaffold())
    }

    /// 以给定的头集合构建一个 200 响应
    pub fn with_headers(headers: ResponseHeaders) -> Self {
        Self {
            status: StatusLine::from_code(200),
            headers,
            content: None,
        }
    }

    pub fn set_code(&mut self, code: u16) -> &mut Self {
        self.status = StatusLine::from_code(code);
        self
    }

    /// 设置响应体，同时写入 `Content-Length`。
    pub fn set_content(&mut self, content: Bytes) -> &mut Self {
        self.headers
            .set("Content-Length", &content.len().to_string());
        self.content = Some(content);
        self
    }

    pub fn set_last_modified(&mut self, modified: SystemTime) -> &mut Self {
        self.headers
            .set("Last-Modified", &format_date(&DateTime::<Utc>::from(modified)));
        self
    }

    /// 按线格式序列化响应
    pub fn as_bytes(&self) -> Vec<u8> {
        let mut head = String::new();
        head.push_str(&self.status.to_string());
        head.push_str(CRLF);
        for (name, value) in self.headers.iter() {
            head.push_str(&[name, ": ", value, CRLF].concat());
        }
        head.push_str(CRLF);

        let mut bytes = head.into_bytes();
        if let Some(content) = self.content.as_ref().filter(|c| !c.is_empty()) {
            bytes.extend_from_slice(content);
            bytes.extend_from_slice(HEADER_TERMINATOR.as_bytes());
        }
        bytes
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn status_code(&self) -> u16 {
        self.status.code()
    }

    pub fn information(&self) -> &str {
        self.status.reason()
    }

    pub fn headers(&self) -> &ResponseHeaders {
        &self.headers
    }

    pub fn content(&self) -> Option<&Bytes> {
        self.content.as_ref()
    }
}

/// RFC 1123 格式的 GMT 时间，例如 `Sun, 06 Nov 1994 08:49:37 GMT`
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
