// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求处理模块
//!
//! 负责将连接上累积的原始字节解析为强类型的 `Request` 结构体。它涵盖了：
//! 1. 请求报文的分帧判断（HTTP/1.0 没有长度前缀，需要靠空行与 `Content-Length`）。
//! 2. 请求行（Request-Line）的解析（方法、URI）。
//! 3. 请求头（Headers）的逐行解析，以及只属于请求的 `Host` 头的提取。
//! 4. 请求体（Body）的截取。

use std::collections::HashMap;

use bytes::Bytes;
use log::{debug, error};

use crate::{exception::Exception, param::*};

/// 表示一个解析完成的 HTTP 请求。构造后不可变，响应发出后即被丢弃。
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP 请求方法（GET 或 POST）
    method: HttpRequestMethod,
    /// 请求行中的原始 URI
    uri: String,
    /// 除 `Host` 之外的请求头，键保留收到时的大小写
    headers: HashMap<String, String>,
    /// `Host` 头的值。它只属于请求，不会进入响应头
    host: Option<String>,
    /// 空行之后的原始请求体
    body: Bytes,
}

impl Request {
    /// 从原始字节缓冲区尝试构建 `Request` 实例。
    ///
    /// # 逻辑步骤
    /// 1. 在第一个 CRLF CRLF 处切分请求头块与请求体。
    /// 2. 验证编码：只要求请求头块是合法的 UTF-8，请求体按原始字节保留。
    /// 3. 请求头块至少要有两行（请求行 + 至少一个请求头）。
    /// 4. 按单个空格切分请求行，得到方法与 URI；方法区分大小写。
    /// 5. 逐行解析 `名称: 值` 形式的请求头。
    ///
    /// # 参数
    /// * `buffer` - 从连接上累积的原始数据。
    /// * `id` - 连接 ID，用于追踪日志。
    pub fn try_from(buffer: &[u8], id: u128) -> Result<Self, Exception> {
        let (head, body) = match find_terminator(buffer) {
            Some(position) => (
                &buffer[..position],
                &buffer[position + HEADER_TERMINATOR.len()..],
            ),
            None => (buffer, &[][..]),
        };
        let head = match std::str::from_utf8(head) {
            Ok(string) => string,
            Err(_) => {
                error!("[ID{}]无法将HTTP请求头解析为UTF-8", id);
                return Err(Exception::RequestIsNotUtf8);
            }
        };
        Self::parse(head, Bytes::copy_from_slice(body), id)
    }

    /// 解析已解码的请求头块，`body` 为空行之后的原始字节。
    pub fn parse(head: &str, body: Bytes, id: u128) -> Result<Self, Exception> {
        // 末尾多余的换行不算作一行
        let request_lines: Vec<&str> = head.trim_end_matches(CRLF).split(CRLF).collect();
        if request_lines.len() < 2 {
            error!("[ID{}]HTTP请求缺少请求头：{:?}", id, head);
            return Err(Exception::BadRequest);
        }

        // 请求行 (e.g., "GET /index.html HTTP/1.0")
        let first_line_parts: Vec<&str> = request_lines[0].split(' ').collect();
        if first_line_parts.len() < 2 || first_line_parts[1].is_empty() {
            error!("[ID{}]HTTP请求行格式不正确：{}", id, request_lines[0]);
            return Err(Exception::BadRequest);
        }

        let method = match HttpRequestMethod::from_token(first_line_parts[0]) {
            Some(method) => method,
            None => {
                error!("[ID{}]不支持的HTTP请求方法：{}", id, first_line_parts[0]);
                return Err(Exception::NotImplemented);
            }
        };
        let uri = first_line_parts[1].to_string();

        let mut headers = HashMap::new();
        for line in &request_lines[1..] {
            match line.split_once(": ") {
                Some((name, value)) if !name.is_empty() && !name.contains(' ') => {
                    headers.insert(name.to_string(), value.to_string());
                }
                _ => {
                    error!("[ID{}]HTTP请求头格式不正确：{}", id, line);
                    return Err(Exception::BadRequest);
                }
            }
        }

        let host_key = headers
            .keys()
            .find(|name| name.eq_ignore_ascii_case("Host"))
            .cloned();
        let host = host_key.and_then(|key| headers.remove(&key));

        debug!(
            "[ID{}]请求解析完成：{} {}，{}个请求头，请求体{}字节",
            id,
            method,
            uri,
            headers.len(),
            body.len()
        );

        Ok(Self {
            method,
            uri,
            headers,
            host,
            body,
        })
    }
}

/// 第一个 CRLF CRLF 分隔符的起始位置
fn find_terminator(buffer: &[u8]) -> Option<usize> {
    let terminator = HEADER_TERMINATOR.as_bytes();
    buffer
        .windows(terminator.len())
        .position(|window| window == terminator)
}

/// 判断缓冲区中的请求是否已经完整。
///
/// 找到 CRLF CRLF 分隔符，且请求体长度不小于 `Content-Length`（缺省为 0）时视为完整。
/// `Content-Length` 无法解析时同样视为完整，交给解析器去拒绝。
pub fn is_complete(buffer: &[u8]) -> bool {
    let head_end = match find_terminator(buffer) {
        Some(position) => position,
        None => return false,
    };
    let body_len = buffer.len() - head_end - HEADER_TERMINATOR.len();
    let head = String::from_utf8_lossy(&buffer[..head_end]);
    let content_length = head
        .split(CRLF)
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("Content-Length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    body_len >= content_length
}

// --- Getter 访问器实现 ---

impl Request {
    /// 获取请求方法
    pub fn method(&self) -> HttpRequestMethod {
        self.method
    }

    /// 获取请求行中的原始 URI
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// 获取全部请求头（不含 `Host`）
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// 按名称查找请求头，名称不区分大小写
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// 获取 `Host` 头
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// 获取请求体
    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 验证常规 GET 请求的解析，包括 URI 与请求头
    #[test]
    fn test_parse_get_request() {
        let request_str = "GET /docs/a.txt HTTP/1.0\r\nHost: localhost:8080\r\nUser-Agent: Test-Browser\r\n\r\n";

        let request = Request::try_from(request_str.as_bytes(), 0).unwrap();

        assert_eq!(request.method(), HttpRequestMethod::Get);
        assert_eq!(request.uri(), "/docs/a.txt");
        assert_eq!(request.header("user-agent"), Some("Test-Browser"));
        assert!(request.body().is_empty());
    }

    /// `Host` 被取出，不留在请求头集合中
    #[test]
    fn test_host_is_extracted() {
        let request_str = "GET / HTTP/1.0\r\nHost: localhost:8080\r\nAccept: */*\r\n\r\n";

        let request = Request::try_from(request_str.as_bytes(), 0).unwrap();

        assert_eq!(request.host(), Some("localhost:8080"));
        assert!(request.headers().get("Host").is_none());
        assert_eq!(request.headers().len(), 1);
    }

    /// 请求头的键保留收到时的大小写
    #[test]
    fn test_header_case_is_preserved() {
        let request_str = "GET / HTTP/1.0\r\nx-Custom-HEADER: v\r\n\r\n";

        let request = Request::try_from(request_str.as_bytes(), 0).unwrap();

        assert_eq!(request.headers().get("x-Custom-HEADER").map(String::as_str), Some("v"));
    }

    /// POST 请求体在空行之后原样保留
    #[test]
    fn test_parse_post_request() {
        let request_str = "POST /new.txt HTTP/1.0\r\nContent-Length: 5\r\n\r\nhello";

        let request = Request::try_from(request_str.as_bytes(), 0).unwrap();

        assert_eq!(request.method(), HttpRequestMethod::Post);
        assert_eq!(request.uri(), "/new.txt");
        assert_eq!(request.body(), &Bytes::from("hello"));
    }

    /// 请求体中再出现空行也不会被截断
    #[test]
    fn test_body_with_blank_line() {
        let request_str = "POST /a HTTP/1.0\r\nHost: h\r\n\r\nline1\r\n\r\nline2";

        let request = Request::try_from(request_str.as_bytes(), 0).unwrap();

        assert_eq!(request.body(), &Bytes::from("line1\r\n\r\nline2"));
    }

    /// 只有一行、没有空行分隔的请求被拒绝
    #[test]
    fn test_single_line_is_bad_request() {
        for request_str in ["GET / HTTP/1.0", "GET / HTTP/1.0\r\n", "GET / HTTP/1.0\r\n\r\n"] {
            let result = Request::try_from(request_str.as_bytes(), 0);
            assert_eq!(result.unwrap_err(), Exception::BadRequest, "{:?}", request_str);
        }
    }

    /// 请求行只有一个记号时被拒绝
    #[test]
    fn test_short_request_line() {
        let request_str = "GET\r\nHost: h\r\n\r\n";
        assert_eq!(
            Request::try_from(request_str.as_bytes(), 0).unwrap_err(),
            Exception::BadRequest
        );
    }

    /// 请求行可以省略协议版本
    #[test]
    fn test_request_line_without_version() {
        let request_str = "GET /a.txt\r\nHost: h\r\n\r\n";
        let request = Request::try_from(request_str.as_bytes(), 0).unwrap();
        assert_eq!(request.uri(), "/a.txt");
    }

    /// 不支持的方法返回 NotImplemented
    #[test]
    fn test_unsupported_method() {
        for method in ["DELETE", "PUT", "HEAD", "get", "Post"] {
            let request_str = format!("{} /resource HTTP/1.0\r\nHost: h\r\n\r\n", method);
            let result = Request::try_from(request_str.as_bytes(), 0);
            assert_eq!(result.unwrap_err(), Exception::NotImplemented, "{}", method);
        }
    }

    /// 请求头缺少 `: ` 分隔时被拒绝
    #[test]
    fn test_malformed_header() {
        for header in ["NoColon", "Name:value", ": empty-name"] {
            let request_str = format!("GET / HTTP/1.0\r\n{}\r\n\r\n", header);
            let result = Request::try_from(request_str.as_bytes(), 0);
            assert_eq!(result.unwrap_err(), Exception::BadRequest, "{}", header);
        }
    }

    /// 验证 UTF-8 编码检查
    #[test]
    fn test_invalid_utf8() {
        let buffer = vec![0xFF, 0xFE, 0xFD];

        let result = Request::try_from(&buffer, 0);

        assert_eq!(result.unwrap_err(), Exception::RequestIsNotUtf8);
    }

    /// 请求体是原始字节，不要求是 UTF-8；请求头仍然必须是 UTF-8
    #[test]
    fn test_binary_body_is_kept_raw() {
        let mut buffer = b"POST /img.bin HTTP/1.0\r\nContent-Length: 4\r\n\r\n".to_vec();
        buffer.extend_from_slice(&[0x89, 0x50, 0xFF, 0x00]);

        let request = Request::try_from(&buffer, 0).unwrap();
        assert_eq!(request.body().as_ref(), &[0x89u8, 0x50, 0xFF, 0x00][..]);

        let buffer = b"POST /\xFF HTTP/1.0\r\nHost: h\r\n\r\nbody";
        assert_eq!(
            Request::try_from(buffer, 0).unwrap_err(),
            Exception::RequestIsNotUtf8
        );
    }

    #[test]
    fn test_is_complete_needs_separator() {
        assert!(!is_complete(b"GET / HTTP/1.0\r\nHost: h\r\n"));
        assert!(is_complete(b"GET / HTTP/1.0\r\nHost: h\r\n\r\n"));
    }

    #[test]
    fn test_is_complete_waits_for_body() {
        assert!(!is_complete(b"POST /a HTTP/1.0\r\nContent-Length: 5\r\n\r\nhel"));
        assert!(is_complete(b"POST /a HTTP/1.0\r\ncontent-length: 5\r\n\r\nhello"));
        assert!(is_complete(b"POST /a HTTP/1.0\r\nContent-Length: oops\r\n\r\n"));
    }
}
