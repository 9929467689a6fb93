// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 请求分发模块
//!
//! 对单个请求执行 `Start -> ParsedOrRejected -> Dispatched -> ResponseBuilt`
//! 的状态流转，每个请求只走一遍，不重试：
//! - `GET` 且 URI 以 `/` 结尾：列目录；
//! - `GET` 其余情况：读文件；
//! - `POST`：覆盖写文件并回显请求体。
//!
//! 任何一步产生的 [`Exception`] 都只在这里被转换一次状态码，之后直接进入序列化。
//! `Dispatcher` 本身不保存任何随请求变化的状态，响应头每次都从默认值重新生成。

use std::time::{Instant, SystemTime};

use bytes::Bytes;
use log::{debug, info, warn};

use crate::{
    exception::Exception,
    param::{HttpRequestMethod, DIR_MARKER},
    request::Request,
    response::Response,
    store::FileStore,
};

/// 分发成功时的结果
#[derive(Debug)]
struct Outcome {
    code: u16,
    content: Bytes,
    last_modified: Option<SystemTime>,
}

enum Stage {
    Start,
    ParsedOrRejected(Result<Request, Exception>),
    Dispatched(Result<Outcome, Exception>),
    ResponseBuilt(Response),
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    store: FileStore,
}

impl Dispatcher {
    pub fn new(store: FileStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// 处理一个完整的原始请求并返回响应。
    ///
    /// 无论请求是否合法都会得到一个带完整状态行与默认头的响应。
    /// `holder` 用于在仲裁器中标识本次请求的占用者。
    pub fn handle(&self, buffer: &[u8], id: u128, holder: &str) -> Response {
        let start_time = Instant::now();
        let mut summary = String::from("-");
        let mut stage = Stage::Start;
        loop {
            stage = match stage {
                Stage::Start => Stage::ParsedOrRejected(Request::try_from(buffer, id)),
                Stage::ParsedOrRejected(Ok(request)) => {
                    summary = format!("{} {}", request.method(), request.uri());
                    Stage::Dispatched(self.dispatch(&request, id, holder))
                }
                Stage::ParsedOrRejected(Err(e)) => Stage::Dispatched(Err(e)),
                Stage::Dispatched(result) => Stage::ResponseBuilt(build_response(result, id)),
                Stage::ResponseBuilt(response) => {
                    info!(
                        "[ID{}] {}, {}, {}, {}ms",
                        id,
                        summary,
                        response.status_code(),
                        response.information(),
                        start_time.elapsed().as_millis()
                    );
                    return response;
                }
            };
        }
    }

    /// 不经解析直接以给定异常生成响应，用于连接层发现的错误。
    pub fn reject(&self, e: Exception, id: u128) -> Response {
        build_response(Err(e), id)
    }

    fn dispatch(&self, request: &Request, id: u128, holder: &str) -> Result<Outcome, Exception> {
        let uri = request.uri();
        match request.method() {
            HttpRequestMethod::Get if uri.ends_with(DIR_MARKER) => {
                debug!("[ID{}]请求的路径是目录：{}", id, uri);
                let entries = self.store.list(uri, holder)?;
                let mut listing = String::new();
                for entry in entries {
                    listing.push_str(&entry);
                    listing.push('\n');
                }
                Ok(Outcome {
                    code: 200,
                    content: Bytes::from(listing),
                    last_modified: None,
                })
            }
            HttpRequestMethod::Get => {
                debug!("[ID{}]请求的路径是文件：{}", id, uri);
                let file = self.store.read(uri, holder)?;
                Ok(Outcome {
                    code: 200,
                    content: file.content,
                    last_modified: Some(file.last_modified),
                })
            }
            HttpRequestMethod::Post => {
                debug!("[ID{}]写入文件：{}，{}字节", id, uri, request.body().len());
                self.store.write(uri, request.body(), false, holder)?;
                Ok(Outcome {
                    code: 201,
                    content: request.body().clone(),
                    last_modified: None,
                })
            }
        }
    }
}

fn build_response(result: Result<Outcome, Exception>, id: u128) -> Response {
    let mut response = Response::new();
    match result {
        Ok(outcome) => {
            response.set_code(outcome.code).set_content(outcome.content);
            if let Some(modified) = outcome.last_modified {
                response.set_last_modified(modified);
            }
        }
        Err(e) => {
            warn!("[ID{}]请求处理失败：{}，返回{}", id, e, e.status_code());
            response.set_code(e.status_code());
        }
    }
    response
}
