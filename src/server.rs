// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 连接事件循环
//!
//! 基于 Tokio 单线程运行时的非阻塞多路复用：监听套接字只负责接受连接，
//! 每个连接作为同一线程上的一个任务，在可读就绪时尽量多地读取数据，
//! 凑成完整请求后交给 [`Dispatcher`]，写回响应后立即关闭（HTTP/1.0，无长连接）。
//!
//! 每个连接拥有独立的累积缓冲区，不同连接之间不共享任何读写缓冲。
//! 单线程意味着某个连接写出大响应时会拖慢其他连接，这是有意接受的取舍。

use std::{
    future::Future,
    io,
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    sync::Arc,
    time::Duration,
};

use log::{debug, error, info, warn};
use tokio::{
    io::AsyncWriteExt,
    net::{TcpListener, TcpStream},
    time::timeout,
};

use crate::{config::Config, dispatcher::Dispatcher, exception::Exception, request};

/// 单个连接读取请求时使用的参数
#[derive(Debug, Clone, Copy)]
pub struct ConnectionOptions {
    /// 单次读取的缓冲容量
    pub read_buffer_size: usize,
    /// 单个请求允许累积的最大字节数
    pub max_request_size: usize,
    /// 请求尚未完整时等待后续数据的最长时间
    pub frame_timeout: Duration,
}

impl ConnectionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            read_buffer_size: config.read_buffer_size().max(1),
            max_request_size: config.max_request_size(),
            frame_timeout: Duration::from_millis(config.frame_timeout_ms()),
        }
    }
}

/// 一次读取循环的结果
#[derive(Debug)]
enum Frame {
    /// 可以交给解析器的请求字节
    Request(Vec<u8>),
    /// 请求超过了允许的最大长度
    TooLarge,
}

pub struct Server {
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    options: ConnectionOptions,
}

impl Server {
    /// 按配置绑定监听地址。
    pub async fn bind(config: &Config, dispatcher: Arc<Dispatcher>) -> io::Result<Self> {
        // 支持全地址监听 (0.0.0.0) 或本地回环监听 (127.0.0.1)
        let address = match config.local() {
            true => Ipv4Addr::new(127, 0, 0, 1),
            false => Ipv4Addr::new(0, 0, 0, 0),
        };
        let socket = SocketAddrV4::new(address, config.port());
        let listener = TcpListener::bind(socket).await?;
        info!("服务端在{}上监听Socket连接", listener.local_addr()?);
        Ok(Self {
            listener,
            dispatcher,
            options: ConnectionOptions::from_config(config),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// 持续接受连接，直到进程退出。
    pub async fn run(self) -> io::Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// 持续接受连接，直到 `shutdown` 完成。
    pub async fn run_until<F>(self, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut id: u128 = 0;
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("主循环接收到停机指令，正在退出...");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, addr) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            error!("接受连接失败：{}", e);
                            continue;
                        }
                    };
                    debug!("[ID{}]新的连接：{}", id, addr);
                    let dispatcher = Arc::clone(&self.dispatcher);
                    let options = self.options;
                    tokio::spawn(async move {
                        handle_connection(stream, addr, id, dispatcher, options).await;
                    });
                    id += 1; // 增加连接唯一标识序列
                }
            }
        }
    }
}

/// 处理单个连接：读取请求、分发、写回响应、关闭。
async fn handle_connection(
    mut stream: TcpStream,
    addr: SocketAddr,
    id: u128,
    dispatcher: Arc<Dispatcher>,
    options: ConnectionOptions,
) {
    let frame = match read_request(&stream, id, &options).await {
        Ok(Some(frame)) => frame,
        Ok(None) => {
            debug!("[ID{}]客户端在发送请求前关闭了连接", id);
            return;
        }
        Err(e) => {
            error!("[ID{}]读取TCPStream时遇到错误: {}", id, e);
            return;
        }
    };

    let response = match frame {
        Frame::Request(buffer) => {
            debug!("[ID{}]收到请求：\n{}", id, String::from_utf8_lossy(&buffer));
            dispatcher.handle(&buffer, id, &addr.to_string())
        }
        Frame::TooLarge => {
            warn!("[ID{}]请求超过{}字节，拒绝处理", id, options.max_request_size);
            dispatcher.reject(Exception::RequestTooLarge, id)
        }
    };

    let response_bytes = response.as_bytes();
    debug!("[ID{}]发送响应：\n{}", id, String::from_utf8_lossy(&response_bytes));
    if let Err(e) = stream.write_all(&response_bytes).await {
        error!("[ID{}]发送响应失败: {}", id, e);
        return;
    }
    if let Err(e) = stream.shutdown().await {
        debug!("[ID{}]关闭连接时出错: {}", id, e);
    }
}

/// 在连接上累积字节，直到得到一个可处理的请求。
///
/// - `try_read` 返回 `WouldBlock` 表示暂时没有数据，回到就绪等待；
/// - 返回 0 表示对端关闭：尚未收到任何数据时返回 `None`，否则按已收到的数据处理；
/// - 已有部分数据但在 `frame_timeout` 内没有更多数据到达时，按已收到的数据处理。
async fn read_request(
    stream: &TcpStream,
    id: u128,
    options: &ConnectionOptions,
) -> io::Result<Option<Frame>> {
    let mut buffer: Vec<u8> = Vec::with_capacity(options.read_buffer_size);
    let mut chunk = vec![0u8; options.read_buffer_size];
    loop {
        if buffer.is_empty() {
            stream.readable().await?;
        } else {
            match timeout(options.frame_timeout, stream.readable()).await {
                Ok(ready) => ready?,
                Err(_) => {
                    debug!("[ID{}]等待后续数据超时，按已收到的{}字节处理", id, buffer.len());
                    return Ok(Some(Frame::Request(buffer)));
                }
            }
        }

        loop {
            match stream.try_read(&mut chunk) {
                Ok(0) => {
                    if buffer.is_empty() {
                        return Ok(None);
                    }
                    return Ok(Some(Frame::Request(buffer)));
                }
                Ok(n) => {
                    buffer.extend_from_slice(&chunk[..n]);
                    if buffer.len() > options.max_request_size {
                        return Ok(Some(Frame::TooLarge));
                    }
                    if request::is_complete(&buffer) {
                        return Ok(Some(Frame::Request(buffer)));
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e),
            }
        }
    }
}
