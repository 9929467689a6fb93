// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP/1.0 文件服务器
//!
//! 进程入口：解析命令行、初始化日志、载入并校验配置，
//! 然后在 Tokio 单线程运行时上启动连接事件循环。
//! 核心功能包括：
//! - 列出目录、读取文件（GET）与写入文件（POST）
//! - 拒绝含有 `..` 的越权路径
//! - 同一文件同一时刻只允许一个请求访问

use std::{process::ExitCode, sync::Arc};

use clap::Parser;
use log::{error, info, warn, LevelFilter};
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Config as LogConfig, Root},
    encode::pattern::PatternEncoder,
};
use tokio::runtime::Builder;

use fileserver::{AccessArbiter, Config, Dispatcher, FileStore, Server};

/// 日志配置文件路径
const LOG_CONFIG: &str = "config/log4rs.yaml";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// 输出调试信息（请求与响应全文）
    #[arg(short, long)]
    verbose: bool,

    /// 监听端口，默认 8080
    #[arg(short, long)]
    port: Option<u16>,

    /// 读写文件所用的根目录
    #[arg(short, long)]
    directory: Option<String>,

    /// 配置文件路径
    #[arg(short, long, default_value = "config/development.toml")]
    config: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // 1. 初始化日志系统：优先使用外部 YAML 配置，缺失时退回控制台输出
    init_logging();

    // 2. 载入配置，命令行参数优先于配置文件
    let mut config = match Config::from_toml(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    config.merge_cli(args.verbose, args.port, args.directory);
    log::set_max_level(if config.verbose() {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
    info!(
        "verbose: {} | port: {} | directory: {}",
        config.verbose(),
        config.port(),
        config.root()
    );

    // 3. 根目录必须存在且是目录
    if let Err(e) = config.validate_root() {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    // 4. 单线程运行时：所有连接在同一个反应器线程上轮流处理
    let runtime = match Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("无法创建Tokio运行时：{}", e);
            return ExitCode::FAILURE;
        }
    };

    // 5. 共享资源初始化：仲裁器在进程内只构造一次，注入到文件存储中
    let arbiter = Arc::new(AccessArbiter::new());
    let store = FileStore::new(config.root(), arbiter);
    let dispatcher = Arc::new(Dispatcher::new(store));

    let result = runtime.block_on(async {
        let server = Server::bind(&config, dispatcher).await?;
        server
            .run_until(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("无法监听Ctrl-C信号：{}", e);
                    std::future::pending::<()>().await;
                }
            })
            .await
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("服务器异常退出：{}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let err = match log4rs::init_file(LOG_CONFIG, Default::default()) {
        Ok(()) => return,
        Err(e) => e,
    };

    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {m}{n}",
        )))
        .build();
    let fallback = LogConfig::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Debug));
    match fallback.map(log4rs::init_config) {
        Ok(Ok(_handle)) => warn!("无法从{}载入日志配置（{}），改用控制台输出", LOG_CONFIG, err),
        Ok(Err(e)) => eprintln!("无法初始化日志系统：{}", e),
        Err(e) => eprintln!("无法构建日志配置：{}", e),
    }
}
