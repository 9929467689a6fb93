// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

pub mod arbiter;
pub mod config;
pub mod dispatcher;
pub mod exception;
pub mod param;
pub mod request;
pub mod resolver;
pub mod response;
pub mod server;
pub mod store;

pub use arbiter::{AccessArbiter, AccessGuard};
pub use config::Config;
pub use dispatcher::Dispatcher;
pub use exception::Exception;
pub use param::HttpRequestMethod;
pub use request::Request;
pub use response::{Response, ResponseHeaders, StatusLine};
pub use server::Server;
pub use store::FileStore;
