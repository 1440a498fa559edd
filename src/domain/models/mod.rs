// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了抓取流程产生的记录：
/// - 客户（client）：客户列表页面上的一行
/// - 服务（service）：某个客户服务页面上的一行
///
/// 记录在构造后不再修改，存储层只插入新记录并删除过期记录。
pub mod client;
pub mod service;

pub use client::Client;
pub use service::{Service, UNKNOWN_STATUS};
