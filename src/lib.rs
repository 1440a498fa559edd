// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 编排一次完整的提取运行
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含客户与服务模型、仓库接口和提取服务
pub mod domain;

/// 引擎模块
///
/// 浏览器会话抽象及其 Chromium 实现
pub mod engines;

/// 基础设施模块
///
/// 数据库连接、表结构与仓库实现
pub mod infrastructure;

/// 工具模块
///
/// 提供错误类型、重试策略与日志初始化
pub mod utils;
