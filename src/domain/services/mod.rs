// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// - 提取服务（extraction_service）：登录目标系统，抓取客户与服务列表并解析为领域模型
pub mod extraction_service;
