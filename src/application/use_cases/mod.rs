// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 用例模块
///
/// - 提取运行（extraction_run）：登录、抓取、持久化、清理、统计
pub mod extraction_run;
