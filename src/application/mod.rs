// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 负责编排领域服务与仓库，完成一次完整的提取运行
pub mod use_cases;
