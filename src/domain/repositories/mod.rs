// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 领域层只依赖这里的抽象，具体的数据库实现由基础设施层提供。
pub mod record_repository;
