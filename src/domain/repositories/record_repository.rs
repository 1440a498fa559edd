// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::{Client, Service};
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// 过期清理删除的行数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeCounts {
    pub clients_removed: u64,
    pub services_removed: u64,
}

/// 快照记录仓库特质
///
/// 只追加写入。保存与清理都在单个事务中完成，失败时整批回滚；
/// 除 `ensure_schema` 与按时间查询外，失败只记录日志，通过返回值体现。
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// 创建表结构，已存在时不做任何事
    async fn ensure_schema(&self) -> Result<(), RepositoryError>;

    /// 保存一批客户记录，全部成功返回 `true`
    async fn save_clients(&self, clients: &[Client]) -> bool;

    /// 保存一批服务记录，全部成功返回 `true`
    async fn save_services(&self, services: &[Service]) -> bool;

    /// 删除早于保留期的记录，失败时返回 `None`
    async fn cleanup_old_data(&self) -> Option<PurgeCounts>;

    /// 不同客户的数量，失败时为 0
    async fn get_client_count(&self) -> u64;

    /// 服务记录总数，失败时为 0
    async fn get_service_count(&self) -> u64;

    /// 查询提取时间晚于 `since` 的客户记录，按提取时间排序
    async fn find_clients_since(&self, since: DateTime<Utc>)
        -> Result<Vec<Client>, RepositoryError>;

    /// 查询提取时间晚于 `since` 的服务记录
    async fn find_services_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Service>, RepositoryError>;
}
