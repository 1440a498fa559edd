// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::DatabaseSettings;
use crate::domain::models::{Client, Service};
use crate::domain::repositories::record_repository::{PurgeCounts, RecordRepository};
use crate::infrastructure::database::connection::connect;
use crate::infrastructure::database::entities::{cliente, servico};
use crate::infrastructure::database::schema;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use tracing::{error, info, warn};

/// 快照记录仓库实现
///
/// 不持有长连接，每个操作打开一个连接并在结束时关闭
#[derive(Clone)]
pub struct RecordRepositoryImpl {
    settings: DatabaseSettings,
    retention_days: i64,
}

impl RecordRepositoryImpl {
    /// 创建新的快照记录仓库
    ///
    /// # 参数
    ///
    /// * `settings` - 数据库配置
    /// * `retention_days` - 记录保留天数
    pub fn new(settings: DatabaseSettings, retention_days: i64) -> Self {
        Self {
            settings,
            retention_days,
        }
    }

    /// 删除提取时间早于 `cutoff` 的记录
    ///
    /// 两张表在同一个事务中清理
    pub async fn cleanup_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<PurgeCounts, RepositoryError> {
        let db = connect(&self.settings).await?;
        let result = purge(&db, cutoff).await;
        close(db).await;
        Ok(result?)
    }

    async fn insert_clients(&self, clients: &[Client]) -> Result<(), RepositoryError> {
        let db = connect(&self.settings).await?;
        let result = write_clients(&db, clients).await;
        close(db).await;
        Ok(result?)
    }

    async fn insert_services(&self, services: &[Service]) -> Result<(), RepositoryError> {
        let db = connect(&self.settings).await?;
        let result = write_services(&db, services).await;
        close(db).await;
        Ok(result?)
    }

    async fn count_distinct_clients(&self) -> Result<u64, RepositoryError> {
        let db = connect(&self.settings).await?;
        let result = cliente::Entity::find()
            .select_only()
            .column_as(Expr::cust("COUNT(DISTINCT client_id)"), "count")
            .into_tuple::<i64>()
            .one(&db)
            .await;
        close(db).await;
        Ok(result?.unwrap_or_default().max(0) as u64)
    }

    async fn count_services(&self) -> Result<u64, RepositoryError> {
        let db = connect(&self.settings).await?;
        let result = servico::Entity::find().count(&db).await;
        close(db).await;
        Ok(result?)
    }
}

#[async_trait]
impl RecordRepository for RecordRepositoryImpl {
    async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        let db = connect(&self.settings).await?;
        let result = schema::ensure_schema(&db).await;
        close(db).await;
        Ok(result?)
    }

    async fn save_clients(&self, clients: &[Client]) -> bool {
        if clients.is_empty() {
            return true;
        }

        match self.insert_clients(clients).await {
            Ok(()) => {
                info!("Saved {} clients", clients.len());
                true
            }
            Err(e) => {
                error!("Failed to save clients, batch rolled back: {}", e);
                false
            }
        }
    }

    async fn save_services(&self, services: &[Service]) -> bool {
        if services.is_empty() {
            return true;
        }

        match self.insert_services(services).await {
            Ok(()) => {
                info!("Saved {} services", services.len());
                true
            }
            Err(e) => {
                error!("Failed to save services, batch rolled back: {}", e);
                false
            }
        }
    }

    async fn cleanup_old_data(&self) -> Option<PurgeCounts> {
        let Some(cutoff) = Duration::try_days(self.retention_days)
            .filter(|window| *window > Duration::zero())
            .and_then(|window| Utc::now().checked_sub_signed(window))
        else {
            error!(
                "Invalid retention window of {} days, skipping cleanup",
                self.retention_days
            );
            return None;
        };

        match self.cleanup_older_than(cutoff).await {
            Ok(counts) => {
                info!(
                    "Removed records older than {} days ({} clients, {} services)",
                    self.retention_days, counts.clients_removed, counts.services_removed
                );
                Some(counts)
            }
            Err(e) => {
                error!("Failed to clean up old data: {}", e);
                None
            }
        }
    }

    async fn get_client_count(&self) -> u64 {
        self.count_distinct_clients().await.unwrap_or_else(|e| {
            error!("Failed to count clients: {}", e);
            0
        })
    }

    async fn get_service_count(&self) -> u64 {
        self.count_services().await.unwrap_or_else(|e| {
            error!("Failed to count services: {}", e);
            0
        })
    }

    async fn find_clients_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Client>, RepositoryError> {
        let db = connect(&self.settings).await?;
        let result = cliente::Entity::find()
            .filter(cliente::Column::ExtractionDate.gt(since))
            .order_by_asc(cliente::Column::ExtractionDate)
            .order_by_asc(cliente::Column::Id)
            .all(&db)
            .await;
        close(db).await;
        Ok(result?.into_iter().map(Into::into).collect())
    }

    async fn find_services_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Service>, RepositoryError> {
        let db = connect(&self.settings).await?;
        let result = servico::Entity::find()
            .filter(servico::Column::ExtractionDate.gt(since))
            .order_by_asc(servico::Column::ExtractionDate)
            .order_by_asc(servico::Column::Id)
            .all(&db)
            .await;
        close(db).await;
        Ok(result?.into_iter().map(Into::into).collect())
    }
}

async fn write_clients(db: &DatabaseConnection, clients: &[Client]) -> Result<(), DbErr> {
    let now = Utc::now();
    let txn = db.begin().await?;

    // 出错时 txn 被丢弃，整批回滚
    for client in clients {
        let model = cliente::ActiveModel {
            id: NotSet,
            client_id: Set(client.client_id.clone()),
            name: Set(client.name.clone()),
            email: Set(client.email.clone()),
            phone: Set(client.phone.clone()),
            extraction_date: Set(client.extraction_date_or(now)),
            created_at: Set(now),
        };
        cliente::Entity::insert(model).exec(&txn).await?;
    }

    txn.commit().await
}

async fn write_services(db: &DatabaseConnection, services: &[Service]) -> Result<(), DbErr> {
    let now = Utc::now();
    let txn = db.begin().await?;

    for service in services {
        let model = servico::ActiveModel {
            id: NotSet,
            client_id: Set(service.client_id.clone()),
            service_date: Set(service.service_date.clone()),
            service_type: Set(service.service_type.clone()),
            description: Set(service.description.clone()),
            status: Set(service.status.clone()),
            extraction_date: Set(service.extraction_date_or(now)),
            created_at: Set(now),
        };
        servico::Entity::insert(model).exec(&txn).await?;
    }

    txn.commit().await
}

async fn purge(db: &DatabaseConnection, cutoff: DateTime<Utc>) -> Result<PurgeCounts, DbErr> {
    let txn = db.begin().await?;

    let clients = cliente::Entity::delete_many()
        .filter(cliente::Column::ExtractionDate.lt(cutoff))
        .exec(&txn)
        .await?;
    let services = servico::Entity::delete_many()
        .filter(servico::Column::ExtractionDate.lt(cutoff))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    Ok(PurgeCounts {
        clients_removed: clients.rows_affected,
        services_removed: services.rows_affected,
    })
}

async fn close(db: DatabaseConnection) {
    if let Err(e) = db.close().await {
        warn!("Failed to close database connection: {}", e);
    }
}

impl From<cliente::Model> for Client {
    fn from(model: cliente::Model) -> Self {
        Self {
            client_id: model.client_id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            extraction_date: Some(model.extraction_date),
        }
    }
}

impl From<servico::Model> for Service {
    fn from(model: servico::Model) -> Self {
        Self {
            client_id: model.client_id,
            service_date: model.service_date,
            service_type: model.service_type,
            description: model.description,
            status: model.status,
            extraction_date: Some(model.extraction_date),
        }
    }
}

#[cfg(test)]
#[path = "record_repo_impl_test.rs"]
mod tests;
