// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use client_crawler::domain::models::{Client, Service};
use client_crawler::domain::repositories::record_repository::{PurgeCounts, RecordRepository};
use client_crawler::utils::errors::RepositoryError;
use std::sync::Mutex;

/// 只在内存中记录调用的仓库
#[derive(Default)]
pub struct MockRecordRepository {
    calls: Mutex<Vec<&'static str>>,
    clients: Mutex<Vec<Client>>,
    services: Mutex<Vec<Service>>,
    fail_saves: bool,
}

impl MockRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 每次保存都失败且不写入任何记录
    pub fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RecordRepository for MockRecordRepository {
    async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        self.record("ensure_schema");
        Ok(())
    }

    async fn save_clients(&self, clients: &[Client]) -> bool {
        self.record("save_clients");
        if self.fail_saves {
            return false;
        }
        self.clients.lock().unwrap().extend_from_slice(clients);
        true
    }

    async fn save_services(&self, services: &[Service]) -> bool {
        self.record("save_services");
        if self.fail_saves {
            return false;
        }
        self.services.lock().unwrap().extend_from_slice(services);
        true
    }

    async fn cleanup_old_data(&self) -> Option<PurgeCounts> {
        self.record("cleanup_old_data");
        Some(PurgeCounts::default())
    }

    async fn get_client_count(&self) -> u64 {
        self.record("get_client_count");
        let mut ids: Vec<String> = self
            .clients
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.client_id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        ids.len() as u64
    }

    async fn get_service_count(&self) -> u64 {
        self.record("get_service_count");
        self.services.lock().unwrap().len() as u64
    }

    async fn find_clients_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Client>, RepositoryError> {
        Ok(self
            .clients
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.extraction_date.is_some_and(|d| d > since))
            .cloned()
            .collect())
    }

    async fn find_services_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Service>, RepositoryError> {
        Ok(self
            .services
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.extraction_date.is_some_and(|d| d > since))
            .cloned()
            .collect())
    }
}
