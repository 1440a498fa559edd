// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::{
    config::settings::CrawlerSettings,
    domain::{
        repositories::record_repository::{PurgeCounts, RecordRepository},
        services::extraction_service::ExtractionService,
    },
    engines::traits::BrowserSession,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// 一次提取运行的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// 是否登录成功
    pub logged_in: bool,
    /// 抓取到的客户数
    pub clients_extracted: usize,
    /// 抓取到的服务数
    pub services_extracted: usize,
    /// 客户批次的保存结果，没有客户时为 `None`
    pub clients_saved: Option<bool>,
    /// 服务批次的保存结果，没有服务时为 `None`
    pub services_saved: Option<bool>,
    /// 过期清理结果，清理失败或未执行时为 `None`
    pub purged: Option<PurgeCounts>,
    /// 数据库中不同客户的数量
    pub total_clients: u64,
    /// 数据库中服务记录的总数
    pub total_services: u64,
}

/// 提取运行用例
///
/// 单次运行的完整流程：登录、抓取客户、逐个客户抓取服务、保存、清理过期数据、统计。
/// 无论在哪一步结束，浏览器会话都会被关闭。
pub struct ExtractionRun<S: BrowserSession, R> {
    extraction: ExtractionService<S>,
    repo: Arc<R>,
    crawler: CrawlerSettings,
}

impl<S, R> ExtractionRun<S, R>
where
    S: BrowserSession,
    R: RecordRepository + 'static,
{
    pub fn new(extraction: ExtractionService<S>, repo: Arc<R>, crawler: CrawlerSettings) -> Self {
        Self {
            extraction,
            repo,
            crawler,
        }
    }

    pub fn extraction(&self) -> &ExtractionService<S> {
        &self.extraction
    }

    /// 执行一次提取运行
    pub async fn execute(&mut self) -> RunSummary {
        info!("Starting data extraction");

        let summary = self.run().await;
        self.extraction.shutdown().await;

        summary
    }

    async fn run(&mut self) -> RunSummary {
        let mut summary = RunSummary::default();

        // 1. Login
        if !self.extraction.login().await {
            error!("Login failed, aborting extraction");
            return summary;
        }
        summary.logged_in = true;

        // 2. Clients
        let clients = self
            .extraction
            .search_clients(&self.crawler.search_term)
            .await;
        summary.clients_extracted = clients.len();

        if clients.is_empty() {
            warn!("No clients found");
            return summary;
        }

        // 3. Services, one client at a time
        let delay = self.crawler.delay_between_requests();
        let mut services = Vec::new();

        for (index, client) in clients.iter().enumerate() {
            info!(
                client_id = %client.client_id,
                "Fetching services for client {}/{}",
                index + 1,
                clients.len()
            );
            services.extend(self.extraction.get_client_services(&client.client_id).await);

            if index + 1 < clients.len() && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        summary.services_extracted = services.len();
        self.extraction.finish();

        // 4. Persist
        summary.clients_saved = Some(self.repo.save_clients(&clients).await);
        if !services.is_empty() {
            summary.services_saved = Some(self.repo.save_services(&services).await);
        }

        // 5. Retention and totals
        summary.purged = self.repo.cleanup_old_data().await;
        summary.total_clients = self.repo.get_client_count().await;
        summary.total_services = self.repo.get_service_count().await;

        info!(
            "Extraction finished: {} clients and {} services extracted",
            summary.clients_extracted, summary.services_extracted
        );
        info!(
            "Database now holds {} distinct clients and {} services",
            summary.total_clients, summary.total_services
        );

        summary
    }
}
