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

use client_crawler::application::use_cases::extraction_run::ExtractionRun;
use client_crawler::config::settings::Settings;
use client_crawler::domain::repositories::record_repository::RecordRepository;
use client_crawler::domain::services::extraction_service::ExtractionService;
use client_crawler::engines::chromium_session::ChromiumSession;
use client_crawler::infrastructure::repositories::record_repo_impl::RecordRepositoryImpl;
use client_crawler::utils::retry_policy::RetryPolicy;
use client_crawler::utils::telemetry;
use std::sync::Arc;
use tracing::{error, info};

/// 主函数
///
/// 加载配置、准备数据库、启动浏览器并执行一次提取运行。
/// 只有浏览器启动失败会以非零状态退出；配置无效时记录错误后直接结束。
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting client-crawler...");

    // 2. Load configuration
    let settings = match Settings::new() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Invalid configuration, nothing to run: {}", e);
            return Ok(());
        }
    };
    info!("Configuration loaded (target: {})", settings.web.base_url);

    // 3. Prepare database
    let repo = Arc::new(RecordRepositoryImpl::new(
        settings.database.clone(),
        settings.crawler.data_retention_days,
    ));
    if let Err(e) = repo.ensure_schema().await {
        error!("Failed to prepare database schema: {}", e);
    }

    // 4. Launch browser
    let retry = RetryPolicy::fixed(settings.crawler.max_retries, settings.crawler.retry_delay());
    let launched =
        ChromiumSession::launch(&settings.crawler, settings.web.timeout(), &retry).await;
    let session = match launched {
        Ok(session) => session,
        Err(e) => {
            error!("Could not start the browser: {}", e);
            return Err(e.into());
        }
    };

    // 5. Run extraction
    let extraction = ExtractionService::new(session, settings.web.clone(), settings.crawler.clone());
    let mut run = ExtractionRun::new(extraction, repo, settings.crawler.clone());
    let summary = run.execute().await;

    info!(
        "Run complete (logged in: {}, clients: {}, services: {})",
        summary.logged_in, summary.clients_extracted, summary.services_extracted
    );

    Ok(())
}
