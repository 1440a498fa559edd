// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod mock_repository;
pub mod mock_session;

use client_crawler::config::settings::Settings;
use client_crawler::domain::repositories::record_repository::RecordRepository;
use client_crawler::infrastructure::repositories::record_repo_impl::RecordRepositoryImpl;
use std::path::Path;

pub const BASE_URL: &str = "https://crm.test";

/// 所有等待都为零的测试配置
pub fn create_test_settings(db_path: &Path) -> Settings {
    Settings::defaults()
        .unwrap()
        .set_override("web.base_url", BASE_URL)
        .unwrap()
        .set_override("web.username", "operator")
        .unwrap()
        .set_override("web.password", "secret")
        .unwrap()
        .set_override("web.timeout_secs", 1)
        .unwrap()
        .set_override("crawler.delay_between_requests_ms", 0)
        .unwrap()
        .set_override("crawler.retry_delay_ms", 0)
        .unwrap()
        .set_override("crawler.login_redirect_wait_ms", 0)
        .unwrap()
        .set_override("crawler.search_settle_ms", 0)
        .unwrap()
        .set_override("crawler.page_load_wait_ms", 0)
        .unwrap()
        .set_override(
            "database.url",
            format!("sqlite://{}?mode=rwc", db_path.display()),
        )
        .unwrap()
        .build()
        .unwrap()
        .try_deserialize()
        .unwrap()
}

/// 基于临时 SQLite 文件的仓库，表结构已经创建
pub async fn create_test_repository(settings: &Settings) -> RecordRepositoryImpl {
    let repo = RecordRepositoryImpl::new(
        settings.database.clone(),
        settings.crawler.data_retention_days,
    );
    repo.ensure_schema().await.unwrap();
    repo
}
