// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::{CrawlerSettings, WebSettings};
use crate::domain::models::{Client, Service};
use crate::engines::traits::{BrowserSession, LoginRequest, SessionError};
use crate::utils::retry_policy::RetryPolicy;
use std::fmt;
use tracing::{debug, error, info, warn};

/// 提取状态
///
/// `NotLoggedIn → LoggedIn → ScrapingClients → ScrapingServices(client) → Done`，
/// 只有服务抓取会按客户重复进入
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionState {
    NotLoggedIn,
    LoggedIn,
    ScrapingClients,
    ScrapingServices(String),
    Done,
}

impl fmt::Display for ExtractionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExtractionState::NotLoggedIn => write!(f, "not_logged_in"),
            ExtractionState::LoggedIn => write!(f, "logged_in"),
            ExtractionState::ScrapingClients => write!(f, "scraping_clients"),
            ExtractionState::ScrapingServices(id) => write!(f, "scraping_services({})", id),
            ExtractionState::Done => write!(f, "done"),
        }
    }
}

/// 提取服务
///
/// 负责登录、抓取客户列表、逐个客户抓取服务，并把每一行解析为记录。
/// 单行解析失败只跳过该行；整页操作失败时返回已经收集到的部分结果，从不向上抛出。
pub struct ExtractionService<S: BrowserSession> {
    session: S,
    web: WebSettings,
    crawler: CrawlerSettings,
    retry: RetryPolicy,
    logged_in: bool,
    state: ExtractionState,
}

impl<S: BrowserSession> ExtractionService<S> {
    /// 创建提取服务
    ///
    /// # 参数
    ///
    /// * `session` - 浏览器会话，提取服务独占其所有权
    /// * `web` - 目标站点配置
    /// * `crawler` - 抓取行为配置
    pub fn new(session: S, web: WebSettings, crawler: CrawlerSettings) -> Self {
        let retry = RetryPolicy::fixed(crawler.max_retries, crawler.retry_delay());
        Self {
            session,
            web,
            crawler,
            retry,
            logged_in: false,
            state: ExtractionState::NotLoggedIn,
        }
    }

    /// 当前状态
    pub fn state(&self) -> &ExtractionState {
        &self.state
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    /// 底层浏览器会话
    pub fn session(&self) -> &S {
        &self.session
    }

    /// 登录目标站点
    ///
    /// 成功时进入 `LoggedIn` 状态，之后的抓取操作才会执行
    pub async fn login(&mut self) -> bool {
        let request = self.login_request();

        if self.session.login(&request).await {
            self.logged_in = true;
            self.state = ExtractionState::LoggedIn;
        }

        self.logged_in
    }

    /// 抓取客户列表
    ///
    /// # 参数
    ///
    /// * `search_term` - 搜索词，为空时不过滤
    ///
    /// # 返回值
    ///
    /// 成功解析的客户记录；未登录或已经开始抓取服务时返回空列表
    pub async fn search_clients(&mut self, search_term: &str) -> Vec<Client> {
        let mut clients = Vec::new();

        if !self.ready() {
            return clients;
        }
        if let ExtractionState::ScrapingServices(client_id) = &self.state {
            error!(
                "Client listing cannot be reopened while scraping services of client {}",
                client_id
            );
            return clients;
        }
        self.state = ExtractionState::ScrapingClients;

        if let Err(e) = self.collect_clients(search_term, &mut clients).await {
            error!("Error while searching clients: {}", e);
        }

        info!("Found {} clients", clients.len());
        clients
    }

    /// 抓取某个客户的服务列表
    ///
    /// 页面上没有任何服务行时视为该客户没有服务
    pub async fn get_client_services(&mut self, client_id: &str) -> Vec<Service> {
        let mut services = Vec::new();

        if !self.ready() {
            return services;
        }
        self.state = ExtractionState::ScrapingServices(client_id.to_string());

        match self.collect_services(client_id, &mut services).await {
            Ok(()) => info!("Found {} services for client {}", services.len(), client_id),
            Err(e) => error!("Error while fetching services of client {}: {}", client_id, e),
        }

        services
    }

    /// 结束提取，之后的抓取操作都会被拒绝
    pub fn finish(&mut self) {
        self.state = ExtractionState::Done;
    }

    /// 结束提取并释放浏览器会话
    pub async fn shutdown(&mut self) {
        self.finish();
        self.session.shutdown().await;
    }

    fn login_request(&self) -> LoginRequest {
        let selectors = &self.web.selectors;
        LoginRequest {
            url: self.web.login_url(),
            username: self.web.username.clone(),
            password: self.web.password.clone(),
            username_selector: selectors.username_field.clone(),
            password_selector: selectors.password_field.clone(),
            submit_selector: selectors.login_button.clone(),
            timeout: self.web.timeout(),
            redirect_wait: self.crawler.login_redirect_wait(),
            success_markers: self.web.login_success_markers.clone(),
        }
    }

    fn ready(&self) -> bool {
        if !self.logged_in {
            error!("Not logged in to the target system");
            return false;
        }
        if self.state == ExtractionState::Done {
            error!("Extraction already finished");
            return false;
        }
        true
    }

    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        let session = &self.session;
        self.retry
            .execute_when(
                "Navigation",
                move || session.navigate(url),
                SessionError::is_retryable,
            )
            .await
    }

    async fn collect_clients(
        &self,
        search_term: &str,
        clients: &mut Vec<Client>,
    ) -> Result<(), SessionError> {
        let selectors = &self.web.selectors;

        self.navigate(&self.web.clients_url()).await?;

        if !search_term.is_empty() {
            let field = self
                .session
                .wait_for_present(&selectors.search_field, self.web.timeout())
                .await?;
            self.session.fill(&field, search_term).await?;
            self.session.pause(self.crawler.search_settle()).await;
        }

        self.session
            .wait_for_present(&selectors.client_table, self.web.timeout())
            .await?;

        let rows = self.session.find_all(&selectors.client_rows).await?;
        debug!("Client listing has {} rows", rows.len());

        for row in &rows {
            match self.parse_client_row(row).await {
                Ok(Some(client)) => clients.push(client),
                Ok(None) => {}
                Err(e) => warn!("Failed to parse client row: {}", e),
            }
        }

        Ok(())
    }

    async fn collect_services(
        &self,
        client_id: &str,
        services: &mut Vec<Service>,
    ) -> Result<(), SessionError> {
        let selectors = &self.web.selectors;

        self.navigate(&self.web.services_url(client_id)).await?;
        self.session.pause(self.crawler.page_load_wait()).await;

        if self.session.find_first(&selectors.services_table).await?.is_none() {
            debug!("Services table not present for client {}", client_id);
        }

        let rows = self.session.find_all(&selectors.service_rows).await?;
        if rows.is_empty() {
            info!("No services found for client {}", client_id);
            return Ok(());
        }

        for row in &rows {
            match self.parse_service_row(row, client_id).await {
                Ok(Some(service)) => services.push(service),
                Ok(None) => {}
                Err(e) => warn!("Failed to parse service row of client {}: {}", client_id, e),
            }
        }

        Ok(())
    }

    /// 解析客户行，`client_id` 与 `name` 缺失时丢弃整行
    async fn parse_client_row(&self, row: &S::Element) -> Result<Option<Client>, SessionError> {
        let selectors = &self.web.selectors;

        let Some(client_id) = self.required_text(row, &selectors.client_id, "client row").await?
        else {
            return Ok(None);
        };
        let Some(name) = self.required_text(row, &selectors.client_name, "client row").await?
        else {
            return Ok(None);
        };

        let email = self.optional_text(row, &selectors.client_email).await?;
        let phone = self.optional_text(row, &selectors.client_phone).await?;

        Ok(Some(Client::new(client_id, name, email, phone)))
    }

    /// 解析服务行，`service_date` 与 `service_type` 缺失时丢弃整行
    async fn parse_service_row(
        &self,
        row: &S::Element,
        client_id: &str,
    ) -> Result<Option<Service>, SessionError> {
        let selectors = &self.web.selectors;

        let Some(service_date) = self
            .required_text(row, &selectors.service_date, "service row")
            .await?
        else {
            return Ok(None);
        };
        let Some(service_type) = self
            .required_text(row, &selectors.service_type, "service row")
            .await?
        else {
            return Ok(None);
        };

        let description = self
            .optional_text(row, &selectors.service_description)
            .await?;
        let status = self.optional_text(row, &selectors.service_status).await?;

        Ok(Some(Service::new(
            client_id,
            service_date,
            service_type,
            description,
            status,
        )))
    }

    async fn required_text(
        &self,
        row: &S::Element,
        selector: &str,
        kind: &str,
    ) -> Result<Option<String>, SessionError> {
        let text = self.optional_text(row, selector).await?;
        if text.is_none() {
            warn!("Skipping {}: required field `{}` not found", kind, selector);
        }
        Ok(text)
    }

    async fn optional_text(
        &self,
        row: &S::Element,
        selector: &str,
    ) -> Result<Option<String>, SessionError> {
        match self.session.find_in(row, selector).await? {
            Some(element) => {
                let text = self.session.text_of(&element).await?;
                Ok(Some(text.trim().to_string()))
            }
            None => {
                debug!("Field `{}` not present in row", selector);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
#[path = "extraction_service_test.rs"]
mod tests;
