// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::BASE_URL;
use async_trait::async_trait;
use client_crawler::engines::traits::{BrowserSession, SessionError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
pub struct MockElement {
    text: String,
    children: HashMap<String, MockElement>,
}

impl MockElement {
    fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Default::default()
        }
    }

    fn with(mut self, selector: &str, text: Option<&str>) -> Self {
        if let Some(text) = text {
            self.children
                .insert(selector.to_string(), MockElement::text(text));
        }
        self
    }
}

type MockPage = HashMap<String, Vec<MockElement>>;

/// 脚本化的目标站点，使用默认选择器与默认页面路径
#[derive(Debug, Clone)]
pub struct MockSite {
    pages: HashMap<String, MockPage>,
    after_login: String,
}

impl Default for MockSite {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSite {
    pub fn new() -> Self {
        let mut site = Self {
            pages: HashMap::new(),
            after_login: format!("{}/dashboard", BASE_URL),
        };
        let login = login_url();
        for selector in ["#username", "#password", "button[type=\"submit\"]"] {
            site.add(&login, selector, MockElement::default());
        }
        site.add(&clients_url(), ".client-table", MockElement::default());
        site
    }

    /// 登录后停留在登录页
    pub fn reject_login(mut self) -> Self {
        self.after_login = format!("{}?error=1", login_url());
        self
    }

    pub fn client(mut self, id: &str, name: &str, email: Option<&str>, phone: Option<&str>) -> Self {
        let row = MockElement::default()
            .with(".client-id", Some(id))
            .with(".client-name", Some(name))
            .with(".client-email", email)
            .with(".client-phone", phone);
        self.add(&clients_url(), ".client-row", row);
        self
    }

    pub fn service(
        mut self,
        client_id: &str,
        date: &str,
        service_type: &str,
        status: Option<&str>,
    ) -> Self {
        let url = services_url(client_id);
        let row = MockElement::default()
            .with(".service-date", Some(date))
            .with(".service-type", Some(service_type))
            .with(".service-status", status);
        if !self.pages.contains_key(&url) {
            self.add(&url, ".services-table", MockElement::default());
        }
        self.add(&url, ".service-row", row);
        self
    }

    fn add(&mut self, url: &str, selector: &str, element: MockElement) {
        self.pages
            .entry(url.to_string())
            .or_default()
            .entry(selector.to_string())
            .or_default()
            .push(element);
    }
}

/// 测试中观察会话行为的句柄
#[derive(Debug, Clone, Default)]
pub struct SessionObserver {
    visited: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl SessionObserver {
    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct MockSession {
    site: MockSite,
    current: Mutex<String>,
    observer: SessionObserver,
}

impl MockSession {
    pub fn new(site: MockSite) -> (Self, SessionObserver) {
        let observer = SessionObserver::default();
        let session = Self {
            site,
            current: Mutex::new("about:blank".to_string()),
            observer: observer.clone(),
        };
        (session, observer)
    }

    fn current_page(&self) -> Option<&MockPage> {
        let current = self.current.lock().unwrap().clone();
        self.site.pages.get(&current)
    }
}

#[async_trait]
impl BrowserSession for MockSession {
    type Element = MockElement;

    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        if self.observer.is_closed() {
            return Err(SessionError::Closed);
        }
        self.observer.visited.lock().unwrap().push(url.to_string());
        *self.current.lock().unwrap() = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String, SessionError> {
        Ok(self.current.lock().unwrap().clone())
    }

    async fn find_first(&self, selector: &str) -> Result<Option<MockElement>, SessionError> {
        Ok(self.find_all(selector).await?.into_iter().next())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<MockElement>, SessionError> {
        Ok(self
            .current_page()
            .and_then(|page| page.get(selector).cloned())
            .unwrap_or_default())
    }

    async fn find_in(
        &self,
        scope: &MockElement,
        selector: &str,
    ) -> Result<Option<MockElement>, SessionError> {
        Ok(scope.children.get(selector).cloned())
    }

    async fn text_of(&self, element: &MockElement) -> Result<String, SessionError> {
        Ok(element.text.clone())
    }

    async fn fill(&self, _element: &MockElement, _text: &str) -> Result<(), SessionError> {
        Ok(())
    }

    async fn click(&self, _element: &MockElement) -> Result<(), SessionError> {
        *self.current.lock().unwrap() = self.site.after_login.clone();
        Ok(())
    }

    async fn shutdown(&mut self) {
        self.observer.closed.store(true, Ordering::SeqCst);
    }
}

pub fn login_url() -> String {
    format!("{}/login", BASE_URL)
}

pub fn clients_url() -> String {
    format!("{}/clientes", BASE_URL)
}

pub fn services_url(client_id: &str) -> String {
    format!("{}/clientes/{}/servicos", BASE_URL, client_id)
}
