// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::CrawlerSettings;
use crate::engines::traits::{BrowserSession, SessionError};
use crate::utils::retry_policy::RetryPolicy;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::element::Element;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// 隐藏 `navigator.webdriver` 的脚本，在每个新文档加载前执行
const HIDE_WEBDRIVER_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined})";

/// 清空输入框的脚本
const CLEAR_VALUE_FN: &str = "function() { this.value = ''; }";

/// 基于 chromiumoxide 的浏览器会话
///
/// 启动时去掉默认的自动化标志、覆盖 `navigator.webdriver` 并固定视口大小，
/// 之后所有操作都在同一个页面上进行
pub struct ChromiumSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler: Option<JoinHandle<()>>,
}

impl ChromiumSession {
    /// 启动浏览器并打开一个空白页面
    ///
    /// 启动失败按 `retry` 重试，全部失败时返回最后一次的错误。
    /// 这是整个运行中唯一会中止进程的错误。
    ///
    /// `request_timeout` 是浏览器每个 CDP 请求的超时时间
    pub async fn launch(
        settings: &CrawlerSettings,
        request_timeout: Duration,
        retry: &RetryPolicy,
    ) -> Result<Self, SessionError> {
        retry
            .execute("Browser launch", || {
                Self::launch_once(settings, request_timeout)
            })
            .await
    }

    async fn launch_once(
        settings: &CrawlerSettings,
        request_timeout: Duration,
    ) -> Result<Self, SessionError> {
        let config = Self::browser_config(settings, request_timeout)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        // Spawn a handler to process browser events
        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = match Self::open_page(&browser).await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handle.abort();
                return Err(e);
            }
        };

        info!(
            "Chrome session started (headless: {}, viewport {}x{})",
            settings.headless, settings.window_width, settings.window_height
        );

        Ok(Self {
            browser: Some(browser),
            page: Some(page),
            handler: Some(handle),
        })
    }

    fn browser_config(
        settings: &CrawlerSettings,
        request_timeout: Duration,
    ) -> Result<BrowserConfig, SessionError> {
        let mut builder = BrowserConfig::builder()
            .disable_default_args()
            .no_sandbox()
            .request_timeout(request_timeout)
            .window_size(settings.window_width, settings.window_height)
            .viewport(Viewport {
                width: settings.window_width,
                height: settings.window_height,
                ..Default::default()
            });

        for arg in launch_args(settings) {
            builder = builder.arg(arg);
        }

        if !settings.headless {
            builder = builder.with_head();
        }

        if let Some(path) = &settings.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(SessionError::Launch)
    }

    async fn open_page(browser: &Browser) -> Result<Page, SessionError> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        page.evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(
            HIDE_WEBDRIVER_SCRIPT,
        ))
        .await
        .map_err(|e| SessionError::Launch(e.to_string()))?;

        Ok(page)
    }

    fn page(&self) -> Result<&Page, SessionError> {
        self.page.as_ref().ok_or(SessionError::Closed)
    }
}

/// 浏览器启动参数
///
/// 不包含 `--enable-automation`，并关闭 Blink 的自动化特征
pub fn launch_args(settings: &CrawlerSettings) -> Vec<String> {
    vec![
        "--disable-blink-features=AutomationControlled".to_string(),
        "--disable-gpu".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-background-networking".to_string(),
        "--disable-background-timer-throttling".to_string(),
        "--disable-backgrounding-occluded-windows".to_string(),
        "--disable-renderer-backgrounding".to_string(),
        "--disable-popup-blocking".to_string(),
        "--disable-sync".to_string(),
        "--no-first-run".to_string(),
        "--password-store=basic".to_string(),
        "--use-mock-keychain".to_string(),
        format!(
            "--window-size={},{}",
            settings.window_width, settings.window_height
        ),
    ]
}

fn transport(e: impl std::fmt::Display) -> SessionError {
    SessionError::Transport(e.to_string())
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    type Element = Element;

    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        debug!("Navigating to {}", url);
        self.page()?.goto(url).await.map_err(transport)?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, SessionError> {
        Ok(self
            .page()?
            .url()
            .await
            .map_err(transport)?
            .unwrap_or_default())
    }

    async fn find_first(&self, selector: &str) -> Result<Option<Element>, SessionError> {
        // querySelectorAll returns no nodes for a missing element, not an error
        let mut elements = self.find_all(selector).await?;
        if elements.is_empty() {
            Ok(None)
        } else {
            Ok(Some(elements.swap_remove(0)))
        }
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Element>, SessionError> {
        self.page()?
            .find_elements(selector)
            .await
            .map_err(transport)
    }

    async fn find_in(
        &self,
        scope: &Element,
        selector: &str,
    ) -> Result<Option<Element>, SessionError> {
        let mut elements = scope.find_elements(selector).await.map_err(transport)?;
        if elements.is_empty() {
            Ok(None)
        } else {
            Ok(Some(elements.swap_remove(0)))
        }
    }

    async fn text_of(&self, element: &Element) -> Result<String, SessionError> {
        Ok(element
            .inner_text()
            .await
            .map_err(transport)?
            .unwrap_or_default())
    }

    async fn fill(&self, element: &Element, text: &str) -> Result<(), SessionError> {
        element.click().await.map_err(transport)?;
        element
            .call_js_fn(CLEAR_VALUE_FN, false)
            .await
            .map_err(transport)?;
        element.type_str(text).await.map_err(transport)?;
        Ok(())
    }

    async fn click(&self, element: &Element) -> Result<(), SessionError> {
        element.click().await.map_err(transport)?;
        Ok(())
    }

    async fn shutdown(&mut self) {
        self.page = None;

        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("Failed to close browser cleanly: {}", e);
            }
            if let Err(e) = browser.wait().await {
                warn!("Failed to wait for browser exit: {}", e);
            }
            info!("Chrome session closed");
        }

        if let Some(handle) = self.handler.take() {
            handle.abort();
        }
    }
}
