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

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// 等待元素出现时的轮询间隔
pub const PRESENCE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 会话错误类型
///
/// 元素不存在不是错误，查找接口以 `None` 或空列表表示
#[derive(Error, Debug)]
pub enum SessionError {
    /// 浏览器无法启动
    #[error("Browser launch failed: {0}")]
    Launch(String),
    /// 等待 DOM 条件超时
    #[error("Timed out after {0:?} waiting for `{1}`")]
    Timeout(Duration, String),
    /// 与浏览器通信失败
    #[error("Transport error: {0}")]
    Transport(String),
    /// 会话已关闭
    #[error("Session is closed")]
    Closed,
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

impl SessionError {
    /// 判断错误是否可重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::Timeout(..) | SessionError::Transport(_))
    }
}

/// 登录请求
///
/// 由提取服务根据配置构造，会话据此完成登录表单的填写与校验
#[derive(Debug, Clone)]
pub struct LoginRequest {
    /// 登录页面地址
    pub url: String,
    /// 用户名
    pub username: String,
    /// 密码
    pub password: String,
    /// 用户名输入框选择器
    pub username_selector: String,
    /// 密码输入框选择器
    pub password_selector: String,
    /// 提交按钮选择器
    pub submit_selector: String,
    /// 等待用户名输入框出现的超时
    pub timeout: Duration,
    /// 提交后等待跳转的时间
    pub redirect_wait: Duration,
    /// 登录成功后URL中应包含的标记之一
    pub success_markers: Vec<String>,
}

impl LoginRequest {
    /// 判断跳转后的URL是否表示已登录
    pub fn is_logged_in_url(&self, url: &str) -> bool {
        self.success_markers
            .iter()
            .any(|marker| !marker.is_empty() && url.contains(marker.as_str()))
    }
}

/// 浏览器会话特质
///
/// 拥有一个交互式浏览器会话，对外提供导航、查找与读取文本等基本 DOM 操作。
/// 单元素查找区分“元素不存在”（返回 `Ok(None)`）与其他失败。
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// 元素句柄
    type Element: Send + Sync;

    /// 导航到指定地址
    async fn navigate(&self, url: &str) -> Result<(), SessionError>;

    /// 当前页面地址
    async fn current_url(&self) -> Result<String, SessionError>;

    /// 在整个页面中查找第一个匹配的元素
    async fn find_first(&self, selector: &str) -> Result<Option<Self::Element>, SessionError>;

    /// 在整个页面中查找所有匹配的元素，没有匹配时返回空列表
    async fn find_all(&self, selector: &str) -> Result<Vec<Self::Element>, SessionError>;

    /// 在指定元素内查找第一个匹配的元素
    async fn find_in(
        &self,
        scope: &Self::Element,
        selector: &str,
    ) -> Result<Option<Self::Element>, SessionError>;

    /// 读取元素的可见文本
    async fn text_of(&self, element: &Self::Element) -> Result<String, SessionError>;

    /// 清空输入框并填入文本
    async fn fill(&self, element: &Self::Element, text: &str) -> Result<(), SessionError>;

    /// 点击元素
    async fn click(&self, element: &Self::Element) -> Result<(), SessionError>;

    /// 释放浏览器会话，可重复调用
    async fn shutdown(&mut self);

    /// 阻塞式暂停
    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }

    /// 等待元素出现
    ///
    /// 以固定间隔轮询，超过 `timeout` 仍未出现时返回 [`SessionError::Timeout`]
    async fn wait_for_present(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Self::Element, SessionError> {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(element) = self.find_first(selector).await? {
                return Ok(element);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(SessionError::Timeout(timeout, selector.to_string()));
            }

            tokio::time::sleep(PRESENCE_POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    /// 执行登录
    ///
    /// 打开登录页，等待用户名输入框出现，填写凭据并提交，短暂等待跳转后
    /// 检查URL是否包含登录成功标记。任何失败（包括超时）都只记录日志并返回 `false`。
    async fn login(&self, request: &LoginRequest) -> bool {
        tracing::info!("Logging in at {}", request.url);

        match self.submit_login(request).await {
            Ok(url) if request.is_logged_in_url(&url) => {
                tracing::info!("Login succeeded");
                true
            }
            Ok(url) => {
                tracing::error!(
                    "Login failed: page did not redirect to a logged-in area (at {})",
                    url
                );
                false
            }
            Err(SessionError::Timeout(timeout, selector)) => {
                tracing::error!(
                    "Login timed out after {:?} waiting for `{}`",
                    timeout,
                    selector
                );
                false
            }
            Err(e) => {
                tracing::error!("Login failed: {}", e);
                false
            }
        }
    }

    /// 填写并提交登录表单，返回跳转后的地址
    async fn submit_login(&self, request: &LoginRequest) -> Result<String, SessionError> {
        self.navigate(&request.url).await?;

        let username_field = self
            .wait_for_present(&request.username_selector, request.timeout)
            .await?;
        let password_field = self
            .find_first(&request.password_selector)
            .await?
            .ok_or_else(|| missing_element(&request.password_selector))?;

        self.fill(&username_field, &request.username).await?;
        self.fill(&password_field, &request.password).await?;

        let submit = self
            .find_first(&request.submit_selector)
            .await?
            .ok_or_else(|| missing_element(&request.submit_selector))?;
        self.click(&submit).await?;

        self.pause(request.redirect_wait).await;

        self.current_url().await
    }
}

fn missing_element(selector: &str) -> SessionError {
    SessionError::Other(format!("Element not found: {}", selector))
}
