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

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// 服务页面路径模板中的客户标识占位符
pub const CLIENT_ID_PLACEHOLDER: &str = "{client_id}";

/// 各选择器的默认值
const DEFAULT_SELECTORS: [(&str, &str); 16] = [
    ("username_field", "#username"),
    ("password_field", "#password"),
    ("login_button", "button[type=\"submit\"]"),
    ("search_field", "input[type='search']"),
    ("client_table", ".client-table"),
    ("client_rows", ".client-row"),
    ("client_id", ".client-id"),
    ("client_name", ".client-name"),
    ("client_email", ".client-email"),
    ("client_phone", ".client-phone"),
    ("services_table", ".services-table"),
    ("service_rows", ".service-row"),
    ("service_date", ".service-date"),
    ("service_type", ".service-type"),
    ("service_description", ".service-description"),
    ("service_status", ".service-status"),
];

/// 应用程序配置设置
///
/// 在入口处构造一次，各组件在构造时拿到自己需要的部分
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 目标站点配置
    pub web: WebSettings,
    /// 抓取行为配置
    pub crawler: CrawlerSettings,
    /// 数据库配置
    pub database: DatabaseSettings,
}

/// 目标站点配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct WebSettings {
    /// 站点根地址
    pub base_url: String,
    /// 登录页面路径
    pub login_path: String,
    /// 登录用户名
    pub username: String,
    /// 登录密码
    pub password: String,
    /// 单次等待 DOM 条件的超时时间（秒）
    pub timeout_secs: u64,
    /// 客户列表页面路径
    pub clients_path: String,
    /// 客户服务页面路径模板，包含 `{client_id}` 占位符
    pub services_path: String,
    /// 登录成功后URL中应出现的标记之一
    pub login_success_markers: Vec<String>,
    /// CSS 选择器
    pub selectors: SelectorSettings,
}

/// CSS 选择器配置
///
/// 语义字段名到 DOM 查询字符串的映射，作为输入数据而非逻辑
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorSettings {
    pub username_field: String,
    pub password_field: String,
    pub login_button: String,
    /// 客户列表页面上的搜索框
    pub search_field: String,
    pub client_table: String,
    pub client_rows: String,
    pub client_id: String,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub services_table: String,
    pub service_rows: String,
    pub service_date: String,
    pub service_type: String,
    pub service_description: String,
    pub service_status: String,
}

/// 抓取行为配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerSettings {
    /// 两次客户服务抓取之间的间隔（毫秒）
    pub delay_between_requests_ms: u64,
    /// 最大尝试次数
    pub max_retries: u32,
    /// 两次尝试之间的固定间隔（毫秒）
    pub retry_delay_ms: u64,
    /// 是否以无头模式启动浏览器
    pub headless: bool,
    /// 浏览器窗口宽度
    pub window_width: u32,
    /// 浏览器窗口高度
    pub window_height: u32,
    /// 浏览器可执行文件路径，未设置时自动探测
    pub chrome_executable: Option<String>,
    /// 数据保留天数
    pub data_retention_days: i64,
    /// 提交登录表单后等待跳转的时间（毫秒）
    pub login_redirect_wait_ms: u64,
    /// 输入搜索词后等待页面过滤的时间（毫秒）
    pub search_settle_ms: u64,
    /// 打开服务页面后等待加载的时间（毫秒）
    pub page_load_wait_ms: u64,
    /// 客户搜索词，为空时不过滤
    pub search_term: String,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 完整连接URL，设置后优先于下面的各个字段
    pub url: Option<String>,
    /// 数据库服务器地址
    pub server: String,
    /// 数据库名称
    pub name: String,
    /// 数据库用户名
    pub username: String,
    /// 数据库密码
    pub password: Option<String>,
    /// 是否使用受信任连接（不携带凭据）
    pub trusted_connection: bool,
    /// 连接超时时间（秒）
    pub connect_timeout_secs: u64,
    /// 是否记录SQL语句
    pub sqlx_logging: bool,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次合并默认值、`config/default`、`config/{APP_ENVIRONMENT}` 以及
    /// 以 `CRAWLER` 为前缀、`__` 为分隔符的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载并通过校验的配置
    /// * `Err(ConfigError)` - 配置加载或校验失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("CRAWLER")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("web.login_success_markers")
                    .try_parsing(true),
            );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// 只包含默认值的配置构建器
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let mut builder = Config::builder()
            // Target site
            .set_default("web.base_url", "https://seusistema.com")?
            .set_default("web.login_path", "/login")?
            .set_default("web.username", "")?
            .set_default("web.password", "")?
            .set_default("web.timeout_secs", 30)?
            .set_default("web.clients_path", "/clientes")?
            .set_default("web.services_path", "/clientes/{client_id}/servicos")?
            .set_default("web.login_success_markers", vec!["dashboard", "home"])?
            // Crawler behaviour
            .set_default("crawler.delay_between_requests_ms", 2000)?
            .set_default("crawler.max_retries", 3)?
            .set_default("crawler.retry_delay_ms", 2000)?
            .set_default("crawler.headless", true)?
            .set_default("crawler.window_width", 1920)?
            .set_default("crawler.window_height", 1080)?
            .set_default("crawler.data_retention_days", 365)?
            .set_default("crawler.login_redirect_wait_ms", 3000)?
            .set_default("crawler.search_settle_ms", 1000)?
            .set_default("crawler.page_load_wait_ms", 2000)?
            .set_default("crawler.search_term", "")?
            // Database
            .set_default("database.server", "localhost")?
            .set_default("database.name", "ClientServiceDB")?
            .set_default("database.username", "postgres")?
            .set_default("database.trusted_connection", false)?
            .set_default("database.connect_timeout_secs", 10)?
            .set_default("database.sqlx_logging", false)?;

        for (key, selector) in DEFAULT_SELECTORS {
            builder = builder.set_default(format!("web.selectors.{}", key), selector)?;
        }

        Ok(builder)
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.web.base_url).map_err(|e| {
            ConfigError::Message(format!("web.base_url is not a valid URL: {}", e))
        })?;

        if self.web.timeout_secs == 0 {
            return Err(ConfigError::Message(
                "web.timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.crawler.max_retries == 0 {
            return Err(ConfigError::Message(
                "crawler.max_retries must be at least one".to_string(),
            ));
        }

        if self.crawler.data_retention_days <= 0 {
            return Err(ConfigError::Message(
                "crawler.data_retention_days must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

impl WebSettings {
    /// 拼接站点根地址与路径
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// 登录页面地址
    pub fn login_url(&self) -> String {
        self.url_for(&self.login_path)
    }

    /// 客户列表页面地址
    pub fn clients_url(&self) -> String {
        self.url_for(&self.clients_path)
    }

    /// 指定客户的服务页面地址，客户标识经过百分号编码
    pub fn services_url(&self, client_id: &str) -> String {
        let path = self
            .services_path
            .replace(CLIENT_ID_PLACEHOLDER, &urlencoding::encode(client_id));
        self.url_for(&path)
    }

    /// 单次等待超时
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CrawlerSettings {
    pub fn delay_between_requests(&self) -> Duration {
        Duration::from_millis(self.delay_between_requests_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn login_redirect_wait(&self) -> Duration {
        Duration::from_millis(self.login_redirect_wait_ms)
    }

    pub fn search_settle(&self) -> Duration {
        Duration::from_millis(self.search_settle_ms)
    }

    pub fn page_load_wait(&self) -> Duration {
        Duration::from_millis(self.page_load_wait_ms)
    }
}

impl DatabaseSettings {
    /// 构造数据库连接URL
    ///
    /// 显式设置的 `url` 优先；否则由服务器、库名与凭据拼接，
    /// 受信任连接不携带凭据
    pub fn connection_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }

        if self.trusted_connection {
            return format!("postgres://{}/{}", self.server, self.name);
        }

        let password = self.password.as_deref().unwrap_or_default();
        format!(
            "postgres://{}:{}@{}/{}",
            urlencoding::encode(&self.username),
            urlencoding::encode(password),
            self.server,
            self.name
        )
    }

    /// 连接超时
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
