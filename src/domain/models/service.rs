// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// 页面未提供状态时使用的哨兵值
pub const UNKNOWN_STATUS: &str = "unknown";

/// 服务记录
///
/// 从某个客户的服务页面的一行中抓取得到。`service_date` 保留页面上的原始文本，
/// 不解析为日期类型，因为来源格式并不统一。`client_id` 仅是对客户外部标识的引用，
/// 数据库层面不做外键约束。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// 所属客户的外部标识
    pub client_id: String,
    /// 服务日期（原始文本）
    pub service_date: String,
    /// 服务类型
    pub service_type: String,
    /// 描述，可为空字符串
    pub description: String,
    /// 状态，缺失时为 [`UNKNOWN_STATUS`]
    pub status: String,
    /// 抓取时间，未设置时在序列化或入库时取当前时间
    pub extraction_date: Option<DateTime<Utc>>,
}

impl Service {
    /// 创建一个以当前时间为抓取时间的服务记录
    ///
    /// `description` 缺失时为空字符串，`status` 缺失时为 [`UNKNOWN_STATUS`]。
    pub fn new(
        client_id: impl Into<String>,
        service_date: impl Into<String>,
        service_type: impl Into<String>,
        description: Option<String>,
        status: Option<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            service_date: service_date.into(),
            service_type: service_type.into(),
            description: description.unwrap_or_default(),
            status: status.unwrap_or_else(|| UNKNOWN_STATUS.to_string()),
            extraction_date: Some(Utc::now()),
        }
    }

    /// 返回指定抓取时间的副本
    pub fn with_extraction_date(mut self, extraction_date: DateTime<Utc>) -> Self {
        self.extraction_date = Some(extraction_date);
        self
    }

    /// 实际用于持久化的抓取时间
    pub fn extraction_date_or(&self, fallback: DateTime<Utc>) -> DateTime<Utc> {
        self.extraction_date.unwrap_or(fallback)
    }

    /// 序列化为普通映射，`extraction_date` 始终非空
    pub fn to_map(&self) -> Map<String, Value> {
        let value = json!({
            "client_id": self.client_id,
            "service_date": self.service_date,
            "service_type": self.service_type,
            "description": self.description,
            "status": self.status,
            "extraction_date": self.extraction_date_or(Utc::now()),
        });

        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}
