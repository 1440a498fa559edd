// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// 客户记录
///
/// 从客户列表页面的一行中抓取得到。`client_id` 原样保存页面上的外部标识，
/// 存储层以 (client_id, extraction_date) 作为一次快照的身份，
/// 因此同一客户在不同运行中会形成多条历史记录。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// 页面上的外部客户标识
    pub client_id: String,
    /// 客户名称
    pub name: String,
    /// 电子邮箱（可选字段，页面缺失时为 None）
    pub email: Option<String>,
    /// 电话（可选字段，页面缺失时为 None）
    pub phone: Option<String>,
    /// 抓取时间，未设置时在序列化或入库时取当前时间
    pub extraction_date: Option<DateTime<Utc>>,
}

impl Client {
    /// 创建一个以当前时间为抓取时间的客户记录
    pub fn new(
        client_id: impl Into<String>,
        name: impl Into<String>,
        email: Option<String>,
        phone: Option<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            name: name.into(),
            email,
            phone,
            extraction_date: Some(Utc::now()),
        }
    }

    /// 返回指定抓取时间的副本
    pub fn with_extraction_date(mut self, extraction_date: DateTime<Utc>) -> Self {
        self.extraction_date = Some(extraction_date);
        self
    }

    /// 实际用于持久化的抓取时间
    ///
    /// # 参数
    ///
    /// * `fallback` - 记录未携带抓取时间时使用的时间
    pub fn extraction_date_or(&self, fallback: DateTime<Utc>) -> DateTime<Utc> {
        self.extraction_date.unwrap_or(fallback)
    }

    /// 序列化为普通映射
    ///
    /// `extraction_date` 始终非空：未设置时取序列化时刻。
    pub fn to_map(&self) -> Map<String, Value> {
        let value = json!({
            "client_id": self.client_id,
            "name": self.name,
            "email": self.email,
            "phone": self.phone,
            "extraction_date": self.extraction_date_or(Utc::now()),
        });

        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}
