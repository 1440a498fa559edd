// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// 重试策略配置
///
/// `max_retries` 是总尝试次数的上限（包括第一次）
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大尝试次数
    pub max_retries: u32,
    /// 两次尝试之间的等待时间
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(3, Duration::from_secs(2))
    }
}

impl RetryPolicy {
    /// 创建固定间隔重试策略
    ///
    /// 最多尝试 `attempts` 次，每两次之间固定等待 `delay`
    pub fn fixed(attempts: u32, delay: Duration) -> Self {
        Self {
            max_retries: attempts.max(1),
            delay,
        }
    }

    /// 已经尝试 `attempt` 次后是否还可以再试
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// 按策略执行操作，所有尝试都失败时返回最后一次的错误
    pub async fn execute<F, Fut, T, E>(&self, operation_name: &str, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.execute_when(operation_name, operation, |_| true).await
    }

    /// 按策略执行操作，只有 `retryable` 判定为可重试的错误才会重试
    pub async fn execute_when<F, Fut, T, E, P>(
        &self,
        operation_name: &str,
        mut operation: F,
        retryable: P,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: Fn(&E) -> bool,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if self.should_retry(attempt) && retryable(&e) => {
                    warn!(
                        "{} attempt {} failed: {}. Retrying in {:?}...",
                        operation_name, attempt, e, self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
