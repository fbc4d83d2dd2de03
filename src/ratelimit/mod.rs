//! # 速率限制模块
//!
//! 按客户端 IP 的滑动窗口限流。桶按 IP 哈希分片，
//! 单个判定只锁对应分片。

use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, linfo};

const SHARD_COUNT: usize = 16;

/// 单次限流判定结果
#[derive(Debug, Clone)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// 拒绝时距最早一条记录滑出窗口的秒数（向上取整）
    pub retry_after_secs: u64,
}

impl RateLimitDecision {
    fn allowed_unlimited(limit: u32) -> Self {
        Self {
            allowed: true,
            limit,
            remaining: limit,
            retry_after_secs: 0,
        }
    }
}

/// 滑动窗口限流器
pub struct SlidingWindowLimiter {
    enabled: bool,
    max_requests: u32,
    window: Duration,
    shards: Vec<Mutex<HashMap<String, VecDeque<Instant>>>>,
}

impl SlidingWindowLimiter {
    #[must_use]
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            enabled: config.enabled,
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_secs),
            shards: (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    fn shard_for(&self, key: &str) -> &Mutex<HashMap<String, VecDeque<Instant>>> {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % SHARD_COUNT]
    }

    /// 判定一次请求
    ///
    /// 关闭时在改动任何状态前直接放行。放行时记录当前时间戳，
    /// 拒绝的请求不计入窗口。
    pub fn check(&self, client_ip: &str) -> RateLimitDecision {
        if !self.enabled {
            return RateLimitDecision::allowed_unlimited(self.max_requests);
        }

        let now = Instant::now();
        let mut shard = self
            .shard_for(client_ip)
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let bucket = shard.entry(client_ip.to_string()).or_default();

        // 丢掉窗口外的旧记录
        while let Some(front) = bucket.front() {
            if now.duration_since(*front) > self.window {
                bucket.pop_front();
            } else {
                break;
            }
        }

        let count = bucket.len() as u32;
        if count >= self.max_requests {
            let retry_after = bucket
                .front()
                .map(|oldest| {
                    let elapsed = now.duration_since(*oldest);
                    self.window.saturating_sub(elapsed).as_secs_f64().ceil() as u64
                })
                .unwrap_or(0);
            return RateLimitDecision {
                allowed: false,
                limit: self.max_requests,
                remaining: 0,
                retry_after_secs: retry_after.max(1),
            };
        }

        bucket.push_back(now);
        RateLimitDecision {
            allowed: true,
            limit: self.max_requests,
            remaining: self.max_requests - (count + 1),
            retry_after_secs: 0,
        }
    }

    /// 清理窗口内没有任何记录的空闲键，约束内存
    pub fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let mut evicted = 0;
        for shard in &self.shards {
            let mut map = shard.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let before = map.len();
            map.retain(|_, bucket| {
                bucket
                    .back()
                    .is_some_and(|last| now.duration_since(*last) <= self.window)
            });
            evicted += before - map.len();
        }
        evicted
    }

    /// 当前跟踪的键数量
    #[must_use]
    pub fn tracked_keys(&self) -> usize {
        self.shards
            .iter()
            .map(|s| {
                s.lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .len()
            })
            .sum()
    }
}

/// 启动周期性的空闲键清理任务
pub fn spawn_eviction_task(limiter: Arc<SlidingWindowLimiter>) -> tokio::task::JoinHandle<()> {
    let period = limiter.window.max(Duration::from_secs(60));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let evicted = limiter.evict_idle();
            if evicted > 0 {
                ldebug!(
                    "system",
                    LogStage::BackgroundTask,
                    LogComponent::RateLimiter,
                    "evict_idle",
                    &format!("evicted {evicted} idle rate-limit keys"),
                    remaining_keys = limiter.tracked_keys()
                );
            }
        }
    })
}

/// 启动时打印限流配置
pub fn log_limiter_config(config: &RateLimitConfig) {
    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::RateLimiter,
        "limiter_init",
        &format!(
            "rate limiter {}: {} requests / {}s window",
            if config.enabled { "enabled" } else { "disabled" },
            config.max_requests,
            config.window_secs
        )
    );
}
