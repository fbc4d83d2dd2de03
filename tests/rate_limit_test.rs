//! # 滑动窗口限流测试

use proxibase::config::RateLimitConfig;
use proxibase::ratelimit::SlidingWindowLimiter;

fn limiter(max_requests: u32, window_secs: u64) -> SlidingWindowLimiter {
    SlidingWindowLimiter::new(&RateLimitConfig {
        enabled: true,
        max_requests,
        window_secs,
        trust_forwarded_for: false,
    })
}

#[test]
fn three_per_window_admits_exactly_three() {
    // N=3, W=60 时同一 IP 连续四次 → 前三放行，第四拒绝
    let limiter = limiter(3, 60);
    let ip = "203.0.113.5";

    let d1 = limiter.check(ip);
    let d2 = limiter.check(ip);
    let d3 = limiter.check(ip);
    let d4 = limiter.check(ip);

    assert!(d1.allowed && d2.allowed && d3.allowed);
    assert_eq!([d1.remaining, d2.remaining, d3.remaining], [2, 1, 0]);

    assert!(!d4.allowed);
    assert_eq!(d4.remaining, 0);
    assert_eq!(d4.limit, 3);
    assert!((1..=60).contains(&d4.retry_after_secs));
}

#[test]
fn window_expiry_frees_budget() {
    let limiter = limiter(1, 0);
    let ip = "203.0.113.6";

    assert!(limiter.check(ip).allowed);
    std::thread::sleep(std::time::Duration::from_millis(10));
    // 窗口为 0s，旧记录立即过期
    assert!(limiter.check(ip).allowed);
}

#[test]
fn denied_requests_do_not_consume_budget() {
    let limiter = limiter(2, 60);
    let ip = "203.0.113.7";

    assert!(limiter.check(ip).allowed);
    assert!(limiter.check(ip).allowed);
    for _ in 0..5 {
        assert!(!limiter.check(ip).allowed);
    }
    // 拒绝不追加时间戳：窗口里仍只有 2 条记录
    let shard_count = limiter.tracked_keys();
    assert_eq!(shard_count, 1);
}

#[test]
fn eviction_bounds_memory() {
    let limiter = limiter(10, 0);
    for i in 0..50 {
        limiter.check(&format!("198.51.100.{i}"));
    }
    assert_eq!(limiter.tracked_keys(), 50);
    std::thread::sleep(std::time::Duration::from_millis(10));
    let evicted = limiter.evict_idle();
    assert_eq!(evicted, 50);
    assert_eq!(limiter.tracked_keys(), 0);
}

#[test]
fn disabled_limiter_short_circuits() {
    let limiter = SlidingWindowLimiter::new(&RateLimitConfig {
        enabled: false,
        max_requests: 1,
        window_secs: 60,
        trust_forwarded_for: false,
    });
    for _ in 0..100 {
        assert!(limiter.check("203.0.113.8").allowed);
    }
    assert_eq!(limiter.tracked_keys(), 0);
}
