use std::sync::atomic::{AtomicI64, Ordering};

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Custom epoch: 2024-01-01 00:00:00 UTC
const EPOCH_MS: i64 = 1_704_067_200_000;

static LAST_ID: AtomicI64 = AtomicI64::new(0);

/// Generate a Snowflake-style i64 for use as resource ID.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 12 bits: random start within the millisecond
///
/// Ids handed out by one process are strictly increasing; a burst inside the
/// same millisecond continues from the previous id instead of re-rolling.
pub fn snowflake_id() -> i64 {
    use rand::Rng;
    let ts = (now_millis() - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
    let candidate = (ts << 12) | rand::thread_rng().gen_range(0..0x800);

    let mut last = LAST_ID.load(Ordering::Relaxed);
    loop {
        let next = candidate.max(last + 1);
        match LAST_ID.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(current) => last = current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_snowflake_ids_fit_js_numbers() {
        let id = snowflake_id();
        assert!(id > 0);
        assert!(id < (1_i64 << 53));
    }

    #[test]
    fn test_burst_ids_are_unique_and_increasing() {
        let ids: Vec<i64> = (0..10_000).map(|_| snowflake_id()).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());
    }
}
