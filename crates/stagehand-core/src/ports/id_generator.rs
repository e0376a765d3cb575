//! IdGenerator port - correlation ID 生成の抽象化
//!
//! Event source は redemption / command を受け取ったスレッド上で ID を生成します。
//! テスト容易性のために、trait として抽象化しています。

use crate::domain::ids::{CommandId, RedemptionId};
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は correlation ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数の network thread から使える）
pub trait IdGenerator: Send + Sync {
    fn generate_redemption_id(&self) -> RedemptionId;

    fn generate_command_id(&self) -> CommandId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// Clock を使って現在時刻ベースの ULID を生成します。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_redemption_id(&self) -> RedemptionId {
        RedemptionId::from(self.next_ulid())
    }

    fn generate_command_id(&self) -> CommandId {
        CommandId::from(self.next_ulid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock};
    use chrono::{TimeZone, Utc};

    #[test]
    fn ulid_generator_generates_unique_ids() {
        let id_gen = UlidGenerator::new(SystemClock);

        let id1 = id_gen.generate_redemption_id();
        let id2 = id_gen.generate_redemption_id();

        assert_ne!(id1, id2);
    }

    #[test]
    fn fixed_clock_pins_the_timestamp_part() {
        let fixed_time = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let id_gen = UlidGenerator::new(FixedClock::new(fixed_time));

        let id1 = id_gen.generate_command_id();
        let id2 = id_gen.generate_command_id();

        // ランダム部分があるので ID は異なる
        assert_ne!(id1, id2);

        // ただし、timestamp 部分は同じはず
        let timestamp1 = (id1.as_ulid().0 >> 80) as u64;
        let timestamp2 = (id2.as_ulid().0 >> 80) as u64;
        assert_eq!(timestamp1, timestamp2);
        assert_eq!(timestamp1, fixed_time.timestamp_millis() as u64);
    }
}
