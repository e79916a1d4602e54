//! IdGenerator port - ID 生成の抽象化
//!
//! テスト容易性のために trait として抽象化している。
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）

use crate::domain::ProcessId;
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は process ごとに一意な ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（settle 側のタスクからも共有される）
pub trait IdGenerator: Send + Sync {
    fn generate_process_id(&self) -> ProcessId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// Clock のタイムスタンプ + ランダム部分で ULID を組み立てる。
/// FixedClock を渡すと timestamp 部分が固定される。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_process_id(&self) -> ProcessId {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        ProcessId::from(ulid)
    }
}
