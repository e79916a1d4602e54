//! Ports - 抽象化レイヤー
//!
//! 時刻と ID 生成を trait にして、テストで差し替えられるようにしている。

pub mod clock;
pub mod id_generator;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
