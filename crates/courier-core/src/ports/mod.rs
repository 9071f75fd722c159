//! Ports - ディスパッチャとアプリケーションコードの境界
//!
//! - **EventHandler**: イベントの受け手（アプリケーション側が実装）
//! - **Clock**: `Envelope` の発生時刻。テストでは `FixedClock` に差し替える

pub mod handler;
pub mod clock;

pub use self::handler::{EventHandler, FnHandler, handler_fn};
pub use self::clock::{Clock, FixedClock, SystemClock};
