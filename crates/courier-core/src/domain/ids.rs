//! EventId - 個々のイベント発生を識別する ID
//!
//! ULID を使うので、同じミリ秒内でも一意で、生成時刻順にソートできる。
//! 時刻部分は `Envelope` の `occurred_at` と同じ値から作るため、
//! ログ上で id とタイムスタンプが食い違うことはない。

use std::fmt;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Ulid);

impl EventId {
    /// Fresh id whose time part is `at`.
    pub fn at(at: DateTime<Utc>) -> Self {
        Self(Ulid::from_datetime(SystemTime::from(at)))
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }

    /// Creation time encoded in the id, at millisecond precision.
    pub fn timestamp_ms(&self) -> u64 {
        self.0.timestamp_ms()
    }
}

impl From<Ulid> for EventId {
    fn from(ulid: Ulid) -> Self {
        Self(ulid)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "evt-{}", self.0)
    }
}
