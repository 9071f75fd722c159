//! Event - ディスパッチされるイベントの抽象と、標準実装の `Envelope`

use std::any::Any;
use std::fmt;

use chrono::{DateTime, Utc};

use super::ids::EventId;
use crate::ports::{Clock, SystemClock};

/// Event はディスパッチャが配送できるもの
///
/// ディスパッチャが読むのは `name()` だけ。payload と時刻はそのまま
/// handler に渡される。
///
/// Object safe: handlers receive `&dyn Event`.
pub trait Event: Send + Sync {
    /// Bucket key. An empty name is a valid key.
    fn name(&self) -> &str;

    /// Opaque application data. Handlers downcast with [`payload_as`].
    fn payload(&self) -> &dyn Any;

    fn occurred_at(&self) -> DateTime<Utc>;

    /// Identity of this occurrence, if the event carries one. Recorded on
    /// the `dispatch` span.
    fn id(&self) -> Option<EventId> {
        None
    }
}

impl fmt::Debug for dyn Event + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("occurred_at", &self.occurred_at())
            .finish_non_exhaustive()
    }
}

/// Downcast an event payload.
///
/// Returns `None` if the payload is not a `T`.
pub fn payload_as<T: Any>(event: &dyn Event) -> Option<&T> {
    event.payload().downcast_ref::<T>()
}

/// Envelope は名前付き payload に id と発生時刻を付けたもの
///
/// ```ignore
/// let event = Envelope::new("order.placed", OrderPlaced { id: 7 });
/// dispatcher.dispatch(&event)?;
/// ```
#[derive(Debug, Clone)]
pub struct Envelope<P> {
    id: EventId,
    name: String,
    payload: P,
    occurred_at: DateTime<Utc>,
}

impl<P: Any + Send + Sync> Envelope<P> {
    pub fn new(name: impl Into<String>, payload: P) -> Self {
        Self::with_clock(name, payload, &SystemClock)
    }

    /// テストでは `FixedClock` を渡して時刻を固定する
    pub fn with_clock(name: impl Into<String>, payload: P, clock: &dyn Clock) -> Self {
        let occurred_at = clock.now();
        Self {
            id: EventId::at(occurred_at),
            name: name.into(),
            payload,
            occurred_at,
        }
    }

    pub fn payload_ref(&self) -> &P {
        &self.payload
    }

    pub fn into_payload(self) -> P {
        self.payload
    }
}

impl<P: Any + Send + Sync> Event for Envelope<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn payload(&self) -> &dyn Any {
        &self.payload
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    fn id(&self) -> Option<EventId> {
        Some(self.id)
    }
}
