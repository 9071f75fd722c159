//! EventDispatcher - イベント名から handler 列へのマッピング
//!
//! # ロック
//! - マップ全体を `RwLock` 1 つで守る
//! - `has`、`dispatch` 内の参照、各種アクセサは read 側
//! - `register` / `unregister` / `clear` は write 側
//! - `dispatch` は bucket を複製してからロックを解放し、その後で handler を
//!   呼ぶ。handler からディスパッチャを再度呼んでもデッドロックしない。
//!   handler 内での登録変更は次の dispatch から反映される。
//!
//! ロック保持中にユーザーコードは走らないので、poison されてもマップは
//! 整合している。poison はエラーにせず回復する。

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, debug_span, field, trace, warn};

use super::config::{DispatcherConfig, FailurePolicy};
use crate::domain::errors::{DispatchError, HandlerFailure, RegistryError};
use crate::domain::event::Event;
use crate::ports::handler::{EventHandler, same_handler};

type Bucket = Vec<Arc<dyn EventHandler>>;

/// EventDispatcher はイベントを、その名前で登録された handler に配送する
///
/// ```ignore
/// let dispatcher = EventDispatcher::new();
/// let audit: Arc<dyn EventHandler> = Arc::new(AuditLog);
///
/// dispatcher.register("user.created", audit.clone())?;
/// dispatcher.dispatch(&Envelope::new("user.created", user))?;
/// ```
///
/// Share one instance between producers as `Arc<EventDispatcher>`.
pub struct EventDispatcher {
    handlers: RwLock<HashMap<String, Bucket>>,
    config: DispatcherConfig,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::default())
    }

    pub fn with_config(config: DispatcherConfig) -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Bucket>> {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Bucket>> {
        self.handlers.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `handler` to the bucket for `event`.
    ///
    /// Fails with `HandlerAlreadyRegistered` if this exact instance is
    /// already in the bucket. The same instance may be registered under
    /// other names.
    pub fn register(
        &self,
        event: &str,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), RegistryError> {
        let mut handlers = self.write();
        if let Some(bucket) = handlers.get(event)
            && bucket.iter().any(|h| same_handler(h, &handler))
        {
            return Err(RegistryError::HandlerAlreadyRegistered {
                event: event.to_string(),
            });
        }

        let bucket = handlers.entry(event.to_string()).or_default();
        bucket.push(handler);
        debug!(event, handlers = bucket.len(), "handler registered");
        Ok(())
    }

    /// Remove `handler` from the bucket for `event`.
    ///
    /// The name disappears from the map once its last handler is gone.
    /// Fails with `HandlerNotFound` if the name or the handler is unknown.
    pub fn unregister(
        &self,
        event: &str,
        handler: &Arc<dyn EventHandler>,
    ) -> Result<(), RegistryError> {
        let mut handlers = self.write();
        let not_found = || RegistryError::HandlerNotFound {
            event: event.to_string(),
        };

        let bucket = handlers.get_mut(event).ok_or_else(not_found)?;
        let position = bucket
            .iter()
            .position(|h| same_handler(h, handler))
            .ok_or_else(not_found)?;
        bucket.remove(position);

        let remaining = bucket.len();
        if remaining == 0 {
            handlers.remove(event);
        }
        debug!(event, handlers = remaining, "handler unregistered");
        Ok(())
    }

    /// Whether this exact instance is registered under `event`.
    pub fn has(&self, event: &str, handler: &Arc<dyn EventHandler>) -> bool {
        self.read()
            .get(event)
            .is_some_and(|bucket| bucket.iter().any(|h| same_handler(h, handler)))
    }

    /// Drop every registration.
    pub fn clear(&self) {
        let mut handlers = self.write();
        let names = handlers.len();
        handlers.clear();
        debug!(names, "dispatcher cleared");
    }

    /// Invoke every handler registered under `event.name()`, in registration
    /// order, and return how many were invoked.
    ///
    /// An unknown name is not an error: nothing runs and `Ok(0)` comes back.
    /// Handler failures are handled per `FailurePolicy`.
    pub fn dispatch(&self, event: &dyn Event) -> Result<usize, DispatchError> {
        let name = event.name();
        let span = debug_span!("dispatch", event = name, event_id = field::Empty);
        if let Some(id) = event.id() {
            span.record("event_id", field::display(id));
        }
        let _guard = span.enter();

        let Some(bucket) = self.read().get(name).cloned() else {
            debug!("no handlers registered");
            return Ok(0);
        };

        match self.config.failure_policy {
            FailurePolicy::Halt => {
                for (position, handler) in bucket.iter().enumerate() {
                    trace!(position, "invoking handler");
                    if let Err(source) = handler.handle(event) {
                        warn!(position, error = %source, "handler failed, halting dispatch");
                        return Err(DispatchError::HandlerFailed {
                            event: name.to_string(),
                            position,
                            source,
                        });
                    }
                }
            }
            FailurePolicy::Collect => {
                let mut failures = Vec::new();
                for (position, handler) in bucket.iter().enumerate() {
                    trace!(position, "invoking handler");
                    if let Err(error) = handler.handle(event) {
                        warn!(position, error = %error, "handler failed");
                        failures.push(HandlerFailure { position, error });
                    }
                }
                if !failures.is_empty() {
                    return Err(DispatchError::Aggregate {
                        event: name.to_string(),
                        invoked: bucket.len(),
                        failures,
                    });
                }
            }
        }

        Ok(bucket.len())
    }

    /// Number of handlers registered under `event`.
    pub fn handler_count(&self, event: &str) -> usize {
        self.read().get(event).map_or(0, Vec::len)
    }

    /// Names with at least one handler, sorted.
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of event names with handlers.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<String, usize> = self
            .read()
            .iter()
            .map(|(name, bucket)| (name.clone(), bucket.len()))
            .collect();
        f.debug_struct("EventDispatcher")
            .field("handlers", &counts)
            .field("config", &self.config)
            .finish()
    }
}
