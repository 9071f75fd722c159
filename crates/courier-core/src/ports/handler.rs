//! EventHandler port - ディスパッチャの受け手側

use std::sync::Arc;

use crate::domain::errors::HandlerError;
use crate::domain::event::Event;

/// EventHandler は登録されたイベント名で dispatch されるたびに呼ばれる
///
/// ```ignore
/// struct AuditLog;
///
/// impl EventHandler for AuditLog {
///     fn handle(&self, event: &dyn Event) -> Result<(), HandlerError> {
///         println!("{} at {}", event.name(), event.occurred_at());
///         Ok(())
///     }
/// }
/// ```
///
/// # 同一性
/// - `Arc<dyn EventHandler>` として登録し、値ではなく割り当て（ポインタ）で比較する
/// - フィールドが同じでも別の `Arc` は別の handler
/// - `has` / `unregister` のために `Arc` を保持しておくこと
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &dyn Event) -> Result<(), HandlerError>;
}

/// Adapter turning a closure into an `EventHandler`.
pub struct FnHandler<F> {
    f: F,
}

impl<F> EventHandler for FnHandler<F>
where
    F: Fn(&dyn Event) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle(&self, event: &dyn Event) -> Result<(), HandlerError> {
        (self.f)(event)
    }
}

/// Wrap a closure as a shareable handler.
pub fn handler_fn<F>(f: F) -> Arc<dyn EventHandler>
where
    F: Fn(&dyn Event) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    Arc::new(FnHandler { f })
}

/// Identity of a handler: address of its `Arc` allocation.
///
/// Only the data pointer is compared. Vtable pointers for one allocation are
/// not guaranteed to be unique.
pub(crate) fn same_handler(a: &Arc<dyn EventHandler>, b: &Arc<dyn EventHandler>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
