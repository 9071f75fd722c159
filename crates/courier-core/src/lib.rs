//! courier-core
//!
//! In-process event dispatcher: named events are routed synchronously to the
//! handlers registered under their name, in registration order.
//!
//! # Modules
//! - **domain**: `Event` trait, `Envelope`, `EventId`, error types
//! - **ports**: `EventHandler`, `Clock`
//! - **app**: `EventDispatcher` and its configuration

pub mod domain;
pub mod ports;
pub mod app;

pub use self::app::{DispatcherConfig, EventDispatcher, FailurePolicy};
pub use self::domain::{DispatchError, Envelope, Event, HandlerError, RegistryError};
pub use self::ports::{EventHandler, handler_fn};
