//! Domain model: events, ids and errors.

pub mod event;
pub mod errors;
pub mod ids;

pub use self::event::{Envelope, Event, payload_as};
pub use self::errors::{DispatchError, HandlerError, HandlerFailure, RegistryError};
pub use self::ids::EventId;
