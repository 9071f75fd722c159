//! App - ディスパッチャ本体と設定

pub mod config;
pub mod dispatcher;

pub use self::config::{DispatcherConfig, FailurePolicy};
pub use self::dispatcher::EventDispatcher;
