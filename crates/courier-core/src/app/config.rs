//! DispatcherConfig - ディスパッチャの設定

use serde::{Deserialize, Serialize};

/// handler がエラーを返したときの `dispatch` の振る舞い
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failing handler and return its error.
    #[default]
    Halt,

    /// Run every handler, then report all failures together.
    Collect,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl DispatcherConfig {
    pub fn new(failure_policy: FailurePolicy) -> Self {
        Self { failure_policy }
    }
}
