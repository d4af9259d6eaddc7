//! 发射器配置（EmitterConfig）
//!
//! 以显式配置取代进程级可变默认值：发射器在构造时对配置做一次快照，
//! 之后对配置的修改不会影响已创建的发射器。
//!
use crate::warning::{NoopWarningSink, WarningSink};
use bon::Builder;
use std::{fmt, rc::Rc};

/// 默认的单事件监听器上限
pub const DEFAULT_MAX_LISTENERS: usize = 10;

/// 发射器配置
#[derive(Builder, Clone)]
pub struct EmitterConfig {
    /// 单事件监听器上限，`0` 表示不限制
    #[builder(default = DEFAULT_MAX_LISTENERS)]
    pub max_listeners: usize,
    /// 超限告警出口
    #[builder(default = default_warning_sink())]
    pub warning_sink: Rc<dyn WarningSink>,
}

fn default_warning_sink() -> Rc<dyn WarningSink> {
    Rc::new(NoopWarningSink)
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            max_listeners: DEFAULT_MAX_LISTENERS,
            warning_sink: default_warning_sink(),
        }
    }
}

impl fmt::Debug for EmitterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmitterConfig")
            .field("max_listeners", &self.max_listeners)
            .finish_non_exhaustive()
    }
}
