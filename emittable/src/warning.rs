//! 容量告警（CapacityWarning）与告警出口（WarningSink）
//!
//! 当某事件的监听器数量首次超过上限时，发射器产生一条 `CapacityWarning`，
//! 交由配置中的 `WarningSink` 处理。告警仅为诊断信号：不会阻止注册，也不会返回错误。
//!
use serde::Serialize;
use std::fmt;

/// 监听器数量超过上限时产生的诊断信息
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CapacityWarning {
    /// 触发告警的事件名
    pub event: String,
    /// 注册完成后该事件的监听器数量
    pub count: usize,
    /// 当时生效的上限
    pub max_listeners: usize,
}

impl fmt::Display for CapacityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Possible EventEmitter memory leak detected. {} {} listeners added. \
             Use emitter.set_max_listeners() to increase limit",
            self.count, self.event
        )
    }
}

/// 告警出口：决定 `CapacityWarning` 的去向
pub trait WarningSink {
    fn warn(&self, warning: &CapacityWarning);
}

/// 默认出口：丢弃告警
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopWarningSink;

impl WarningSink for NoopWarningSink {
    fn warn(&self, _warning: &CapacityWarning) {}
}

/// 通过 `tracing::warn!` 输出结构化告警
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingWarningSink;

impl WarningSink for TracingWarningSink {
    fn warn(&self, warning: &CapacityWarning) {
        tracing::warn!(
            event = %warning.event,
            count = warning.count,
            max_listeners = warning.max_listeners,
            "{warning}"
        );
    }
}

// 闭包即出口，便于测试或接入自定义上报
impl<F> WarningSink for F
where
    F: Fn(&CapacityWarning),
{
    fn warn(&self, warning: &CapacityWarning) {
        self(warning)
    }
}
