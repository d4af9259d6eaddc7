//! 同步发布/订阅事件能力（emittable）
//!
//! 提供可被组合进任意结构体的事件分发能力：
//! - 事件发射器（`emitter`）：按事件名登记监听器，同步分发、一次性监听、移除与上限告警
//! - 监听器句柄（`listener`）：以引用身份区分的回调
//! - 能力接口（`capability`）：让宿主类型直接暴露发射器的全部操作
//! - 配置（`config`）与告警出口（`warning`）
//!
//! 配合 `emittable-macros` 中的 `#[event_emittable]` 使用时，宏负责向结构体注入
//! 独立的发射器字段并实现 `Emittable`，每个实例都拥有自己的登记表。
//!
//! 本 crate 只面向单线程：分发在调用者上下文中同步完成，不提供异步、跨线程或持久化投递。
//!
pub mod capability;
pub mod config;
pub mod emitter;
pub mod error;
pub mod listener;
pub mod warning;

pub use capability::Emittable;
pub use config::{DEFAULT_MAX_LISTENERS, EmitterConfig};
pub use emitter::{ERROR_EVENT, EventEmitter};
pub use error::{EmitterError, EmitterResult};
pub use listener::Listener;
pub use warning::{CapacityWarning, NoopWarningSink, TracingWarningSink, WarningSink};

// 允许在本 crate 内部通过 ::emittable 进行自引用，
// 以便过程宏在本 crate 的测试中也能解析到 ::emittable 路径。
extern crate self as emittable;
