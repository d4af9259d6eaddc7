//! 事件分发统一错误定义
//!
//! 仅包含注册参数校验、监听器执行失败与未处理的 `error` 事件三类，
//! 容量超限属于告警（见 `warning`），不在此列。
//!
use thiserror::Error;

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EmitterError {
    // --- 注册期 ---
    // `Listener<P>` 只能包装可调用对象、事件名是任意字符串（含空串），
    // 当前没有代码路径会构造该变体，保留给不经类型系统约束的注册入口
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    // --- 分发期 ---
    #[error("listener failed: event={event}, reason={source}")]
    ListenerFailure {
        event: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("unhandled error event: event={event}")]
    UnhandledError { event: String },
}

/// 统一 Result 类型别名
pub type EmitterResult<T> = Result<T, EmitterError>;
