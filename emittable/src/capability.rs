//! 事件能力（Emittable）
//!
//! 任何内嵌 `EventEmitter` 的类型实现该 trait 后，即可在自身上直接调用
//! `on/once/emit/...`，行为与直接调用内嵌发射器完全一致。
//! 通常由 `#[event_emittable]` 宏生成实现，也可以手写。
//!
use crate::emitter::EventEmitter;
use crate::error::EmitterResult;
use crate::listener::Listener;

/// 具备事件分发能力的类型
pub trait Emittable {
    /// 分发给监听器的负载类型
    type Payload;

    /// 返回该实例独占的发射器
    fn emitter(&self) -> &EventEmitter<Self::Payload>;

    fn on(&self, event: &str, listener: Listener<Self::Payload>) -> EmitterResult<&Self> {
        self.emitter().on(event, listener)?;
        Ok(self)
    }

    fn once(&self, event: &str, listener: Listener<Self::Payload>) -> EmitterResult<&Self> {
        self.emitter().once(event, listener)?;
        Ok(self)
    }

    fn prepend_listener(
        &self,
        event: &str,
        listener: Listener<Self::Payload>,
    ) -> EmitterResult<&Self> {
        self.emitter().prepend_listener(event, listener)?;
        Ok(self)
    }

    fn prepend_once_listener(
        &self,
        event: &str,
        listener: Listener<Self::Payload>,
    ) -> EmitterResult<&Self> {
        self.emitter().prepend_once_listener(event, listener)?;
        Ok(self)
    }

    fn emit(&self, event: &str, payload: &Self::Payload) -> EmitterResult<bool> {
        self.emitter().emit(event, payload)
    }

    fn remove_listener(&self, event: &str, listener: &Listener<Self::Payload>) -> &Self {
        self.emitter().remove_listener(event, listener);
        self
    }

    fn remove_all_listeners(&self, event: Option<&str>) -> &Self {
        self.emitter().remove_all_listeners(event);
        self
    }

    fn listeners(&self, event: &str) -> Vec<Listener<Self::Payload>> {
        self.emitter().listeners(event)
    }

    fn listener_count(&self, event: &str) -> usize {
        self.emitter().listener_count(event)
    }

    fn event_names(&self) -> Vec<String> {
        self.emitter().event_names()
    }

    fn get_max_listeners(&self) -> usize {
        self.emitter().get_max_listeners()
    }

    fn set_max_listeners(&self, n: usize) -> &Self {
        self.emitter().set_max_listeners(n);
        self
    }
}

impl<P> Emittable for EventEmitter<P> {
    type Payload = P;

    fn emitter(&self) -> &EventEmitter<P> {
        self
    }
}
