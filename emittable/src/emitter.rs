//! 事件发射器（EventEmitter）
//!
//! 按事件名维护有序的监听器登记表，提供注册、一次性注册、移除、分发与上限告警：
//! - 分发是同步的，在调用者的执行上下文中按注册顺序依次调用监听器；
//! - 分发前先对登记表取快照，监听器在分发过程中增删监听器不影响本轮迭代；
//! - 一次性监听器在调用前即从登记表移除，重入分发同一事件也不会再次触发；
//! - 首个返回错误的监听器终止本轮分发，错误原样向上传播。
//!
//! 所有操作只需 `&self`，监听器可以通过 `Rc` 持有宿主并在回调中重入。
//!
use crate::config::EmitterConfig;
use crate::error::{EmitterError, EmitterResult};
use crate::listener::Listener;
use crate::warning::{CapacityWarning, WarningSink};
use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

/// 特殊事件名：无监听器时分发该事件视为未处理的错误
pub const ERROR_EVENT: &str = "error";

/// 同步事件发射器，`P` 为分发给监听器的负载类型
pub struct EventEmitter<P = ()> {
    registry: RefCell<Registry<P>>,
    max_listeners: Cell<usize>,
    warning_sink: Rc<dyn WarningSink>,
}

impl<P> EventEmitter<P> {
    pub fn new() -> Self {
        Self::with_config(&EmitterConfig::default())
    }

    /// 以配置快照创建发射器
    pub fn with_config(config: &EmitterConfig) -> Self {
        Self {
            registry: RefCell::new(Registry::default()),
            max_listeners: Cell::new(config.max_listeners),
            warning_sink: Rc::clone(&config.warning_sink),
        }
    }

    /// 追加监听器
    pub fn on(&self, event: &str, listener: Listener<P>) -> EmitterResult<&Self> {
        self.register(event, listener, false, false)
    }

    /// 追加一次性监听器
    pub fn once(&self, event: &str, listener: Listener<P>) -> EmitterResult<&Self> {
        self.register(event, listener, true, false)
    }

    /// 在登记表最前插入监听器
    pub fn prepend_listener(&self, event: &str, listener: Listener<P>) -> EmitterResult<&Self> {
        self.register(event, listener, false, true)
    }

    /// 在登记表最前插入一次性监听器
    pub fn prepend_once_listener(
        &self,
        event: &str,
        listener: Listener<P>,
    ) -> EmitterResult<&Self> {
        self.register(event, listener, true, true)
    }

    /// 同步分发事件，返回是否存在监听器
    pub fn emit(&self, event: &str, payload: &P) -> EmitterResult<bool> {
        let snapshot = self.registry.borrow().snapshot(event);

        if snapshot.is_empty() {
            if event == ERROR_EVENT {
                return Err(EmitterError::UnhandledError {
                    event: event.to_string(),
                });
            }
            return Ok(false);
        }

        tracing::trace!(event = event, listeners = snapshot.len(), "emit");

        for record in snapshot {
            if record.once {
                // 已被重入的分发触发过
                if record.fired.replace(true) {
                    continue;
                }
                self.registry.borrow_mut().remove_record(event, &record);
            }

            // 回调期间不得持有登记表借用
            record
                .listener
                .call(payload)
                .map_err(|source| EmitterError::ListenerFailure {
                    event: event.to_string(),
                    source,
                })?;
        }

        Ok(true)
    }

    /// 移除首个与给定句柄相同的监听器，找不到时不做任何事
    pub fn remove_listener(&self, event: &str, listener: &Listener<P>) -> &Self {
        if self.registry.borrow_mut().remove_listener(event, listener) {
            tracing::trace!(event = event, "listener removed");
        }
        self
    }

    /// 指定事件时仅清空该事件，否则清空全部事件
    pub fn remove_all_listeners(&self, event: Option<&str>) -> &Self {
        let mut registry = self.registry.borrow_mut();
        match event {
            Some(name) => registry.clear_event(name),
            None => registry.clear(),
        }
        tracing::trace!(event = event.unwrap_or("*"), "listeners cleared");
        self
    }

    /// 返回监听器快照（不含 once 标记）
    pub fn listeners(&self, event: &str) -> Vec<Listener<P>> {
        self.registry
            .borrow()
            .snapshot(event)
            .into_iter()
            .map(|r| r.listener)
            .collect()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.registry.borrow().count(event)
    }

    /// 当前已有监听器的事件名，按首次注册顺序
    pub fn event_names(&self) -> Vec<String> {
        self.registry.borrow().names()
    }

    pub fn get_max_listeners(&self) -> usize {
        self.max_listeners.get()
    }

    /// 设置上限，`0` 表示不限制；只影响之后的注册检查
    pub fn set_max_listeners(&self, n: usize) -> &Self {
        self.max_listeners.set(n);
        self
    }

    fn register(
        &self,
        event: &str,
        listener: Listener<P>,
        once: bool,
        prepend: bool,
    ) -> EmitterResult<&Self> {
        let record = Record {
            listener,
            once,
            fired: Rc::new(Cell::new(false)),
        };

        let max = self.max_listeners.get();
        let warning = {
            let mut registry = self.registry.borrow_mut();
            let entry = registry.entry_mut(event);
            if prepend {
                entry.records.insert(0, record);
            } else {
                entry.records.push(record);
            }

            let count = entry.records.len();
            tracing::trace!(
                event = event,
                count = count,
                once = once,
                prepend = prepend,
                "listener registered"
            );

            if max > 0 && count > max && !entry.warned {
                entry.warned = true;
                Some(CapacityWarning {
                    event: event.to_string(),
                    count,
                    max_listeners: max,
                })
            } else {
                None
            }
        };

        // 出口可能重入发射器，先释放借用
        if let Some(warning) = warning {
            self.warning_sink.warn(&warning);
        }

        Ok(self)
    }
}

impl<P> Default for EventEmitter<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for EventEmitter<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: Vec<(String, usize)> = match self.registry.try_borrow() {
            Ok(registry) => registry
                .events
                .iter()
                .map(|e| (e.name.clone(), e.records.len()))
                .collect(),
            Err(_) => Vec::new(),
        };
        f.debug_struct("EventEmitter")
            .field("events", &counts)
            .field("max_listeners", &self.max_listeners.get())
            .finish()
    }
}

// -------- registry --------

struct Record<P> {
    listener: Listener<P>,
    once: bool,
    // 同一条登记在所有快照间共享的触发标记
    fired: Rc<Cell<bool>>,
}

impl<P> Clone for Record<P> {
    fn clone(&self) -> Self {
        Self {
            listener: self.listener.clone(),
            once: self.once,
            fired: Rc::clone(&self.fired),
        }
    }
}

struct EventEntry<P> {
    name: String,
    records: Vec<Record<P>>,
    warned: bool,
}

// 以 Vec 保存事件以保留首次注册顺序，事件数通常很少
struct Registry<P> {
    events: Vec<EventEntry<P>>,
}

impl<P> Default for Registry<P> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<P> Registry<P> {
    fn position(&self, event: &str) -> Option<usize> {
        self.events.iter().position(|e| e.name == event)
    }

    fn entry_mut(&mut self, event: &str) -> &mut EventEntry<P> {
        let idx = match self.position(event) {
            Some(idx) => idx,
            None => {
                self.events.push(EventEntry {
                    name: event.to_string(),
                    records: Vec::new(),
                    warned: false,
                });
                self.events.len() - 1
            }
        };
        &mut self.events[idx]
    }

    fn snapshot(&self, event: &str) -> Vec<Record<P>> {
        self.position(event)
            .map(|idx| self.events[idx].records.clone())
            .unwrap_or_default()
    }

    fn count(&self, event: &str) -> usize {
        self.position(event)
            .map(|idx| self.events[idx].records.len())
            .unwrap_or(0)
    }

    fn names(&self) -> Vec<String> {
        self.events.iter().map(|e| e.name.clone()).collect()
    }

    fn remove_record(&mut self, event: &str, record: &Record<P>) {
        self.remove_where(event, |r| Rc::ptr_eq(&r.fired, &record.fired));
    }

    fn remove_listener(&mut self, event: &str, listener: &Listener<P>) -> bool {
        self.remove_where(event, |r| r.listener.same_as(listener))
    }

    // 移除首个匹配项，保持其余顺序；事件清空后删除整个条目
    fn remove_where(&mut self, event: &str, pred: impl Fn(&Record<P>) -> bool) -> bool {
        let Some(idx) = self.position(event) else {
            return false;
        };
        let entry = &mut self.events[idx];
        let Some(pos) = entry.records.iter().position(pred) else {
            return false;
        };
        entry.records.remove(pos);
        if entry.records.is_empty() {
            self.events.remove(idx);
        }
        true
    }

    fn clear_event(&mut self, event: &str) {
        if let Some(idx) = self.position(event) {
            self.events.remove(idx);
        }
    }

    fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warning::NoopWarningSink;

    fn counter() -> (Rc<Cell<usize>>, Listener<()>) {
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let listener = Listener::new(move |_: &()| {
            h.set(h.get() + 1);
            Ok(())
        });
        (hits, listener)
    }

    #[test]
    fn test_on_invokes_every_emit() {
        let ee = EventEmitter::new();
        let (hits, l) = counter();
        ee.on("foo", l).unwrap();
        assert!(ee.emit("foo", &()).unwrap());
        assert!(ee.emit("foo", &()).unwrap());
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_once_invokes_exactly_once() {
        let ee = EventEmitter::new();
        let (hits, l) = counter();
        ee.once("foo", l).unwrap();
        assert!(ee.emit("foo", &()).unwrap());
        assert!(!ee.emit("foo", &()).unwrap());
        assert_eq!(hits.get(), 1);
        assert_eq!(ee.listener_count("foo"), 0);
    }

    #[test]
    fn test_emit_without_listeners_returns_false() {
        let ee: EventEmitter = EventEmitter::new();
        assert!(!ee.emit("nothing", &()).unwrap());
    }

    #[test]
    fn test_emit_preserves_registration_order() {
        let ee = EventEmitter::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let o = order.clone();
            ee.once("foo", Listener::new(move |_: &()| {
                o.borrow_mut().push(i);
                Ok(())
            }))
            .unwrap();
        }
        ee.emit("foo", &()).unwrap();
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_prepend_runs_first() {
        let ee = EventEmitter::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let (o1, o2) = (order.clone(), order.clone());
        ee.on("foo", Listener::new(move |_: &()| {
            o1.borrow_mut().push("on");
            Ok(())
        }))
        .unwrap()
        .prepend_once_listener("foo", Listener::new(move |_: &()| {
            o2.borrow_mut().push("prepend");
            Ok(())
        }))
        .unwrap();
        ee.emit("foo", &()).unwrap();
        ee.emit("foo", &()).unwrap();
        assert_eq!(*order.borrow(), vec!["prepend", "on", "on"]);
    }

    #[test]
    fn test_payload_is_delivered() {
        let ee: EventEmitter<String> = EventEmitter::new();
        let got = Rc::new(RefCell::new(String::new()));
        let g = got.clone();
        ee.on("msg", Listener::new(move |s: &String| {
            g.borrow_mut().push_str(s);
            Ok(())
        }))
        .unwrap();
        ee.emit("msg", &"hello".to_string()).unwrap();
        assert_eq!(*got.borrow(), "hello");
    }

    #[test]
    fn test_empty_event_name_is_an_ordinary_event() {
        let ee = EventEmitter::new();
        let (hits, l) = counter();
        ee.on("", l.clone()).unwrap();
        assert!(ee.emit("", &()).unwrap());
        assert_eq!(hits.get(), 1);
        assert_eq!(ee.event_names(), vec![String::new()]);

        ee.remove_listener("", &l);
        assert!(!ee.emit("", &()).unwrap());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_remove_listener_removes_first_match_only() {
        let ee = EventEmitter::new();
        let (hits, l) = counter();
        ee.on("foo", l.clone()).unwrap().on("foo", l.clone()).unwrap();
        ee.remove_listener("foo", &l);
        assert_eq!(ee.listener_count("foo"), 1);
        ee.emit("foo", &()).unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_remove_listener_unknown_event_is_noop() {
        let ee = EventEmitter::new();
        let (_, l) = counter();
        ee.remove_listener("missing", &l);
        assert!(ee.event_names().is_empty());
    }

    #[test]
    fn test_remove_listener_keeps_order() {
        let ee = EventEmitter::new();
        let (_, a) = counter();
        let (_, b) = counter();
        let (_, c) = counter();
        ee.on("foo", a.clone())
            .unwrap()
            .on("foo", b.clone())
            .unwrap()
            .on("foo", c.clone())
            .unwrap();
        ee.remove_listener("foo", &b);
        assert_eq!(ee.listeners("foo"), vec![a, c]);
    }

    #[test]
    fn test_event_names_follow_first_registration() {
        let ee = EventEmitter::new();
        let (_, l) = counter();
        ee.on("b", l.clone()).unwrap().on("a", l.clone()).unwrap().on("b", l.clone()).unwrap();
        assert_eq!(ee.event_names(), vec!["b".to_string(), "a".to_string()]);
        ee.remove_all_listeners(Some("b"));
        assert_eq!(ee.event_names(), vec!["a".to_string()]);
    }

    #[test]
    fn test_listeners_is_a_snapshot() {
        let ee = EventEmitter::new();
        let (_, a) = counter();
        let (_, b) = counter();
        ee.on("foo", a.clone()).unwrap().on("foo", b.clone()).unwrap();
        let snap = ee.listeners("foo");
        ee.remove_all_listeners(None);
        assert_eq!(snap, vec![a, b]);
        assert!(ee.listeners("foo").is_empty());
    }

    #[test]
    fn test_unhandled_error_event() {
        let ee: EventEmitter = EventEmitter::new();
        let err = ee.emit(ERROR_EVENT, &()).unwrap_err();
        assert!(matches!(err, EmitterError::UnhandledError { .. }));

        let (hits, l) = counter();
        ee.on(ERROR_EVENT, l).unwrap();
        assert!(ee.emit(ERROR_EVENT, &()).unwrap());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_listener_failure_aborts_delivery() {
        let ee = EventEmitter::new();
        let (before, l1) = counter();
        let (after, l3) = counter();
        ee.on("foo", l1)
            .unwrap()
            .on("foo", Listener::new(|_: &()| anyhow::bail!("boom")))
            .unwrap()
            .on("foo", l3)
            .unwrap();

        let err = ee.emit("foo", &()).unwrap_err();
        match err {
            EmitterError::ListenerFailure { event, source } => {
                assert_eq!(event, "foo");
                assert_eq!(source.to_string(), "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(before.get(), 1);
        assert_eq!(after.get(), 0);
        assert_eq!(ee.listener_count("foo"), 3);
    }

    #[test]
    fn test_failing_once_listener_is_still_removed() {
        let ee = EventEmitter::new();
        ee.once("foo", Listener::new(|_: &()| anyhow::bail!("boom")))
            .unwrap();
        assert!(ee.emit("foo", &()).is_err());
        assert!(!ee.emit("foo", &()).unwrap());
    }

    #[test]
    fn test_reentrant_emit_does_not_refire_once() {
        let ee = Rc::new(EventEmitter::new());
        let hits = Rc::new(Cell::new(0));
        let (h, inner) = (hits.clone(), Rc::downgrade(&ee));
        ee.once("foo", Listener::new(move |_: &()| {
            h.set(h.get() + 1);
            if let Some(ee) = inner.upgrade() {
                ee.emit("foo", &())?;
            }
            Ok(())
        }))
        .unwrap();
        ee.emit("foo", &()).unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_nested_emit_fires_sibling_once_only_once() {
        let ee = Rc::new(EventEmitter::new());
        let weak = Rc::downgrade(&ee);
        ee.once("foo", Listener::new(move |_: &()| {
            if let Some(ee) = weak.upgrade() {
                ee.emit("foo", &())?;
            }
            Ok(())
        }))
        .unwrap();
        let (hits, second) = counter();
        ee.once("foo", second).unwrap();

        ee.emit("foo", &()).unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_registration_during_emit_is_not_delivered() {
        let ee = Rc::new(EventEmitter::new());
        let (late_hits, late) = counter();
        let weak = Rc::downgrade(&ee);
        ee.on("foo", Listener::new(move |_: &()| {
            if let Some(ee) = weak.upgrade() {
                ee.on("foo", late.clone())?;
            }
            Ok(())
        }))
        .unwrap();

        ee.emit("foo", &()).unwrap();
        assert_eq!(late_hits.get(), 0);
        assert_eq!(ee.listener_count("foo"), 2);
    }

    #[test]
    fn test_removal_during_emit_does_not_skip_snapshot() {
        let ee = Rc::new(EventEmitter::new());
        let (hits, victim) = counter();
        let weak = Rc::downgrade(&ee);
        let v = victim.clone();
        ee.on("foo", Listener::new(move |_: &()| {
            if let Some(ee) = weak.upgrade() {
                ee.remove_listener("foo", &v);
            }
            Ok(())
        }))
        .unwrap()
        .on("foo", victim)
        .unwrap();

        ee.emit("foo", &()).unwrap();
        assert_eq!(hits.get(), 1);
        ee.emit("foo", &()).unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_max_listeners_default_and_set() {
        let ee: EventEmitter = EventEmitter::new();
        assert_eq!(ee.get_max_listeners(), crate::config::DEFAULT_MAX_LISTENERS);
        ee.set_max_listeners(2);
        assert_eq!(ee.get_max_listeners(), 2);
    }

    #[test]
    fn test_capacity_warning_fires_once_per_event() {
        let warnings = Rc::new(RefCell::new(Vec::<CapacityWarning>::new()));
        let w = warnings.clone();
        let cfg = EmitterConfig::builder()
            .max_listeners(2)
            .warning_sink(Rc::new(move |warning: &CapacityWarning| {
                w.borrow_mut().push(warning.clone())
            }))
            .build();
        let ee = EventEmitter::with_config(&cfg);
        for _ in 0..4 {
            let (_, l) = counter();
            ee.on("foo", l).unwrap();
        }
        assert_eq!(
            warnings.borrow().as_slice(),
            &[CapacityWarning {
                event: "foo".to_string(),
                count: 3,
                max_listeners: 2,
            }]
        );
        assert_eq!(ee.listener_count("foo"), 4);
    }

    #[test]
    fn test_zero_means_unlimited() {
        let warned = Rc::new(Cell::new(false));
        let w = warned.clone();
        let cfg = EmitterConfig::builder()
            .max_listeners(0)
            .warning_sink(Rc::new(move |_: &CapacityWarning| w.set(true)))
            .build();
        let ee = EventEmitter::with_config(&cfg);
        for _ in 0..50 {
            let (_, l) = counter();
            ee.on("foo", l).unwrap();
        }
        assert!(!warned.get());
    }

    #[test]
    fn test_config_is_snapshotted() {
        let mut cfg = EmitterConfig::builder()
            .max_listeners(3)
            .warning_sink(Rc::new(NoopWarningSink))
            .build();
        let ee: EventEmitter = EventEmitter::with_config(&cfg);
        cfg.max_listeners = 7;
        assert_eq!(ee.get_max_listeners(), 3);
        let later: EventEmitter = EventEmitter::with_config(&cfg);
        assert_eq!(later.get_max_listeners(), 7);
    }

    #[test]
    fn test_debug_lists_event_counts() {
        let ee = EventEmitter::new();
        let (_, l) = counter();
        ee.on("foo", l).unwrap();
        let out = format!("{ee:?}");
        assert!(out.contains("\"foo\", 1"));
    }
}
