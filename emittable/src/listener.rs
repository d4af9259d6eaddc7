//! 监听器句柄（Listener）
//!
//! 监听器以引用身份区分：同一个句柄（及其克隆）视为同一监听器，
//! 即便两个闭包代码完全相同，分别创建的句柄也互不相等。
//!
use std::{fmt, rc::Rc};

type Callback<P> = dyn Fn(&P) -> anyhow::Result<()>;

/// 可克隆的监听器句柄，克隆共享同一身份
pub struct Listener<P = ()> {
    callback: Rc<Callback<P>>,
}

impl<P> Listener<P> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&P) -> anyhow::Result<()> + 'static,
    {
        Self {
            callback: Rc::new(f),
        }
    }

    /// 调用监听器
    pub fn call(&self, payload: &P) -> anyhow::Result<()> {
        (self.callback)(payload)
    }

    /// 判断两个句柄是否指向同一监听器
    pub fn same_as(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.callback), Rc::as_ptr(&other.callback))
    }
}

impl<P> Clone for Listener<P> {
    fn clone(&self) -> Self {
        Self {
            callback: Rc::clone(&self.callback),
        }
    }
}

impl<P> PartialEq for Listener<P> {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl<P> Eq for Listener<P> {}

impl<P> fmt::Debug for Listener<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener")
            .field(&Rc::as_ptr(&self.callback).cast::<()>())
            .finish()
    }
}
