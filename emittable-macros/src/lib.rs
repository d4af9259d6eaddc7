//! emittable 过程宏
//!
//! `#[event_emittable]`：把事件分发能力组合进任意具名字段结构体。
//!
use proc_macro::TokenStream;

mod derive_utils;
mod event_emittable;
mod field_utils;

/// 事件能力宏
/// - 若缺失则注入字段 `emitter: ::emittable::EventEmitter<Payload>`（字段名可配置）
/// - 自动实现 `::emittable::Emittable`，实例可直接调用 `on/once/emit/...`
/// - 默认合并派生 `Default`，每次实例化都会得到全新、独立的发射器
/// - 重复标注时只生效一次，不会产生重复字段或重复实现；叠加标注的参数不一致时编译报错
///
/// 支持参数：`#[event_emittable(payload = Type, field = ident, default = true|false)]`
/// - `payload` 默认 `()`
/// - `field` 默认 `emitter`
/// - `default` 默认 `true`；为 `false` 时不派生 Default，由调用方自行构造发射器
#[proc_macro_attribute]
pub fn event_emittable(attr: TokenStream, item: TokenStream) -> TokenStream {
    event_emittable::expand(attr, item)
}
