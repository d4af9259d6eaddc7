use emittable::Emittable;
use emittable_macros::event_emittable;

// 重复标注只注入一个字段、一个实现
#[event_emittable]
#[event_emittable]
#[derive(Default)]
struct Light {
    on: bool,
}

fn main() {
    let light = Light::default();
    assert!(!light.on);
    assert!(!light.emit("toggle", &()).unwrap());
}
