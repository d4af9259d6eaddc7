use emittable::{Emittable, Listener};
use emittable_macros::event_emittable;

#[event_emittable]
struct Account {
    name: String,
}

fn main() {
    let account = Account::default();
    account
        .on("opened", Listener::new(|_: &()| Ok(())))
        .unwrap();
    assert!(account.emit("opened", &()).unwrap());
    assert!(account.name.is_empty());
}
