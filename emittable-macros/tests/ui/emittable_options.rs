use emittable::{Emittable, EmitterConfig, EventEmitter, Listener};
use emittable_macros::event_emittable;

#[event_emittable(payload = String, field = events, default = false)]
#[derive(Debug)]
struct Session {
    user: String,
}

fn main() {
    let cfg = EmitterConfig::builder().max_listeners(1).build();
    let session = Session {
        events: EventEmitter::with_config(&cfg),
        user: "ferris".to_string(),
    };
    session
        .on("login", Listener::new(|u: &String| {
            assert_eq!(u, "ferris");
            Ok(())
        }))
        .unwrap();
    session.emit("login", &session.user).unwrap();
    assert_eq!(session.get_max_listeners(), 1);
    let _ = format!("{:?}", session);
}
