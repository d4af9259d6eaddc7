use anyhow::Result;
use emittable::{Emittable, EmitterConfig, EventEmitter, Listener, TracingWarningSink};
use emittable_macros::event_emittable;
use std::cell::Cell;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy)]
enum Reading {
    Celsius(f64),
}

#[event_emittable(payload = Reading, default = false)]
struct Thermometer {
    name: &'static str,
    last: Cell<f64>,
}

impl Thermometer {
    fn new(name: &'static str, config: &EmitterConfig) -> Self {
        Self {
            emitter: EventEmitter::with_config(config),
            name,
            last: Cell::new(0.0),
        }
    }

    fn record(&self, celsius: f64) -> Result<()> {
        self.last.set(celsius);
        self.emit("reading", &Reading::Celsius(celsius))?;
        if celsius > 30.0 {
            self.emit("overheat", &Reading::Celsius(celsius))?;
        }
        Ok(())
    }
}

#[event_emittable]
struct Doorbell {
    rings: Cell<u32>,
}

impl Doorbell {
    fn ring(&self) -> Result<bool> {
        self.rings.set(self.rings.get() + 1);
        Ok(self.emit("ring", &())?)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = EmitterConfig::builder()
        .max_listeners(2)
        .warning_sink(Rc::new(TracingWarningSink))
        .build();

    let kitchen = Thermometer::new("kitchen", &config);
    let garage = Thermometer::new("garage", &config);

    let log_reading = Listener::new(|r: &Reading| {
        tracing::info!(reading = ?r, "reading");
        Ok(())
    });
    kitchen
        .on("reading", log_reading.clone())?
        .once("overheat", Listener::new(|r: &Reading| {
            let Reading::Celsius(celsius) = *r;
            tracing::warn!(celsius = celsius, "overheat, notifying once");
            Ok(())
        }))?;
    garage.on("reading", log_reading.clone())?;

    kitchen.record(21.5)?;
    kitchen.record(31.0)?;
    kitchen.record(33.0)?;
    garage.record(12.0)?;

    // 第三个监听器触发一次容量告警
    for _ in 0..2 {
        kitchen.on("reading", Listener::new(|_: &Reading| Ok(())))?;
    }
    tracing::info!(
        name = kitchen.name,
        last = kitchen.last.get(),
        listeners = kitchen.listener_count("reading"),
        events = ?kitchen.event_names(),
        "kitchen thermometer"
    );

    kitchen.remove_listener("reading", &log_reading);
    kitchen.remove_all_listeners(None);
    tracing::info!(name = garage.name, emitter = ?garage.emitter(), "garage thermometer");

    let bell = Doorbell::default();
    let heard = Rc::new(Cell::new(0));
    let h = heard.clone();
    bell.on("ring", Listener::new(move |_: &()| {
        h.set(h.get() + 1);
        Ok(())
    }))?;
    bell.ring()?;
    bell.ring()?;

    let other = Doorbell::default();
    let delivered = other.ring()?;
    tracing::info!(
        heard = heard.get(),
        rings = bell.rings.get() + other.rings.get(),
        delivered = delivered,
        "doorbells"
    );

    Ok(())
}
