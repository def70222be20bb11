//! Browser binding
//!
//! Exposes the factory to JavaScript. The page drives `frame()` from
//! `requestAnimationFrame` and reads back JSON snapshots for its panels.

use wasm_bindgen::prelude::*;

use super::FrameTimer;
use crate::renderer::ConveyorView;
use crate::settings::Settings;
use crate::sim::{ConveyorStatus, FactoryState};
use crate::telemetry::{TelemetryError, TelemetryRecord, TelemetrySink, TelemetrySync};

#[wasm_bindgen(start)]
pub fn start() {
    super::init_logging();
    log::info!("Factory twin loaded");
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Forwards telemetry batches to a JS callback as a JSON array
struct CallbackSink {
    callback: js_sys::Function,
}

impl TelemetrySink for CallbackSink {
    fn send(&mut self, records: &[TelemetryRecord]) -> Result<(), TelemetryError> {
        let json = serde_json::to_string(records)?;
        self.callback
            .call1(&JsValue::NULL, &JsValue::from_str(&json))
            .map(|_| ())
            .map_err(|e| TelemetryError::Rejected(format!("{:?}", e)))
    }
}

/// One factory line owned by the page
#[wasm_bindgen]
pub struct FactoryHandle {
    state: FactoryState,
    view: ConveyorView,
    timer: FrameTimer,
    telemetry: TelemetrySync,
    sink: Option<CallbackSink>,
}

#[wasm_bindgen]
impl FactoryHandle {
    /// Build from optional settings JSON; the seed defaults to the current time
    #[wasm_bindgen(constructor)]
    pub fn new(settings_json: Option<String>) -> Result<FactoryHandle, JsValue> {
        let settings = match settings_json {
            Some(json) => Settings::from_json(&json).map_err(js_err)?,
            None => Settings {
                seed: js_sys::Date::now() as u64,
                ..Settings::default()
            },
        };
        let state = FactoryState::new(&settings).map_err(js_err)?;
        log::info!("Factory initialized with seed: {}", settings.seed);

        Ok(Self {
            state,
            view: ConveyorView::default(),
            timer: FrameTimer::new(),
            telemetry: TelemetrySync::new(settings.telemetry_interval_secs).map_err(js_err)?,
            sink: None,
        })
    }

    pub fn start(&mut self) {
        self.state.start();
    }

    pub fn stop(&mut self) {
        self.state.stop();
    }

    pub fn toggle(&mut self) {
        self.state.toggle();
    }

    /// "running", "stopped" or "jammed"
    #[wasm_bindgen(js_name = setStatus)]
    pub fn set_status(&mut self, status: &str) -> Result<(), JsValue> {
        let status = ConveyorStatus::from_str(status)
            .ok_or_else(|| js_err(format!("unknown conveyor status: {}", status)))?;
        self.state.set_status(status);
        Ok(())
    }

    #[wasm_bindgen(js_name = setSpeed)]
    pub fn set_speed(&mut self, speed: f64) -> Result<(), JsValue> {
        self.state.set_speed_multiplier(speed).map_err(js_err)
    }

    #[wasm_bindgen(js_name = setLogicalPeriod)]
    pub fn set_logical_period(&mut self, period_ms: f64) -> Result<(), JsValue> {
        self.state.set_logical_period_ms(period_ms).map_err(js_err)
    }

    #[wasm_bindgen(js_name = setTicksPerStation)]
    pub fn set_ticks_per_station(&mut self, ticks: u32) -> Result<(), JsValue> {
        self.state.set_ticks_per_station(ticks).map_err(js_err)
    }

    pub fn reset(&mut self) {
        self.state.reset();
        self.telemetry.reset();
    }

    /// Register `callback(json)` to receive telemetry batches
    #[wasm_bindgen(js_name = setTelemetryCallback)]
    pub fn set_telemetry_callback(&mut self, callback: js_sys::Function) {
        self.sink = Some(CallbackSink { callback });
    }

    /// Advance to the animation-frame timestamp and return the render frame
    /// as JSON
    pub fn frame(&mut self, now_ms: f64) -> Result<String, JsValue> {
        let dt = self.timer.delta(now_ms);
        self.state.frame(dt);
        if let Some(sink) = self.sink.as_mut() {
            self.telemetry.poll(dt, &self.state, sink);
        }
        let frame = self.view.frame(dt, &self.state);
        serde_json::to_string(&frame).map_err(js_err)
    }

    /// Call when the page becomes visible again to skip the hidden interval
    #[wasm_bindgen(js_name = resumeTiming)]
    pub fn resume_timing(&mut self) {
        self.timer.reset();
    }

    /// Counters, occupancy, KPIs and defects as JSON
    pub fn snapshot(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.state.snapshot()).map_err(js_err)
    }
}
