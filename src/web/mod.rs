//! wasm-bindgen façade. The extension's content script owns the page
//! overlay, forwards input and drives [`CatArcade::frame`] from
//! `requestAnimationFrame`; everything stateful lives in the two engines.

mod audio;
#[cfg(feature = "console_log")]
mod console;
mod dom;

pub use audio::WebAudio;
#[cfg(feature = "console_log")]
pub use console::{ConsoleMakeWriter, init_console_logging};
pub use dom::{DomSink, Overlay, overlay_for};

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement, window};

use crate::asteroids::CatAsteroids;
use crate::core::geom::Field;
use crate::core::host::HostSurface;
use crate::core::input::Key;
use crate::parade::CatParade;

/// Millisecond clock shared with `requestAnimationFrame` timestamps.
pub(crate) fn performance_now() -> f64 {
    window().and_then(|w| w.performance()).map(|p| p.now()).unwrap_or(0.0)
}

pub(crate) fn js_reason(e: JsValue) -> String {
    e.as_string().unwrap_or_else(|| format!("{e:?}"))
}

fn document() -> Result<Document, JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    win.document().ok_or_else(|| JsValue::from_str("no document"))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Game {
    Parade,
    Asteroids,
}

/// One arcade per page overlay. At most one game runs at a time.
#[wasm_bindgen]
pub struct CatArcade {
    container_id: String,
    asset_base: String,
    parade: CatParade,
    asteroids: CatAsteroids,
    active: Option<Game>,
    area: Option<HtmlElement>,
}

#[wasm_bindgen]
impl CatArcade {
    /// `container_id` names the overlay element games render into;
    /// `asset_base` prefixes bundled audio paths.
    #[wasm_bindgen(constructor)]
    pub fn new(container_id: &str, asset_base: &str) -> CatArcade {
        CatArcade {
            container_id: container_id.to_string(),
            asset_base: asset_base.to_string(),
            parade: CatParade::default(),
            asteroids: CatAsteroids::default(),
            active: None,
            area: None,
        }
    }

    /// Replace Cat Parade tunables. Missing keys keep their defaults.
    #[cfg(feature = "serde_json")]
    pub fn configure_parade(&mut self, json: &str) -> Result<(), JsValue> {
        let config = crate::parade::ParadeConfig::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        if self.active == Some(Game::Parade) {
            self.end();
        }
        self.parade = CatParade::new(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(())
    }

    #[cfg(feature = "serde_json")]
    pub fn configure_asteroids(&mut self, json: &str) -> Result<(), JsValue> {
        let config = crate::asteroids::AsteroidsConfig::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        if self.active == Some(Game::Asteroids) {
            self.end();
        }
        self.asteroids = CatAsteroids::new(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(())
    }

    pub fn start_parade(&mut self) -> Result<(), JsValue> {
        self.end();
        let field = self.parade.config().field;
        let host = self.mount(field, "cat-parade-area")?;
        self.parade.start_session(host, performance_now());
        self.active = Some(Game::Parade);
        Ok(())
    }

    pub fn start_asteroids(&mut self) -> Result<(), JsValue> {
        self.end();
        let field = self.asteroids.config().field;
        let host = self.mount(field, "cat-asteroids-area")?;
        self.asteroids.start_session(host, performance_now());
        self.active = Some(Game::Asteroids);
        Ok(())
    }

    /// Tear down whichever game is showing and remove its play area.
    pub fn end(&mut self) {
        match self.active.take() {
            Some(Game::Parade) => self.parade.end_session(),
            Some(Game::Asteroids) => self.asteroids.end_session(),
            None => {}
        }
        if let Some(area) = self.area.take() {
            area.remove();
        }
    }

    /// Advance the active game to `now` (a `requestAnimationFrame` timestamp).
    pub fn frame(&mut self, now: f64) {
        match self.active {
            Some(Game::Parade) => self.parade.advance(now),
            Some(Game::Asteroids) => self.asteroids.advance(now),
            None => {}
        }
    }

    /// Returns true when the key is a game key, so the page should not see it.
    pub fn key_down(&mut self, key: &str) -> bool {
        self.with_key(key, |input, k| input.press(k))
    }

    pub fn key_up(&mut self, key: &str) -> bool {
        self.with_key(key, |input, k| input.release(k))
    }

    /// Pointer click in play-area coordinates.
    pub fn click(&mut self, x: f64, y: f64) {
        if self.active == Some(Game::Parade) {
            if let Some(input) = self.parade.input_mut() {
                input.click(x, y);
            }
        }
    }

    /// Returns the new mute state; false when nothing is running.
    pub fn toggle_mute(&mut self) -> bool {
        let muted = match self.active {
            Some(Game::Parade) => self.parade.toggle_mute(),
            Some(Game::Asteroids) => self.asteroids.toggle_mute(),
            None => None,
        };
        muted.unwrap_or(false)
    }

    /// Debug hook: skip straight to the next boss.
    pub fn force_boss(&mut self) {
        if self.active == Some(Game::Asteroids) {
            self.asteroids.act(|rules, _| rules.force_boss());
        }
    }

    pub fn is_running(&self) -> bool {
        match self.active {
            Some(Game::Parade) => self.parade.is_running(),
            Some(Game::Asteroids) => self.asteroids.is_running(),
            None => false,
        }
    }

    /// JSON snapshot of the active game, or `null` when idle.
    #[cfg(feature = "serde_json")]
    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        let json = match self.active {
            Some(Game::Parade) => serde_json::to_string(&self.parade.snapshot()),
            Some(Game::Asteroids) => serde_json::to_string(&self.asteroids.snapshot()),
            None => Ok("null".to_string()),
        };
        json.map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl CatArcade {
    fn mount(&mut self, field: Field, class: &str) -> Result<HostSurface, JsValue> {
        let doc = document()?;
        let container = doc
            .get_element_by_id(&self.container_id)
            .ok_or_else(|| JsValue::from_str("arcade container not found"))?;
        let area: HtmlElement = doc.create_element("div")?.dyn_into()?;
        area.set_class_name(class);
        area.set_attribute(
            "style",
            &format!(
                "position:relative; width:{}px; height:{}px; overflow:hidden; user-select:none;",
                field.width, field.height
            ),
        )?;
        container.append_child(&area)?;
        let sink = DomSink::attach(&doc, area.clone()).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.area = Some(area);
        Ok(HostSurface::new(Box::new(sink), Box::new(WebAudio::new(self.asset_base.clone()))))
    }

    fn with_key(&mut self, key: &str, f: impl FnOnce(&mut crate::core::input::InputSampler, Key)) -> bool {
        let Some(k) = Key::from_dom_key(key) else {
            return false;
        };
        if self.active != Some(Game::Asteroids) {
            return false;
        }
        match self.asteroids.input_mut() {
            Some(input) => {
                f(input, k);
                true
            }
            None => false,
        }
    }
}

impl Drop for CatArcade {
    fn drop(&mut self) {
        self.end();
    }
}
