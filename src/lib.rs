//! Cat Arcade core crate.
//!
//! Two mini-games overlaid on an arbitrary web page: Cat Parade (click the
//! running cats, dodge the trolls) and Cat Asteroids (fly, shoot, survive the
//! boss). Both run on the shared loop in [`core`]; [`web`] binds them to the
//! DOM for the browser extension.

use wasm_bindgen::prelude::*;

pub mod asteroids;
pub mod core;
pub mod parade;
pub mod web;

pub use asteroids::{AsteroidsConfig, CatAsteroids};
pub use parade::{CatParade, ParadeConfig};
pub use web::CatArcade;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    #[cfg(feature = "console_log")]
    web::init_console_logging(tracing::Level::INFO);
}
