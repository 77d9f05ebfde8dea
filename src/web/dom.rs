//! DOM presentation sink: every entity is an absolutely positioned element
//! inside the game area; feedback becomes short-lived overlay elements.

use std::collections::HashMap;

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

use crate::core::entity::EntityId;
use crate::core::geom::Vec2;
use crate::core::host::{Feedback, HostError, HudLine, Pose, PresentationSink, Sprite};

use super::{js_reason, performance_now};

/// Text overlay derived from a feedback event.
#[derive(Clone, Debug, PartialEq)]
pub struct Overlay {
    pub text: String,
    pub class: String,
    /// Anchor in play-field pixels; `None` centres the overlay.
    pub at: Option<Vec2>,
    /// `None` keeps the overlay until the sink is cleared.
    pub ttl_ms: Option<f64>,
}

impl Overlay {
    fn new(text: impl Into<String>, class: impl Into<String>, at: Option<Vec2>, ttl_ms: Option<f64>) -> Self {
        Self { text: text.into(), class: class.into(), at, ttl_ms }
    }
}

/// Map a feedback event to the overlay that shows it. Shake and flash act on
/// the game area itself and have no overlay.
pub fn overlay_for(fx: &Feedback) -> Option<Overlay> {
    let o = match fx {
        Feedback::PointPopup { at, points, multiplier, class } => {
            let tag = match *class {
                "rare-cat" => " ✨RARE✨",
                "speed-cat" => " ⚡FAST⚡",
                "giant-cat" => " 🔵GIANT🔵",
                _ => "",
            };
            let mut text = format!("+{points}{tag}");
            if *multiplier > 1 {
                text.push_str(&format!(" ({multiplier}x)"));
            }
            Overlay::new(text, format!("point-popup {class}"), Some(*at), Some(1500.0))
        }
        Feedback::PenaltyPopup { at, penalty } => {
            Overlay::new(format!("-{penalty} GOTCHA!"), "point-popup troll-penalty", Some(*at), Some(2000.0))
        }
        Feedback::Particles { at, class } => Overlay::new("✨", format!("particles {class}"), Some(*at), Some(800.0)),
        Feedback::ScreenFlash { class } => Overlay::new("", format!("screen-flash {class}"), None, Some(300.0)),
        Feedback::ComboBurst { combo } => Overlay::new(format!("{combo}x COMBO!"), "combo-popup", None, Some(2000.0)),
        Feedback::Firework { at } => Overlay::new("🎆", "firework", Some(*at), Some(1000.0)),
        Feedback::LevelUp { level } => {
            Overlay::new(format!("🎉 LEVEL UP! 🎉 Level {level}"), "level-up", None, Some(3000.0))
        }
        Feedback::BossWarning => Overlay::new("⚠️ WARNING: BOSS APPROACHING ⚠️", "boss-warning", None, Some(3000.0)),
        Feedback::BossArrived { hp } => Overlay::new(format!("BOSS HP {hp}"), "boss-arrived", None, Some(1500.0)),
        Feedback::BossDefeated { bonus } => {
            Overlay::new(format!("BOSS DEFEATED! +{bonus}"), "boss-defeated", None, Some(2500.0))
        }
        Feedback::LifeLost { lives } => Overlay::new(format!("💔 {lives} left"), "life-lost", None, Some(1000.0)),
        Feedback::TimeUp => Overlay::new("⏰ TIME'S UP! ⏰", "time-up", None, Some(2000.0)),
        Feedback::GameOver => Overlay::new("GAME OVER", "game-over", None, None),
        Feedback::BossHit { .. } | Feedback::ScreenShake { .. } | Feedback::Flash { .. } => return None,
    };
    Some(o)
}

pub struct DomSink {
    doc: Document,
    area: HtmlElement,
    hud: Element,
    sprites: HashMap<EntityId, HtmlElement>,
    overlays: Vec<(Element, Option<f64>)>,
}

impl DomSink {
    /// Bind to the game area element and add a HUD line to it.
    pub fn attach(doc: &Document, area: HtmlElement) -> Result<Self, HostError> {
        let hud = doc.create_element("div").map_err(dom_err)?;
        hud.set_class_name("arcade-hud");
        hud.set_attribute("style", "position:absolute; top:8px; left:12px; z-index:500; pointer-events:none;")
            .map_err(dom_err)?;
        area.append_child(&hud).map_err(dom_err)?;
        Ok(Self { doc: doc.clone(), area, hud, sprites: HashMap::new(), overlays: Vec::new() })
    }

    fn sprite(&self, id: EntityId) -> Result<&HtmlElement, HostError> {
        self.sprites.get(&id).ok_or_else(|| HostError::Dom(format!("no element for entity {}", id.0)))
    }

    fn expire_overlays(&mut self, now: f64) {
        self.overlays.retain(|(el, until)| match until {
            Some(t) if *t <= now => {
                el.remove();
                false
            }
            _ => true,
        });
    }

    fn area_style(&self, property: &str, value: &str) -> Result<(), HostError> {
        self.area.style().set_property(property, value).map_err(dom_err)
    }
}

fn dom_err(e: wasm_bindgen::JsValue) -> HostError {
    HostError::Dom(js_reason(e))
}

fn set_pose(el: &HtmlElement, pose: Pose) -> Result<(), HostError> {
    let style = el.style();
    style.set_property("left", &format!("{}px", pose.pos.x)).map_err(dom_err)?;
    style.set_property("top", &format!("{}px", pose.pos.y)).map_err(dom_err)?;
    style.set_property("transform", &format!("rotate({}deg)", pose.rotation)).map_err(dom_err)
}

impl PresentationSink for DomSink {
    fn spawn(&mut self, id: EntityId, sprite: &Sprite, pose: Pose) -> Result<(), HostError> {
        let el: HtmlElement = self.doc.create_element("div").map_err(dom_err)?.dyn_into().map_err(|_| {
            HostError::Dom("created element is not an HtmlElement".into())
        })?;
        el.set_class_name(sprite.class);
        el.set_text_content(Some(sprite.glyph));
        let style = format!(
            "position:absolute; width:{w}px; height:{h}px; font-size:{fs}px; line-height:{h}px; text-align:center; user-select:none; pointer-events:none;",
            w = sprite.size.w,
            h = sprite.size.h,
            fs = sprite.size.w.min(sprite.size.h),
        );
        el.set_attribute("style", &style).map_err(dom_err)?;
        set_pose(&el, pose)?;
        self.area.append_child(&el).map_err(dom_err)?;
        if let Some(old) = self.sprites.insert(id, el) {
            old.remove();
        }
        Ok(())
    }

    fn place(&mut self, id: EntityId, pose: Pose) -> Result<(), HostError> {
        set_pose(self.sprite(id)?, pose)
    }

    fn despawn(&mut self, id: EntityId) -> Result<(), HostError> {
        if let Some(el) = self.sprites.remove(&id) {
            el.remove();
        }
        Ok(())
    }

    fn feedback(&mut self, fx: &Feedback) -> Result<(), HostError> {
        match fx {
            Feedback::ScreenShake { offset } => {
                return self.area_style("transform", &format!("translate({}px, {}px)", offset.x, offset.y));
            }
            Feedback::Flash { opacity } => {
                let value = if *opacity > 0.0 {
                    format!("inset 0 0 100px rgba(255, 255, 255, {opacity})")
                } else {
                    "none".to_string()
                };
                return self.area_style("box-shadow", &value);
            }
            _ => {}
        }
        let Some(overlay) = overlay_for(fx) else {
            return Ok(());
        };
        let el = self.doc.create_element("div").map_err(dom_err)?;
        el.set_class_name(&overlay.class);
        el.set_text_content(Some(&overlay.text));
        let place = match overlay.at {
            Some(at) => format!("left:{}px; top:{}px;", at.x, at.y),
            None => "left:50%; top:40%; transform:translate(-50%, -50%);".to_string(),
        };
        el.set_attribute("style", &format!("position:absolute; {place} z-index:1000; pointer-events:none;"))
            .map_err(dom_err)?;
        self.area.append_child(&el).map_err(dom_err)?;
        let until = overlay.ttl_ms.map(|ttl| performance_now() + ttl);
        self.overlays.push((el, until));
        Ok(())
    }

    fn hud(&mut self, lines: &[HudLine]) -> Result<(), HostError> {
        self.expire_overlays(performance_now());
        let text = lines.iter().map(|l| format!("{}: {}", l.label, l.value)).collect::<Vec<_>>().join("  |  ");
        self.hud.set_text_content(Some(&text));
        Ok(())
    }

    fn clear(&mut self) -> Result<(), HostError> {
        for (_, el) in self.sprites.drain() {
            el.remove();
        }
        for (el, _) in self.overlays.drain(..) {
            el.remove();
        }
        self.hud.set_text_content(None);
        self.area_style("transform", "none")?;
        self.area_style("box-shadow", "none")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_popup_text_carries_tag_and_multiplier() {
        let fx = Feedback::PointPopup { at: Vec2::new(1.0, 2.0), points: 12, multiplier: 2, class: "rare-cat" };
        let o = overlay_for(&fx).unwrap();
        assert_eq!(o.text, "+12 ✨RARE✨ (2x)");
        assert_eq!(o.class, "point-popup rare-cat");
        assert_eq!(o.at, Some(Vec2::new(1.0, 2.0)));
    }

    #[test]
    fn plain_hit_has_no_multiplier_suffix() {
        let fx = Feedback::PointPopup { at: Vec2::ZERO, points: 1, multiplier: 1, class: "cat" };
        assert_eq!(overlay_for(&fx).unwrap().text, "+1");
    }

    #[test]
    fn area_effects_have_no_overlay() {
        assert!(overlay_for(&Feedback::ScreenShake { offset: Vec2::ZERO }).is_none());
        assert!(overlay_for(&Feedback::Flash { opacity: 0.5 }).is_none());
        assert_eq!(overlay_for(&Feedback::GameOver).unwrap().ttl_ms, None);
    }
}
