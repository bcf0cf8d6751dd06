// Copyright 2026 the Glimmer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Applies controller output to DOM and SVG elements.

use alloc::format;
use alloc::string::String;

use kurbo::Vec2;
use web_sys::{Element, HtmlElement};

use glimmer_core::border::{BorderOutline, DashPattern, StrokeRole, StrokeTarget};
use glimmer_core::fade::FadeStyle;
use glimmer_core::parallax::ParallaxTransform;
use glimmer_core::time::Duration;

/// CSS `transform` for a fade offset.
#[must_use]
pub fn translate_css(offset: Vec2) -> String {
    format!("translate3d({}px, {}px, 0)", offset.x, offset.y)
}

/// CSS `transition` fading opacity and transform over `duration`.
#[must_use]
pub fn fade_transition_css(duration: Duration) -> String {
    let ms = duration.as_millis();
    format!("opacity {ms}ms ease-out, transform {ms}ms ease-out")
}

/// CSS `transform` for a parallax frame.
#[must_use]
pub fn parallax_transform_css(transform: &ParallaxTransform) -> String {
    let (x, y, z) = transform.translation();
    format!("translate3d({x}, {y}px, {z})")
}

/// SVG `stroke-dasharray` for a dash pattern.
#[must_use]
pub fn dasharray_attr(dash: &DashPattern) -> String {
    format!("{} {}", dash.segment, dash.gap)
}

/// `filter` value for a stroke's blur, if any.
#[must_use]
pub fn blur_filter_css(blur: f64) -> Option<String> {
    (blur > 0.0).then(|| format!("blur({blur}px)"))
}

/// `filter` presentation attribute for one stroke. Only the glow is blurred.
#[must_use]
pub fn stroke_filter_attr(outline: &BorderOutline) -> Option<String> {
    match outline.stroke.role {
        StrokeRole::Glow => blur_filter_css(outline.stroke.blur),
        StrokeRole::Solid => None,
    }
}

/// Geometric presentation attributes written for an outline, by name.
///
/// Paint (`stroke`, `fill`, `style`) is left to the markup.
#[must_use]
pub fn outline_attrs(outline: &BorderOutline) -> [(&'static str, String); 7] {
    let radius = format!("{}", outline.corner_radius);
    [
        ("width", format!("{}", outline.size.width)),
        ("height", format!("{}", outline.size.height)),
        ("rx", radius.clone()),
        ("ry", radius),
        ("stroke-width", format!("{}", outline.stroke.width)),
        ("stroke-linecap", String::from("round")),
        ("stroke-dasharray", dasharray_attr(&outline.dash)),
    ]
}

/// Writes [`FadeStyle`] to an element's inline style.
#[derive(Debug, Clone)]
pub struct FadePresenter {
    element: HtmlElement,
}

impl FadePresenter {
    /// Creates a presenter for `element`.
    #[must_use]
    pub fn new(element: HtmlElement) -> Self {
        Self { element }
    }

    /// Returns the styled element.
    #[must_use]
    pub fn element(&self) -> &HtmlElement {
        &self.element
    }

    /// Applies opacity, offset, and transition.
    pub fn apply(&self, style: &FadeStyle) {
        let s = self.element.style();
        let _ = s.set_property("transition", &fade_transition_css(style.duration));
        let _ = s.set_property("opacity", &format!("{}", style.opacity));
        let _ = s.set_property("transform", &translate_css(style.offset));
    }
}

/// Writes [`ParallaxTransform`] to an element's inline style.
#[derive(Debug, Clone)]
pub struct ParallaxPresenter {
    element: HtmlElement,
}

impl ParallaxPresenter {
    /// Creates a presenter for `element`.
    #[must_use]
    pub fn new(element: HtmlElement) -> Self {
        Self { element }
    }

    /// Returns the styled element.
    #[must_use]
    pub fn element(&self) -> &HtmlElement {
        &self.element
    }

    /// Applies the transform and compositor hint.
    pub fn apply(&self, transform: &ParallaxTransform) {
        let s = self.element.style();
        let _ = s.set_property("transform", &parallax_transform_css(transform));
        let _ = s.set_property("will-change", transform.will_change.as_css());
    }
}

/// A [`StrokeTarget`] writing to the attributes of an SVG `<rect>`.
///
/// The rect should carry `fill="none"` and its stroke color, inline or as
/// an attribute; its `style` is never written. Geometry and the glow's
/// `filter` attribute are written here.
#[derive(Debug, Clone)]
pub struct SvgRectStroke {
    rect: Element,
}

impl SvgRectStroke {
    /// Creates a target for `rect`.
    #[must_use]
    pub fn new(rect: Element) -> Self {
        Self { rect }
    }

    /// Returns the target element.
    #[must_use]
    pub fn rect(&self) -> &Element {
        &self.rect
    }

    fn set(&self, name: &str, value: &str) {
        if let Err(err) = self.rect.set_attribute(name, value) {
            log::debug!("setAttribute({name}) failed: {err:?}");
        }
    }
}

impl StrokeTarget for SvgRectStroke {
    fn set_outline(&mut self, outline: &BorderOutline) {
        for (name, value) in outline_attrs(outline) {
            self.set(name, &value);
        }
        match stroke_filter_attr(outline) {
            Some(filter) => self.set("filter", &filter),
            None => {
                let _ = self.rect.remove_attribute("filter");
            }
        }
    }

    fn set_dash_offset(&mut self, offset: f64) {
        self.set("stroke-dashoffset", &format!("{offset}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glimmer_core::border::StrokeStyle;
    use glimmer_core::parallax::{Suppression, WillChange};
    use kurbo::Size;

    #[test]
    fn fade_css() {
        assert_eq!(translate_css(Vec2::new(0.0, 24.0)), "translate3d(0px, 24px, 0)");
        assert_eq!(translate_css(Vec2::ZERO), "translate3d(0px, 0px, 0)");
        assert_eq!(
            fade_transition_css(Duration::from_millis(700)),
            "opacity 700ms ease-out, transform 700ms ease-out"
        );
    }

    #[test]
    fn parallax_css() {
        let transform = ParallaxTransform {
            translate_y: 500.0,
            will_change: WillChange::Transform,
            suppressed: None,
        };
        assert_eq!(parallax_transform_css(&transform), "translate3d(0, 500px, 0)");
        assert_eq!(
            parallax_transform_css(&ParallaxTransform::identity(Suppression::NarrowViewport)),
            "translate3d(0, 0px, 0)"
        );
    }

    #[test]
    fn stroke_attrs() {
        let dash = DashPattern::from_fraction(400.0, 0.25);
        assert_eq!(dasharray_attr(&dash), "100 300");
        assert_eq!(blur_filter_css(4.0).as_deref(), Some("blur(4px)"));
        assert_eq!(blur_filter_css(0.0), None);
    }

    fn outline(stroke: StrokeStyle) -> BorderOutline {
        BorderOutline {
            size: Size::new(100.0, 40.0),
            corner_radius: 20.0,
            path_length: 400.0,
            stroke,
            dash: DashPattern::from_fraction(400.0, 0.5),
        }
    }

    #[test]
    fn outline_leaves_paint_to_markup() {
        for stroke in [StrokeStyle::glow(2.0), StrokeStyle::solid(2.0)] {
            let attrs = outline_attrs(&outline(stroke));
            for (name, _) in &attrs {
                assert!(!matches!(*name, "style" | "stroke" | "fill"), "{name} written");
            }
            assert!(attrs.contains(&("rx", String::from("20"))));
            assert!(attrs.contains(&("stroke-dasharray", String::from("200 200"))));
        }

        assert_eq!(
            stroke_filter_attr(&outline(StrokeStyle::glow(2.0))).as_deref(),
            Some("blur(4px)")
        );
        assert_eq!(stroke_filter_attr(&outline(StrokeStyle::solid(2.0))), None);
    }
}
