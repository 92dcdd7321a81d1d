//! SVG output for a drawable arrow
//!
//! Produces the markup the browser element places in its shadow root. The
//! viewBox matches the host's current size, which the caller measures.

use super::path::{fmt_num, DrawableArrow, RenderStyle};

/// SVG markup generator
pub struct SvgRenderer;

impl SvgRenderer {
    pub fn render(drawable: &DrawableArrow, width: f64, height: f64, style: &RenderStyle) -> String {
        let mut body = String::new();

        if let Some(dot) = drawable.start_dot {
            body.push_str(&format!(
                "  <circle cx=\"{}\" cy=\"{}\" r=\"{}\" />\n",
                fmt_num(dot.center.x),
                fmt_num(dot.center.y),
                fmt_num(dot.radius)
            ));
        }

        body.push_str(&format!(
            "  <path d=\"{}\" fill=\"none\" />\n",
            drawable.curve.path_data()
        ));

        let points: Vec<String> = drawable
            .head
            .iter()
            .map(|p| format!("{},{}", fmt_num(p.x), fmt_num(p.y)))
            .collect();
        body.push_str(&format!("  <polygon points=\"{}\" />\n", points.join(" ")));

        Self::wrap(&body, width, height, style)
    }

    /// An empty canvas, for when there is nothing to connect
    pub fn render_empty(width: f64, height: f64, style: &RenderStyle) -> String {
        Self::wrap("", width, height, style)
    }

    fn wrap(body: &str, width: f64, height: f64, style: &RenderStyle) -> String {
        let (w, h) = (fmt_num(width.max(0.0)), fmt_num(height.max(0.0)));
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {w} {h}\" style=\"width: {w}px; height: {h}px;\" stroke=\"{}\" fill=\"{}\" stroke-width=\"{}\">\n{}</svg>",
            escape_attr(&style.stroke),
            escape_attr(&style.fill),
            fmt_num(style.stroke_width),
            body
        )
    }
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::geometry::Point;
    use crate::renderers::path::PathRenderer;
    use crate::solver::Arrow;

    fn drawable() -> DrawableArrow {
        PathRenderer::default().render(&Arrow {
            start: Point::new(0.0, 0.0),
            control: Point::new(50.0, 0.0),
            end: Point::new(100.0, 0.0),
            end_angle: 0.0,
            start_angle: 0.0,
            center_angle: 0.0,
        })
    }

    #[test]
    fn test_markup_contains_curve_head_and_dot() {
        let svg = SvgRenderer::render(&drawable(), 200.0, 80.0, &RenderStyle::default());

        assert!(svg.starts_with("<svg "));
        assert!(svg.contains("viewBox=\"0 0 200 80\""));
        assert!(svg.contains("style=\"width: 200px; height: 80px;\""));
        assert!(svg.contains("<circle cx=\"0\" cy=\"0\" r=\"4\" />"));
        assert!(svg.contains("<path d=\"M0,0 Q50,0 100,0\" fill=\"none\" />"));
        assert!(svg.contains("<polygon points=\"100,-6 112,0 100,6\" />"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn test_style_attributes_are_escaped() {
        let style = RenderStyle {
            stroke: "url(\"#g\")".to_string(),
            ..Default::default()
        };
        let svg = SvgRenderer::render_empty(10.0, 10.0, &style);
        assert!(svg.contains("stroke=\"url(&quot;#g&quot;)\""));
        assert!(!svg.contains("<path"));
    }
}
