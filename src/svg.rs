//! Writes a `Scene` as a standalone SVG document.

use crate::arrow::{Arrow, EdgeShape};
use crate::geometry::Point;
use crate::render::{DrawCommand, Scene};
use std::f64::consts::PI;
use std::fmt::Write;

const GRID_COLOR: &str = "#e9e9e9";
const STATE_COLOR: &str = "#111";
const STATE_LABEL_COLOR: &str = "#fff";
const EDGE_COLOR: &str = "#111";
const PREVIEW_COLOR: &str = "#888";
const BACKGROUND_COLOR: &str = "#fff";

/// Serializes the scene. Coordinates stay in model space, the scene transform is applied by
/// a group `transform` attribute and the view box covers the cleared region.
pub fn to_svg(scene: &Scene) -> Result<String, std::fmt::Error> {
    let t = scene.transform;
    let top_left = t.apply(Point::new(scene.extent.x, scene.extent.y));
    let bottom_right = t.apply(Point::new(scene.extent.xx, scene.extent.yy));
    let width = bottom_right.x - top_left.x;
    let height = bottom_right.y - top_left.y;

    let mut svg = String::new();
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{:.0}" height="{:.0}" viewBox="{:.1} {:.1} {:.1} {:.1}" font-family="Arial, sans-serif">"#,
        width, height, top_left.x, top_left.y, width, height
    )?;
    writeln!(
        svg,
        r#"  <g transform="matrix({z} 0 0 {z} {:.3} {:.3})">"#,
        t.tx * t.zoom,
        t.ty * t.zoom,
        z = t.zoom
    )?;

    for command in &scene.commands {
        match command {
            DrawCommand::Clear(rect) => writeln!(
                svg,
                r#"    <rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}" />"#,
                rect.x,
                rect.y,
                rect.width(),
                rect.height(),
                BACKGROUND_COLOR
            )?,
            DrawCommand::GridLine { from, to } => writeln!(
                svg,
                r#"    <line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="0.8" />"#,
                from.x, from.y, to.x, to.y, GRID_COLOR
            )?,
            DrawCommand::State { id, center, radius } => {
                writeln!(
                    svg,
                    r#"    <circle cx="{:.1}" cy="{:.1}" r="{:.1}" fill="{}" />"#,
                    center.x, center.y, radius, STATE_COLOR
                )?;
                writeln!(
                    svg,
                    r#"    <text x="{:.1}" y="{:.1}" fill="{}" font-size="40" font-weight="bold" text-anchor="middle" dominant-baseline="middle">{}</text>"#,
                    center.x, center.y, STATE_LABEL_COLOR, id
                )?;
            }
            DrawCommand::Edge { arrow, .. } => write_edge(&mut svg, arrow)?,
            DrawCommand::Preview { from, to } => writeln!(
                svg,
                r#"    <line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="2" stroke-dasharray="6 4" />"#,
                from.x, from.y, to.x, to.y, PREVIEW_COLOR
            )?,
        }
    }

    svg.push_str("  </g>\n</svg>\n");
    Ok(svg)
}

fn write_edge(svg: &mut String, arrow: &Arrow) -> std::fmt::Result {
    writeln!(
        svg,
        r#"    <path d="{}" fill="none" stroke="{}" stroke-width="2" />"#,
        path_data(&arrow.shape),
        EDGE_COLOR
    )?;

    let head = arrow.head;
    writeln!(
        svg,
        r#"    <polygon points="{:.1},{:.1} {:.1},{:.1} {:.1},{:.1}" fill="{}" />"#,
        head.tip.x, head.tip.y, head.left.x, head.left.y, head.right.x, head.right.y, EDGE_COLOR
    )?;
    writeln!(
        svg,
        r#"    <text x="{:.1}" y="{:.1}" fill="{}" font-size="14" text-anchor="middle" dominant-baseline="middle">{}</text>"#,
        arrow.label_pos.x,
        arrow.label_pos.y,
        EDGE_COLOR,
        escape_xml(&arrow.label)
    )
}

fn path_data(shape: &EdgeShape) -> String {
    match *shape {
        EdgeShape::Line { start, end } => {
            format!("M{:.1},{:.1} L{:.1},{:.1}", start.x, start.y, end.x, end.y)
        }
        EdgeShape::Curve {
            start,
            control,
            end,
        } => format!(
            "M{:.1},{:.1} Q{:.1},{:.1} {:.1},{:.1}",
            start.x, start.y, control.x, control.y, end.x, end.y
        ),
        EdgeShape::Loop {
            center,
            radius,
            start_angle,
            end_angle,
            ..
        } => {
            let start = center + Point::from_angle(start_angle) * radius;
            let end = center + Point::from_angle(end_angle) * radius;
            let large_arc = u8::from(end_angle - start_angle > PI);
            format!(
                "M{:.1},{:.1} A{:.1},{:.1} 0 {} 1 {:.1},{:.1}",
                start.x, start.y, radius, radius, large_arc, end.x, end.y
            )
        }
    }
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphModel;
    use crate::render::render;
    use crate::viewport::{RenderBounds, Viewport};

    fn scene() -> Scene {
        let mut graph = GraphModel::new();
        graph.add_state(Point::new(100.0, 100.0));
        graph.add_state(Point::new(300.0, 100.0));
        graph.connect(0, 1);
        graph.connect(1, 0);
        graph.connect(1, 1);

        let viewport = Viewport::new(400.0, 300.0);
        let mut bounds = RenderBounds::new(viewport.viewport_rect());
        render(&graph, &viewport, &mut bounds, None)
    }

    #[test]
    fn test_document_structure() {
        let svg = to_svg(&scene()).unwrap();

        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(svg.ends_with("</svg>\n"));
        assert_eq!(svg.matches("<circle").count(), 2);
        assert_eq!(svg.matches("<polygon").count(), 3);
        assert!(svg.contains(GRID_COLOR));
        assert!(svg.contains(">0,0/H</text>"));
    }

    #[test]
    fn test_edge_paths() {
        let svg = to_svg(&scene()).unwrap();

        // Two opposite curves between the states and one arc for the loop.
        assert_eq!(svg.matches(" Q").count(), 2);
        assert_eq!(svg.matches(" A").count(), 1);
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b & \"c\">"), "a&lt;b &amp; &quot;c&quot;&gt;");
    }
}
