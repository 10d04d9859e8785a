use crate::config::LayoutConfig;
#[cfg(feature = "png")]
use crate::config::RenderConfig;
use crate::format::ArrowHead;
use crate::layout::{Layout, NodeLayout};
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

pub fn render_svg(layout: &Layout, theme: &Theme, config: &LayoutConfig) -> String {
    let mut svg = String::new();
    let width = layout.width.max(200.0);
    let height = layout.height.max(200.0);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));

    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    // Hollow arrowheads, placed at the `to` end of a link only.
    svg.push_str("<defs>");
    svg.push_str(&format!(
        "<marker id=\"arrow-generalization\" viewBox=\"0 0 12 12\" refX=\"11\" refY=\"6\" markerWidth=\"14\" markerHeight=\"14\" orient=\"auto\"><path d=\"M 1 1 L 11 6 L 1 11 z\" fill=\"{}\" stroke=\"{}\"/></marker>",
        theme.arrow_fill, theme.line_color
    ));
    svg.push_str(&format!(
        "<marker id=\"arrow-aggregation\" viewBox=\"0 0 18 10\" refX=\"17\" refY=\"5\" markerWidth=\"20\" markerHeight=\"12\" orient=\"auto\"><path d=\"M 1 5 L 9 1 L 17 5 L 9 9 z\" fill=\"{}\" stroke=\"{}\"/></marker>",
        theme.arrow_fill, theme.line_color
    ));
    svg.push_str("</defs>");

    for edge in &layout.edges {
        let d = points_to_path(&edge.points);
        let marker = match edge.arrow_head {
            ArrowHead::Triangle => " marker-end=\"url(#arrow-generalization)\"",
            ArrowHead::StretchedDiamond => " marker-end=\"url(#arrow-aggregation)\"",
            ArrowHead::None => "",
        };
        svg.push_str(&format!(
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.4\"{}/>",
            d, theme.line_color, marker
        ));
    }

    for node in layout.nodes.values() {
        svg.push_str(&class_box_svg(node, theme, config));
    }

    svg.push_str("</svg>");
    svg
}

fn class_box_svg(node: &NodeLayout, theme: &Theme, config: &LayoutConfig) -> String {
    let mut svg = String::new();

    svg.push_str(&format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.4\"/>",
        node.x, node.y, node.width, node.height, theme.class_fill, theme.class_border
    ));

    // Header: class name, bold, centered.
    let center_x = node.x + node.width / 2.0;
    let header_baseline = node.y + node.header_height / 2.0 + theme.header_font_size * 0.35;
    svg.push_str(&format!(
        "<text x=\"{center_x:.2}\" y=\"{header_baseline:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" font-weight=\"bold\" fill=\"{}\">{}</text>",
        escape_xml(&theme.font_family),
        theme.header_font_size,
        theme.text_color,
        escape_xml(&node.name)
    ));

    let properties_top = node.y + node.header_height;
    let properties_height =
        node.property_lines.len() as f32 * node.line_height + 2.0 * config.node_padding_y;
    let methods_top = properties_top + properties_height;

    // Compartment separators.
    for separator_y in [properties_top, methods_top] {
        svg.push_str(&format!(
            "<line x1=\"{:.2}\" y1=\"{separator_y:.2}\" x2=\"{:.2}\" y2=\"{separator_y:.2}\" stroke=\"{}\" stroke-width=\"1\"/>",
            node.x,
            node.x + node.width,
            theme.class_border
        ));
    }

    for (index, label) in node.property_lines.iter().enumerate() {
        svg.push_str(&member_row_svg(
            node,
            properties_top,
            index,
            label,
            theme,
            config,
        ));
    }
    for (index, label) in node.method_lines.iter().enumerate() {
        svg.push_str(&member_row_svg(node, methods_top, index, label, theme, config));
    }

    svg
}

fn member_row_svg(
    node: &NodeLayout,
    compartment_top: f32,
    index: usize,
    label: &crate::format::MemberLabel,
    theme: &Theme,
    config: &LayoutConfig,
) -> String {
    let text_x = node.x + config.node_padding_x;
    let name_x = text_x + config.visibility_column_width;
    let baseline = compartment_top
        + config.node_padding_y
        + index as f32 * node.line_height
        + theme.font_size * 0.9;
    let underline = if label.underline {
        " text-decoration=\"underline\""
    } else {
        ""
    };
    format!(
        "<text x=\"{text_x:.2}\" y=\"{baseline:.2}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\"><tspan>{}</tspan><tspan x=\"{name_x:.2}\"{underline}>{}</tspan><tspan>{}</tspan></text>",
        escape_xml(&theme.font_family),
        theme.font_size,
        theme.text_color,
        escape_xml(&label.prefix),
        escape_xml(&label.name),
        escape_xml(&label.suffix)
    )
}

fn points_to_path(points: &[(f32, f32)]) -> String {
    if points.is_empty() {
        return String::new();
    }
    let mut d = String::new();
    d.push_str(&format!("M {:.2} {:.2}", points[0].0, points[0].1));
    for point in points.iter().skip(1) {
        d.push_str(&format!(" L {:.2} {:.2}", point.0, point.1));
    }
    d
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Ubuntu Mono".to_string();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .unwrap_or(usvg::Size::from_wh(800.0, 600.0).unwrap());

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
