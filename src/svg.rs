use std::fmt::Write;

use crate::config::Config;
use crate::diagram::Diagram;
use crate::ir::{Column, Node};
use crate::layout::{Marker, RoutedEdge};
use crate::measure::{NodeMetrics, TextMetrics};

const CORNER_RADIUS: f64 = 8.0;

#[derive(Debug, Clone, Default)]
pub struct SvgRenderer {
    node: NodeMetrics,
    text: TextMetrics,
}

impl SvgRenderer {
    pub fn new(config: &Config) -> Self {
        Self {
            node: config.metrics.clone(),
            text: config.text.clone(),
        }
    }

    pub fn render(&self, diagram: &Diagram) -> String {
        let b = &diagram.bounds;
        let mut svg = String::new();

        writeln!(
            &mut svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="{} {} {} {}">"#,
            b.width, b.height, b.x, b.y, b.width, b.height
        )
        .unwrap();

        writeln!(
            &mut svg,
            r#"<style>
  .entity-bg {{ fill: #fff; stroke: #9ca3af; stroke-width: 1; }}
  .entity-header {{ fill: #f3f4f6; }}
  .entity-name {{ font-family: sans-serif; font-size: 14px; font-weight: bold; fill: #000; }}
  .column-name {{ font-family: sans-serif; font-size: 13px; fill: #000; }}
  .column-type {{ font-family: monospace; font-size: 11px; fill: #000; }}
  .pk {{ font-weight: 600; }}
  .fk {{ font-style: italic; }}
  .separator {{ stroke: #9ca3af; stroke-width: 1; }}
  .edge {{ stroke: #6b7280; stroke-width: 1.5; fill: none; }}
</style>"#
        )
        .unwrap();

        self.render_markers(&mut svg);

        // Edges first so nodes sit on top.
        for edge in &diagram.edges {
            render_edge(&mut svg, edge);
        }

        for node in &diagram.nodes {
            self.render_node(&mut svg, node, diagram.show_detail);
        }

        writeln!(&mut svg, "</svg>").unwrap();
        svg
    }

    fn render_markers(&self, svg: &mut String) {
        writeln!(
            svg,
            r##"<defs>
  <marker id="{}" viewBox="0 0 10 10" refX="9" refY="5" markerWidth="8" markerHeight="8" orient="auto-start-reverse">
    <path d="M 0 0 L 10 5 L 0 10" fill="none" stroke="#6b7280" stroke-width="1.5" />
  </marker>
  <marker id="{}" viewBox="0 0 10 10" refX="1" refY="5" markerWidth="8" markerHeight="8" orient="auto-start-reverse">
    <path d="M 0 0 L 0 10" fill="none" stroke="#6b7280" stroke-width="1.5" />
  </marker>
</defs>"##,
            Marker::Crow.id(),
            Marker::One.id()
        )
        .unwrap();
    }

    fn render_node(&self, svg: &mut String, node: &Node, show_detail: bool) {
        let (x, y, w) = (node.x, node.y, node.width);
        let header_h = self.node.header_height.min(node.height);

        writeln!(svg, r#"<g class="entity" data-table="{}">"#, escape_xml(&node.id)).unwrap();

        writeln!(
            svg,
            r#"<rect class="entity-bg" x="{}" y="{}" width="{}" height="{}" rx="{}" />"#,
            x, y, w, node.height, CORNER_RADIUS
        )
        .unwrap();

        // Rounded top, square bottom.
        writeln!(
            svg,
            r#"<path class="entity-header" d="M {} {} V {} A {r} {r} 0 0 1 {} {} H {} A {r} {r} 0 0 1 {} {} V {} Z" />"#,
            x,
            y + header_h,
            y + CORNER_RADIUS,
            x + CORNER_RADIUS,
            y,
            x + w - CORNER_RADIUS,
            x + w,
            y + CORNER_RADIUS,
            y + header_h,
            r = CORNER_RADIUS
        )
        .unwrap();

        let name = self
            .text
            .truncate(&node.name, w - self.text.padding_x * 2.0);
        writeln!(
            svg,
            r#"<text class="entity-name" x="{}" y="{}" text-anchor="middle" dominant-baseline="middle">{}</text>"#,
            x + w / 2.0,
            y + header_h / 2.0,
            escape_xml(&name)
        )
        .unwrap();

        if show_detail {
            writeln!(
                svg,
                r#"<line class="separator" x1="{}" y1="{}" x2="{}" y2="{}" />"#,
                x,
                y + header_h,
                x + w,
                y + header_h
            )
            .unwrap();

            let columns = node
                .primary_key_columns
                .iter()
                .chain(&node.other_columns);
            for column in columns {
                if let Some(offset) = self.node.row_offset(node, &column.name) {
                    self.render_column(svg, node, column, y + offset);
                }
            }

            if !node.primary_key_columns.is_empty() && !node.other_columns.is_empty() {
                let rows = node.primary_key_columns.len() as f64;
                let line_y = y
                    + self.node.header_height
                    + self.node.section_padding
                    + rows * self.node.row_height
                    + self.node.separator_height / 2.0;
                writeln!(
                    svg,
                    r#"<line class="separator" x1="{}" y1="{}" x2="{}" y2="{}" />"#,
                    x + self.node.section_padding,
                    line_y,
                    x + w - self.node.section_padding,
                    line_y
                )
                .unwrap();
            }
        }

        writeln!(svg, "</g>").unwrap();
    }

    fn render_column(&self, svg: &mut String, node: &Node, column: &Column, row_y: f64) {
        let inner = node.width - self.text.padding_x * 2.0;
        let data_type = self.text.truncate(&column.data_type, inner / 2.0);
        let name_budget = inner - self.text.text_width(&data_type) - self.text.char_width;
        let name = self.text.truncate(&column.name, name_budget);

        let mut class = "column-name".to_string();
        if column.is_primary_key {
            class.push_str(" pk");
        } else if column.is_foreign_key {
            class.push_str(" fk");
        }

        writeln!(
            svg,
            r#"<text class="{}" x="{}" y="{}" dominant-baseline="middle">{}</text>"#,
            class,
            node.x + self.text.padding_x,
            row_y,
            escape_xml(&name)
        )
        .unwrap();

        writeln!(
            svg,
            r#"<text class="column-type" x="{}" y="{}" text-anchor="end" dominant-baseline="middle">{}</text>"#,
            node.x + node.width - self.text.padding_x,
            row_y,
            escape_xml(&data_type)
        )
        .unwrap();
    }
}

fn render_edge(svg: &mut String, edge: &RoutedEdge) {
    let Some((first, rest)) = edge.points.split_first() else {
        return;
    };

    let mut d = format!("M {} {}", first.x, first.y);
    for p in rest {
        write!(&mut d, " L {} {}", p.x, p.y).unwrap();
    }

    writeln!(
        svg,
        r#"<path class="edge" data-link="{}" d="{}" marker-start="url(#{})" marker-end="url(#{})" />"#,
        escape_xml(&edge.id),
        d,
        edge.marker_start.id(),
        edge.marker_end.id()
    )
    .unwrap();
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
