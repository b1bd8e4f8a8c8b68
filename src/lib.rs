#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod diagram;
pub mod ir;
pub mod layout;
pub mod measure;
pub mod schema;
pub mod serializer;
pub mod svg;

use wasm_bindgen::prelude::*;

use config::Config;
use diagram::{Diagram, DiagramOptions, build_diagram};
use layout::LayoutStrategy;
use schema::{SchemaError, parse_schema};
use svg::SvgRenderer;

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Parse `source` and lay it out.
pub fn diagram_from_source(
    source: &str,
    options: &DiagramOptions,
    config: &Config,
) -> Result<Diagram, SchemaError> {
    let schema = parse_schema(source)?;
    Ok(build_diagram(&schema, options, config))
}

fn wasm_diagram(
    source: &str,
    layout: Option<String>,
    show_columns: Option<bool>,
) -> Result<Diagram, String> {
    let options = DiagramOptions {
        strategy: layout
            .as_deref()
            .map(LayoutStrategy::from_name)
            .unwrap_or(LayoutStrategy::Grid),
        show_detail: show_columns.unwrap_or(true),
        ..DiagramOptions::default()
    };
    diagram_from_source(source, &options, &Config::default()).map_err(|e| e.to_string())
}

/// Render a schema document to SVG
#[wasm_bindgen(js_name = "erdToSvg")]
pub fn render_erd(
    source: &str,
    layout: Option<String>,
    show_columns: Option<bool>,
) -> Result<String, String> {
    let diagram = wasm_diagram(source, layout, show_columns)?;
    Ok(SvgRenderer::default().render(&diagram))
}

/// Lay out a schema document and return nodes and routed edges as JSON
#[wasm_bindgen(js_name = "erdToJson")]
pub fn layout_erd(
    source: &str,
    layout: Option<String>,
    show_columns: Option<bool>,
) -> Result<String, String> {
    let diagram = wasm_diagram(source, layout, show_columns)?;
    serializer::to_json(&diagram).map_err(|e| e.to_string())
}

/// Names accepted by the `layout` argument
#[wasm_bindgen(js_name = "layoutStrategies")]
pub fn layout_strategies() -> js_sys::Array {
    LayoutStrategy::ALL
        .iter()
        .map(|s| JsValue::from_str(s.name()))
        .collect()
}
