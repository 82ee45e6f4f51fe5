use stmd::{HtmlRenderer, RenderOptions, parse as stmd_parse};
use wasm_bindgen::prelude::*;

fn build_options(soft_break: Option<String>) -> RenderOptions {
    RenderOptions {
        soft_break: soft_break.unwrap_or_else(|| "\n".to_string()),
        ..RenderOptions::default()
    }
}

#[wasm_bindgen]
pub fn parse(markdown: &str, soft_break: Option<String>) -> String {
    HtmlRenderer::new(build_options(soft_break)).render(&stmd_parse(markdown))
}

#[wasm_bindgen(js_name = "parseToAst")]
pub fn parse_to_ast(markdown: &str) -> String {
    let doc = stmd_parse(markdown);
    serde_json::to_string(&doc).unwrap_or_default()
}
