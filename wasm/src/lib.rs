use fortytwo_widgets::{Theme, WidgetKind, WidgetOptions, parse_profile, render_widget};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WidgetRenderOptions {
    theme: Option<String>,
    width: Option<u32>,
    max_skills: Option<usize>,
    max_projects: Option<usize>,
    include_piscine: Option<bool>,
    level: Option<f64>,
    footer_note: Option<String>,
}

fn build_widget_options(options: &WidgetRenderOptions) -> WidgetOptions {
    let defaults = WidgetOptions::default();
    WidgetOptions {
        width: options.width.unwrap_or(defaults.width),
        max_skills: options.max_skills.unwrap_or(defaults.max_skills),
        max_projects: options.max_projects.unwrap_or(defaults.max_projects),
        include_piscine: options.include_piscine.unwrap_or(defaults.include_piscine),
        level_override: options.level,
        footer_note: options.footer_note.clone(),
        ..defaults
    }
}

fn render(kind: &str, profile_json: &str, options: WidgetRenderOptions) -> Result<String, String> {
    let profile = parse_profile(profile_json).map_err(|error| error.to_string())?;
    let kind = WidgetKind::from_token(kind).unwrap_or(WidgetKind::Skills);
    let theme = Theme::resolve(options.theme.as_deref().unwrap_or("dark"));
    Ok(render_widget(kind, &profile, &theme, &build_widget_options(&options)))
}

/// Renders `kind` (skills, projects, student or badge) for a profile JSON document.
#[wasm_bindgen]
pub fn render_widget_svg(
    kind: &str,
    profile_json: &str,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    let options = match options_json {
        Some(raw_options) => serde_json::from_str::<WidgetRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?,
        None => WidgetRenderOptions::default(),
    };
    render(kind, profile_json, options).map_err(|error| JsValue::from_str(&error))
}
