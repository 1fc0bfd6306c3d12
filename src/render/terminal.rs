use super::escape_xml;
use crate::theme::Theme;

/// Opens the document and draws the window chrome: border, background,
/// title bar with traffic lights and a centered title.
///
/// `title` is raw text. Everything drawn afterwards sits inside a group
/// carrying the theme's font stack; [`close_document`] closes both.
pub(super) fn open_document(
    svg: &mut String,
    theme: &Theme,
    width: u32,
    height: u32,
    title_bar: u32,
    title: &str,
) {
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"{width}\" height=\"{height}\" fill=\"{}\" rx=\"6\" ry=\"6\"/>",
        theme.window_border
    ));
    svg.push_str(&format!(
        "<rect x=\"1\" y=\"1\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"5\" ry=\"5\"/>",
        width.saturating_sub(2),
        height.saturating_sub(2),
        theme.background
    ));
    svg.push_str(&format!(
        "<rect x=\"1\" y=\"1\" width=\"{}\" height=\"{title_bar}\" fill=\"{}\" rx=\"5\" ry=\"5\"/>",
        width.saturating_sub(2),
        theme.header_background
    ));
    svg.push_str(&format!(
        "<g transform=\"translate(20, {})\">\
<circle cx=\"0\" cy=\"0\" r=\"6\" fill=\"#FF5F56\" stroke=\"#E0443E\" stroke-width=\"0.5\"/>\
<circle cx=\"20\" cy=\"0\" r=\"6\" fill=\"#FFBD2E\" stroke=\"#DEA123\" stroke-width=\"0.5\"/>\
<circle cx=\"40\" cy=\"0\" r=\"6\" fill=\"#27C93F\" stroke=\"#1AAB29\" stroke-width=\"0.5\"/>\
</g>",
        title_bar as f32 / 2.0
    ));
    svg.push_str(&format!("<g font-family=\"{}\">", theme.font_family));
    svg.push_str(&format!(
        "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" fill=\"{}\" font-size=\"13\" font-weight=\"bold\">{}</text>",
        width as f32 / 2.0,
        title_bar as f32 / 2.0 + 5.0,
        theme.title_text,
        escape_xml(title)
    ));
}

pub(super) fn close_document(svg: &mut String) {
    svg.push_str("</g></svg>");
}

/// Shell prompt `user@42:~$ command` with its baseline at (`x`, `y`).
pub(super) fn prompt(
    svg: &mut String,
    theme: &Theme,
    x: u32,
    y: u32,
    user: &str,
    command: &str,
    font_size: u32,
) {
    svg.push_str(&format!(
        "<text x=\"{x}\" y=\"{y}\" font-size=\"{font_size}\">\
<tspan fill=\"{}\">{}</tspan>\
<tspan fill=\"{}\">@42:</tspan>\
<tspan fill=\"{}\">~$</tspan>\
<tspan dx=\"8\" fill=\"{}\">{}</tspan></text>",
        theme.prompt_user,
        escape_xml(user),
        theme.prompt_host,
        theme.prompt_path,
        theme.command_text,
        escape_xml(command)
    ));
}

pub(super) fn hline(svg: &mut String, x1: u32, x2: u32, y: u32, stroke: &str, extra: &str) {
    svg.push_str(&format!(
        "<line x1=\"{x1}\" y1=\"{y}\" x2=\"{x2}\" y2=\"{y}\" stroke=\"{stroke}\" stroke-width=\"1\"{extra}/>"
    ));
}

/// Comment-style section header such as `/* 42cursus */`.
pub(super) fn section_comment(
    svg: &mut String,
    x: u32,
    y: u32,
    label: &str,
    fill: &str,
    font_size: u32,
) {
    svg.push_str(&format!(
        "<text x=\"{x}\" y=\"{y}\" font-size=\"{font_size}\" font-weight=\"bold\" fill=\"{fill}\">/* {} */</text>",
        escape_xml(label)
    ));
}
