use super::{escape_xml, format_level};
use crate::normalize::resolve_level;
use crate::profile::StudentProfile;
use crate::theme::Theme;

pub const BADGE_HEIGHT: u32 = 28;

/// Width reserved for the login, from a fixed per-character advance.
fn login_width(login: &str) -> u32 {
    (login.chars().count() as u32 * 8).max(60)
}

pub fn badge_width(login: &str) -> u32 {
    login_width(login) + 140
}

/// Compact `login | Level: NN.NN` badge.
pub fn generate_badge(login: &str, level: f64, theme_name: &str) -> String {
    draw_badge(login, level, &Theme::resolve(theme_name))
}

/// Badge for a profile, resolving the level the same way the statistics do.
pub fn render_badge(profile: &StudentProfile, theme: &Theme, level_override: Option<f64>) -> String {
    let (level, _) = resolve_level(&profile.cursus_users, level_override);
    draw_badge(&profile.login, level, theme)
}

pub fn draw_badge(login: &str, level: f64, theme: &Theme) -> String {
    let width = badge_width(login);
    let text = if theme.is_dark() { "#FFFFFF" } else { theme.title_text.as_str() };
    let accent = &theme.success;
    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{BADGE_HEIGHT}\" viewBox=\"0 0 {width} {BADGE_HEIGHT}\" fill=\"none\">"
    ));
    svg.push_str(&format!(
        "<rect width=\"{width}\" height=\"{BADGE_HEIGHT}\" rx=\"4\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>",
        theme.background, theme.table_border
    ));
    svg.push_str(&format!(
        "<text x=\"10\" y=\"18\" font-family=\"Arial, sans-serif\" font-size=\"12\" fill=\"{text}\">{}</text>",
        escape_xml(login)
    ));
    svg.push_str(&format!(
        "<text x=\"{}\" y=\"18\" font-family=\"Arial, sans-serif\" font-size=\"12\" fill=\"{accent}\">Level: {}</text>",
        login_width(login) + 20,
        format_level(level)
    ));
    svg.push_str("</svg>");
    svg
}
