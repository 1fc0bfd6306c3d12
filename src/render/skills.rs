use tracing::debug;

use super::error::{SKILLS_COMMAND, render_error_with};
use super::terminal::{close_document, hline, open_document, prompt, section_comment};
use super::{check_width, escape_xml, format_level};
use crate::error::WidgetError;
use crate::layout::{DEFAULT_WIDTH, TableLayout};
use crate::normalize::{GroupedSkills, group_skills_by_cursus};
use crate::profile::StudentProfile;
use crate::theme::Theme;

pub const DEFAULT_MAX_SKILLS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct SkillsOptions {
    pub width: u32,
    pub max_skills: usize,
    pub footer_note: Option<String>,
}

impl Default for SkillsOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            max_skills: DEFAULT_MAX_SKILLS,
            footer_note: None,
        }
    }
}

/// Color tier of a skill level. Thresholds are specific to this table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillTier {
    High,
    Medium,
    Low,
}

impl SkillTier {
    pub fn for_level(level: f64) -> Self {
        if level >= 10.0 {
            Self::High
        } else if level >= 6.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn color(self, theme: &Theme) -> &str {
        match self {
            Self::High => &theme.success,
            Self::Medium => &theme.warning,
            Self::Low => &theme.muted,
        }
    }
}

pub fn generate_skills(profile: &StudentProfile, theme_name: &str, options: &SkillsOptions) -> String {
    render_skills(profile, &Theme::resolve(theme_name), options)
}

pub fn render_skills(profile: &StudentProfile, theme: &Theme, options: &SkillsOptions) -> String {
    match try_render_skills(profile, theme, options) {
        Ok(svg) => svg,
        Err(err) => {
            debug!(login = %profile.login, error = %err, "skills widget falls back to error panel");
            render_error_with(&err.to_string(), theme, SKILLS_COMMAND)
        }
    }
}

pub fn try_render_skills(
    profile: &StudentProfile,
    theme: &Theme,
    options: &SkillsOptions,
) -> Result<String, WidgetError> {
    profile.validate()?;
    check_width(options.width)?;
    if options.max_skills == 0 {
        return Err(WidgetError::InvalidOption("maxSkills must be a positive integer".to_string()));
    }
    let grouped = group_skills_by_cursus(profile, options.max_skills);
    if grouped.is_empty() {
        return Err(WidgetError::EmptyDataset("No skills data available".to_string()));
    }
    Ok(draw_skills(&profile.login, &grouped, theme, options))
}

/// Draws the table for already grouped skills. `grouped` must not be empty.
pub fn draw_skills(login: &str, grouped: &GroupedSkills, theme: &Theme, options: &SkillsOptions) -> String {
    let layout = TableLayout::skills(options.width, grouped.group_count(), grouped.skill_count());
    let width = layout.width;
    let height = layout.height();
    let with_descriptions = grouped.has_descriptions();
    let (level_x, description_x) = if with_descriptions {
        let anchor = layout.column_x(60);
        (anchor.saturating_sub(100), Some(anchor))
    } else {
        (layout.column_x(80), None)
    };
    let highlight_opacity = if theme.is_dark() { "0.1" } else { "0.05" };

    let mut svg = String::new();
    open_document(&mut svg, theme, width, height, layout.title_bar, &format!("{login}@42: ~/skills"));
    svg.push_str(&format!(
        "<rect x=\"1\" y=\"{}\" width=\"{}\" height=\"28\" fill=\"{}\"/>",
        layout.title_bar + 1,
        width.saturating_sub(2),
        theme.top_bar
    ));
    prompt(&mut svg, theme, 12, layout.title_bar + 53, login, "ls -la skills --by-cursus", 14);

    let table_top = layout.table_top();
    hline(&mut svg, 0, width, table_top, &theme.table_border, "");
    svg.push_str(&format!(
        "<text y=\"{}\" font-size=\"14\" font-weight=\"bold\" fill=\"{}\">\
<tspan x=\"12\">SKILL</tspan><tspan x=\"{level_x}\">LEVEL</tspan>",
        table_top + 28,
        theme.table_header
    ));
    if let Some(x) = description_x {
        svg.push_str(&format!("<tspan x=\"{x}\">DESCRIPTION</tspan>"));
    }
    svg.push_str("</text>");
    hline(&mut svg, 0, width, table_top + layout.table_header - 5, &theme.table_border, "");

    let row = layout.row_height;
    let bar_span = width.saturating_sub(24) as f64;
    let mut row_top = layout.rows_top();
    for group in &grouped.groups {
        section_comment(&mut svg, 12, row_top + row / 2 + 5, &group.cursus, &theme.section_title, 14);
        hline(&mut svg, 0, width, row_top + row, &theme.table_border, " stroke-opacity=\"0.5\"");
        row_top += row;

        for skill in &group.skills {
            let color = SkillTier::for_level(skill.level).color(theme);
            let baseline = row_top + row / 2 + 5;
            let fill = (skill.level * 10.0).clamp(0.0, 100.0);
            svg.push_str(&format!(
                "<rect x=\"4\" y=\"{}\" width=\"{}\" height=\"24\" fill=\"{color}\" opacity=\"{highlight_opacity}\" rx=\"3\"/>",
                baseline - 15,
                width.saturating_sub(8)
            ));
            svg.push_str(&format!(
                "<rect x=\"12\" y=\"{}\" width=\"{:.2}\" height=\"2\" fill=\"{color}\" opacity=\"0.5\"/>",
                baseline + 7,
                bar_span * fill / 100.0
            ));
            svg.push_str(&format!(
                "<text y=\"{baseline}\" font-size=\"14\">\
<tspan x=\"12\" fill=\"{}\">{}</tspan>\
<tspan x=\"{level_x}\" fill=\"{color}\" font-weight=\"bold\">{}</tspan>",
                theme.primary_text,
                escape_xml(&skill.name),
                format_level(skill.level)
            ));
            if let (Some(x), Some(description)) = (description_x, skill.description.as_deref()) {
                svg.push_str(&format!(
                    "<tspan x=\"{x}\" fill=\"{}\" font-size=\"12\">{}</tspan>",
                    theme.label_text,
                    escape_xml(description)
                ));
            }
            svg.push_str("</text>");
            hline(&mut svg, 0, width, row_top + row, &theme.table_border, " stroke-opacity=\"0.3\"");
            row_top += row;
        }
    }

    let footer_top = layout.footer_top();
    svg.push_str(&format!(
        "<rect x=\"1\" y=\"{footer_top}\" width=\"{}\" height=\"{}\" fill=\"{}\" opacity=\"0.7\"/>",
        width.saturating_sub(2),
        layout.footer - 1,
        theme.footer_background
    ));
    svg.push_str(&format!(
        "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"11\" fill=\"{}\">{} skills in {} cursus",
        width as f32 / 2.0,
        height - 15,
        theme.footer_text,
        grouped.skill_count(),
        grouped.group_count()
    ));
    if let Some(note) = options.footer_note.as_deref() {
        svg.push_str(&format!(" · {}", escape_xml(note)));
    }
    svg.push_str("</text>");
    close_document(&mut svg);
    svg
}
