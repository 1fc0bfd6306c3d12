use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::error::{STUDENT_COMMAND, render_error_with};
use super::terminal::{close_document, hline, open_document, prompt, section_comment};
use super::{check_width, escape_xml, format_date, format_level, format_number};
use crate::error::WidgetError;
use crate::layout::{DEFAULT_WIDTH, ProfileLayout};
use crate::normalize::{StatsOptions, StudentStats, compute_stats};
use crate::profile::{Coalition, StudentProfile};
use crate::theme::Theme;

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#(?:[0-9A-Fa-f]{3}|[0-9A-Fa-f]{6}|[0-9A-Fa-f]{8})$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StudentOptions {
    pub width: u32,
    pub level_override: Option<f64>,
    pub include_piscine: bool,
    pub as_of: Option<DateTime<Utc>>,
}

impl Default for StudentOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            level_override: None,
            include_piscine: false,
            as_of: None,
        }
    }
}

/// Identity lines shown above the statistics.
#[derive(Debug, Clone, Copy)]
pub struct StudentIdentity<'a> {
    pub login: &'a str,
    pub display_name: &'a str,
    pub email: Option<&'a str>,
    pub created_at: Option<&'a DateTime<Utc>>,
}

impl<'a> From<&'a StudentProfile> for StudentIdentity<'a> {
    fn from(profile: &'a StudentProfile) -> Self {
        Self {
            login: &profile.login,
            display_name: profile.display_name_or_login(),
            email: profile.email.as_deref().filter(|email| !email.is_empty()),
            created_at: profile.created_at.as_ref(),
        }
    }
}

pub fn generate_student_profile(
    profile: &StudentProfile,
    theme_name: &str,
    options: &StudentOptions,
) -> String {
    render_student(profile, &Theme::resolve(theme_name), options)
}

pub fn render_student(profile: &StudentProfile, theme: &Theme, options: &StudentOptions) -> String {
    match try_render_student(profile, theme, options) {
        Ok(svg) => svg,
        Err(err) => {
            debug!(login = %profile.login, error = %err, "student widget falls back to error panel");
            render_error_with(&err.to_string(), theme, STUDENT_COMMAND)
        }
    }
}

pub fn try_render_student(
    profile: &StudentProfile,
    theme: &Theme,
    options: &StudentOptions,
) -> Result<String, WidgetError> {
    profile.validate()?;
    check_width(options.width)?;
    let stats = compute_stats(
        profile,
        &StatsOptions {
            level_override: options.level_override,
            include_piscine: options.include_piscine,
            as_of: options.as_of,
        },
    );
    Ok(draw_student(
        StudentIdentity::from(profile),
        &stats,
        profile.coalition.as_ref(),
        theme,
        options.width,
    ))
}

/// The coalition's own color when it is a plain hex color, else the theme palette.
pub fn coalition_fill<'a>(coalition: &'a Coalition, theme: &'a Theme) -> &'a str {
    match coalition.color.as_deref() {
        Some(color) if HEX_COLOR_RE.is_match(color) => color,
        _ => theme.coalition_color(&coalition.name),
    }
}

#[derive(Clone, Copy)]
enum Emphasis {
    None,
    Success,
    Warning,
}

struct Field {
    label: &'static str,
    value: String,
    emphasis: Emphasis,
}

impl Field {
    fn plain(label: &'static str, value: String) -> Self {
        Self { label, value, emphasis: Emphasis::None }
    }

    fn flagged(label: &'static str, value: String, highlight: bool) -> Self {
        let emphasis = if highlight { Emphasis::Success } else { Emphasis::None };
        Self { label, value, emphasis }
    }

    fn warned(label: &'static str, value: String, warn: bool) -> Self {
        let emphasis = if warn { Emphasis::Warning } else { Emphasis::None };
        Self { label, value, emphasis }
    }
}

struct Column<'a> {
    x: u32,
    label_width: u32,
    fields: &'a [Field],
}

fn draw_section(svg: &mut String, theme: &Theme, layout: &ProfileLayout, top: u32, title: &str, columns: &[Column<'_>]) {
    section_comment(svg, layout.padding, top + 20, title, &theme.section_title, 14);
    for column in columns {
        for (index, field) in column.fields.iter().enumerate() {
            let y = top + 20 + layout.line_height * (index as u32 + 1);
            let value_fill = match field.emphasis {
                Emphasis::Success => &theme.success,
                Emphasis::Warning => &theme.warning,
                Emphasis::None => &theme.primary_text,
            };
            svg.push_str(&format!(
                "<text y=\"{y}\" font-size=\"14\">\
<tspan x=\"{}\" fill=\"{}\">{}:</tspan>\
<tspan x=\"{}\" fill=\"{value_fill}\">{}</tspan></text>",
                column.x,
                theme.label_text,
                field.label,
                column.x + column.label_width,
                escape_xml(&field.value)
            ));
        }
    }
}

pub fn draw_student(
    identity: StudentIdentity<'_>,
    stats: &StudentStats,
    coalition: Option<&Coalition>,
    theme: &Theme,
    width: u32,
) -> String {
    let layout = ProfileLayout::new(width, coalition.is_some());
    let height = layout.height();
    let right_x = layout.right_column_x();
    let line_end = width.saturating_sub(layout.padding);

    let mut svg = String::new();
    open_document(&mut svg, theme, width, height, layout.title_bar, &format!("{}@42: ~", identity.login));
    svg.push_str(&format!(
        "<rect x=\"1\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
        layout.title_bar,
        width.saturating_sub(2),
        layout.top_bar,
        theme.top_bar
    ));
    prompt(
        &mut svg,
        theme,
        layout.padding,
        layout.title_bar + layout.top_bar + 30,
        identity.login,
        "whoami --all",
        14,
    );

    let basic_left = [
        Field::plain("Login", identity.login.to_string()),
        Field::plain("Name", identity.display_name.to_string()),
        Field::plain("Email", identity.email.unwrap_or("N/A").to_string()),
        Field::plain("Member Since", format_date(identity.created_at)),
    ];
    let basic_right = [
        Field::flagged("Level", format_level(stats.level), stats.level >= 10.0),
        Field::flagged(
            "Correction Points",
            stats.correction_points.to_string(),
            stats.correction_points > 10,
        ),
        Field::plain("Wallet", format!("{} ₳", stats.wallet)),
        Field::plain(
            "Account Age",
            stats
                .account_age_days
                .map(|days| format!("{days} days"))
                .unwrap_or_else(|| "N/A".to_string()),
        ),
    ];
    draw_section(
        &mut svg,
        theme,
        &layout,
        layout.basic_top(),
        "Basic Information",
        &[
            Column { x: layout.padding, label_width: 130, fields: &basic_left },
            Column { x: right_x, label_width: 170, fields: &basic_right },
        ],
    );
    hline(&mut svg, layout.padding, line_end, layout.statistics_top() - 5, &theme.table_border, "");

    let stats_left = [
        Field::plain("Total Projects", stats.total_projects.to_string()),
        Field::flagged("Completed", stats.completed_count.to_string(), stats.completed_count > 0),
        Field::warned("Failed", stats.failed_count.to_string(), stats.failed_count > 0),
        Field::plain("In Progress", stats.in_progress_count.to_string()),
    ];
    let stats_right = [
        Field::flagged(
            "Average Mark",
            format!("{}/100", format_number(stats.average_mark)),
            stats.average_mark >= 90.0,
        ),
        Field::flagged(
            "Highest Mark",
            format!("{}/100", stats.highest_mark),
            stats.highest_mark >= 100,
        ),
        Field::plain("Total Skills", stats.total_skills.to_string()),
        Field::flagged(
            "Skills Average",
            format_level(stats.skills_average),
            stats.skills_average >= 7.0,
        ),
    ];
    let statistics_top = layout.statistics_top();
    draw_section(
        &mut svg,
        theme,
        &layout,
        statistics_top,
        "Student Statistics",
        &[
            Column { x: layout.padding, label_width: 180, fields: &stats_left },
            Column { x: right_x, label_width: 180, fields: &stats_right },
        ],
    );
    if let Some(coalition) = coalition {
        let top = layout.coalition_top();
        let color = coalition_fill(coalition, theme);
        hline(&mut svg, layout.padding, line_end, top - 5, &theme.table_border, "");
        section_comment(&mut svg, layout.padding, top + 20, "Coalition Information", &theme.section_title, 14);
        svg.push_str(&format!(
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"40\" fill=\"{color}\" fill-opacity=\"0.1\" stroke=\"{color}\" rx=\"4\"/>",
            layout.padding,
            top + 32,
            width.saturating_sub(layout.padding * 2)
        ));
        svg.push_str(&format!(
            "<text y=\"{}\" font-size=\"14\">\
<tspan x=\"{}\" fill=\"{color}\" font-weight=\"bold\">{}</tspan>\
<tspan x=\"{right_x}\" fill=\"{}\">Score:</tspan>\
<tspan dx=\"8\" fill=\"{color}\" font-weight=\"bold\">{}</tspan></text>",
            top + 57,
            layout.padding + 12,
            escape_xml(&coalition.name),
            theme.label_text,
            coalition.score
        ));
    }

    close_document(&mut svg);
    svg
}
