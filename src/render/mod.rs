//! SVG generation for the terminal widgets.
//!
//! Every generator returns a complete, declaration-free `<svg>` document.
//! Output depends only on the arguments: no clock reads, no random ids.

pub mod badge;
pub mod error;
pub mod projects;
pub mod skills;
pub mod student;
mod terminal;

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

use crate::error::WidgetError;
use crate::layout::{DEFAULT_WIDTH, MAX_WIDTH};
use crate::profile::StudentProfile;
use crate::theme::Theme;

pub use badge::{generate_badge, render_badge};
pub use error::{render_error, render_error_with};
pub use projects::{MarkTier, ProjectsOptions, generate_projects, render_projects};
pub use skills::{SkillTier, SkillsOptions, generate_skills, render_skills};
pub use student::{StudentOptions, generate_student_profile, render_student};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    Skills,
    Projects,
    Student,
    Badge,
}

impl WidgetKind {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "skills" => Some(Self::Skills),
            "projects" => Some(Self::Projects),
            "student" => Some(Self::Student),
            "badge" => Some(Self::Badge),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Skills => "skills",
            Self::Projects => "projects",
            Self::Student => "student",
            Self::Badge => "badge",
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WidgetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s).ok_or_else(|| format!("unknown widget type '{s}'"))
    }
}

/// Union of the per-widget options, as collected from a query string or CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetOptions {
    pub width: u32,
    pub max_skills: usize,
    pub max_projects: usize,
    pub include_piscine: bool,
    pub level_override: Option<f64>,
    pub as_of: Option<DateTime<Utc>>,
    pub footer_note: Option<String>,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            max_skills: skills::DEFAULT_MAX_SKILLS,
            max_projects: projects::DEFAULT_MAX_PROJECTS,
            include_piscine: false,
            level_override: None,
            as_of: None,
            footer_note: None,
        }
    }
}

impl WidgetOptions {
    pub fn skills(&self) -> SkillsOptions {
        SkillsOptions {
            width: self.width,
            max_skills: self.max_skills,
            footer_note: self.footer_note.clone(),
        }
    }

    pub fn projects(&self) -> ProjectsOptions {
        ProjectsOptions {
            width: self.width,
            max_projects: self.max_projects,
            include_piscine: self.include_piscine,
            footer_note: self.footer_note.clone(),
        }
    }

    pub fn student(&self) -> StudentOptions {
        StudentOptions {
            width: self.width,
            level_override: self.level_override,
            include_piscine: self.include_piscine,
            as_of: self.as_of,
        }
    }
}

pub fn render_widget(
    kind: WidgetKind,
    profile: &StudentProfile,
    theme: &Theme,
    options: &WidgetOptions,
) -> String {
    match kind {
        WidgetKind::Skills => render_skills(profile, theme, &options.skills()),
        WidgetKind::Projects => render_projects(profile, theme, &options.projects()),
        WidgetKind::Student => render_student(profile, theme, &options.student()),
        WidgetKind::Badge => render_badge(profile, theme, options.level_override),
    }
}

pub fn generate_widget(
    kind: WidgetKind,
    profile: &StudentProfile,
    theme_name: &str,
    options: &WidgetOptions,
) -> String {
    render_widget(kind, profile, &Theme::resolve(theme_name), options)
}

pub fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

pub(crate) fn check_width(width: u32) -> Result<(), WidgetError> {
    if width == 0 {
        return Err(WidgetError::InvalidOption("width must be a positive integer".to_string()));
    }
    if width > MAX_WIDTH {
        return Err(WidgetError::InvalidOption(format!("width must be at most {MAX_WIDTH}")));
    }
    Ok(())
}

pub(crate) fn format_level(level: f64) -> String {
    format!("{:.2}", level)
}

/// Prints whole numbers without a fraction and everything else with one decimal.
pub(crate) fn format_number(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if (rounded - rounded.round()).abs() < 0.001 {
        format!("{:.0}", rounded)
    } else {
        format!("{:.1}", rounded)
    }
}

pub(crate) fn format_date(date: Option<&DateTime<Utc>>) -> String {
    match date {
        Some(date) => date.format("%b %-d, %Y").to_string(),
        None => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn unescape_xml(input: &str) -> String {
        input
            .replace("&apos;", "'")
            .replace("&quot;", "\"")
            .replace("&gt;", ">")
            .replace("&lt;", "<")
            .replace("&amp;", "&")
    }

    #[test]
    fn escapes_every_special_character() {
        let raw = r#"<a href="x">Tom & Jerry's</a>"#;
        let escaped = escape_xml(raw);
        for ch in ['<', '>', '"', '\''] {
            assert!(!escaped.contains(ch), "{ch} left in {escaped}");
        }
        assert!(!escaped.replace("&amp;", "").replace("&lt;", "").replace("&gt;", "")
            .replace("&quot;", "").replace("&apos;", "").contains('&'));
        assert_eq!(unescape_xml(&escaped), raw);
    }

    #[test]
    fn escaping_keeps_unicode() {
        assert_eq!(escape_xml("Zoé Ünïcødé 学生"), "Zoé Ünïcødé 学生");
        assert_eq!(escape_xml("&amp;"), "&amp;amp;");
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_level(9.449), "9.45");
        assert_eq!(format_level(0.0), "0.00");
        assert_eq!(format_number(100.0), "100");
        assert_eq!(format_number(87.46), "87.5");
    }

    #[test]
    fn date_formatting() {
        let date = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();
        assert_eq!(format_date(Some(&date)), "Mar 5, 2024");
        assert_eq!(format_date(None), "N/A");
    }

    #[test]
    fn widget_kind_tokens() {
        assert_eq!("projects".parse::<WidgetKind>(), Ok(WidgetKind::Projects));
        assert!("radar".parse::<WidgetKind>().is_err());
        assert_eq!(WidgetKind::Student.to_string(), "student");
    }
}
