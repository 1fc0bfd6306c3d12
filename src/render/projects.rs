use tracing::debug;

use super::error::{PROJECTS_COMMAND, render_error_with};
use super::terminal::{close_document, hline, open_document, prompt, section_comment};
use super::{check_width, escape_xml, format_date};
use crate::error::WidgetError;
use crate::layout::{DEFAULT_WIDTH, TableLayout};
use crate::normalize::{ClassifyOptions, classify_projects};
use crate::profile::{ProjectRecord, StudentProfile};
use crate::theme::Theme;

pub const DEFAULT_MAX_PROJECTS: usize = 50;

const PADDING: u32 = 20;
const MAIN_GROUP: &str = "42 Cursus";

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectsOptions {
    pub width: u32,
    pub max_projects: usize,
    pub include_piscine: bool,
    pub footer_note: Option<String>,
}

impl Default for ProjectsOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            max_projects: DEFAULT_MAX_PROJECTS,
            include_piscine: false,
            footer_note: None,
        }
    }
}

/// Color tier of a project mark.
///
/// `Failed` cannot be reached from the completed list, whose marks are all
/// positive, but the tier stays available to callers coloring arbitrary marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkTier {
    High,
    Passed,
    Failed,
}

impl MarkTier {
    pub fn for_mark(mark: i32) -> Self {
        if mark >= 100 {
            Self::High
        } else if mark > 0 {
            Self::Passed
        } else {
            Self::Failed
        }
    }

    pub fn color(self, theme: &Theme) -> &str {
        match self {
            Self::High => &theme.success,
            Self::Passed => &theme.warning,
            Self::Failed => &theme.danger,
        }
    }
}

pub fn generate_projects(profile: &StudentProfile, theme_name: &str, options: &ProjectsOptions) -> String {
    render_projects(profile, &Theme::resolve(theme_name), options)
}

pub fn render_projects(profile: &StudentProfile, theme: &Theme, options: &ProjectsOptions) -> String {
    match try_render_projects(profile, theme, options) {
        Ok(svg) => svg,
        Err(err) => {
            debug!(login = %profile.login, error = %err, "projects widget falls back to error panel");
            render_error_with(&err.to_string(), theme, PROJECTS_COMMAND)
        }
    }
}

pub fn try_render_projects(
    profile: &StudentProfile,
    theme: &Theme,
    options: &ProjectsOptions,
) -> Result<String, WidgetError> {
    profile.validate()?;
    check_width(options.width)?;
    if options.max_projects == 0 {
        return Err(WidgetError::InvalidOption("maxProjects must be a positive integer".to_string()));
    }
    let classified = classify_projects(
        profile,
        &ClassifyOptions {
            include_piscine: options.include_piscine,
            max_count: Some(options.max_projects),
        },
    );
    if classified.completed.is_empty() {
        return Err(WidgetError::EmptyDataset("No completed projects found".to_string()));
    }
    Ok(draw_projects(&profile.login, &classified.completed, theme, options))
}

/// Buckets projects by cursus label, keeping each bucket's input order.
fn group_by_cursus(projects: &[ProjectRecord]) -> Vec<(String, Vec<&ProjectRecord>)> {
    let mut groups: Vec<(String, Vec<&ProjectRecord>)> = Vec::new();
    for project in projects {
        let label = project.cursus_label();
        match groups.iter_mut().find(|(name, _)| *name == label) {
            Some((_, members)) => members.push(project),
            None => groups.push((label, vec![project])),
        }
    }
    groups.sort_by(|(a, _), (b, _)| {
        (a.as_str() != MAIN_GROUP)
            .cmp(&(b.as_str() != MAIN_GROUP))
            .then_with(|| a.cmp(b))
    });
    groups
}

/// Draws the table for already classified completed projects.
pub fn draw_projects(
    login: &str,
    projects: &[ProjectRecord],
    theme: &Theme,
    options: &ProjectsOptions,
) -> String {
    let groups = group_by_cursus(projects);
    let layout = TableLayout::projects(options.width, groups.len(), projects.len());
    let width = layout.width;
    let height = layout.height();
    let type_x = layout.column_x(45);
    let date_x = layout.column_x(60);
    let mark_x = layout.column_x(85);
    let right = width.saturating_sub(PADDING);

    let mut svg = String::new();
    open_document(&mut svg, theme, width, height, layout.title_bar, &format!("{login}@42: ~/projects"));
    svg.push_str(&format!(
        "<rect x=\"1\" y=\"{}\" width=\"{}\" height=\"20\" fill=\"{}\"/>",
        layout.title_bar,
        width.saturating_sub(2),
        theme.top_bar
    ));
    prompt(
        &mut svg,
        theme,
        PADDING,
        layout.title_bar + 40,
        login,
        "ls -la ./projects | grep \"Completed\"",
        14,
    );

    let table_top = layout.table_top();
    svg.push_str(&format!(
        "<text y=\"{}\" font-size=\"13\" font-weight=\"bold\" fill=\"{}\">\
<tspan x=\"{PADDING}\">PROJECT</tspan><tspan x=\"{type_x}\">TYPE</tspan>\
<tspan x=\"{date_x}\">COMPLETED</tspan><tspan x=\"{mark_x}\">MARK</tspan></text>",
        table_top + 22,
        theme.table_header
    ));
    hline(&mut svg, PADDING, right, table_top + layout.table_header - 5, &theme.table_border, "");

    let row = layout.row_height;
    let mut row_top = layout.rows_top();
    for (label, members) in &groups {
        section_comment(&mut svg, PADDING, row_top + row / 2 + 4, label, &theme.section_title, 13);
        hline(
            &mut svg,
            PADDING,
            right,
            row_top + row,
            &theme.table_border,
            " stroke-dasharray=\"4 4\"",
        );
        row_top += row;

        for (index, project) in members.iter().enumerate() {
            let baseline = row_top + row / 2 + 4;
            let mark = project.final_mark.unwrap_or(0);
            let (badge, badge_color) = if project.is_team() {
                (format!("[TEAM:{}]", project.team_size()), &theme.team_badge)
            } else {
                ("[SOLO]".to_string(), &theme.solo_badge)
            };
            svg.push_str(&format!(
                "<text y=\"{baseline}\" font-size=\"13\">\
<tspan x=\"{PADDING}\" fill=\"{}\">{}</tspan>\
<tspan x=\"{type_x}\" fill=\"{badge_color}\" font-size=\"12\">{badge}</tspan>\
<tspan x=\"{date_x}\" fill=\"{}\">{}</tspan>\
<tspan x=\"{mark_x}\" fill=\"{}\" font-weight=\"bold\">{mark}/100</tspan></text>",
                theme.primary_text,
                escape_xml(&project.project_name),
                theme.label_text,
                format_date(project.completion_date.as_ref()),
                MarkTier::for_mark(mark).color(theme),
            ));
            row_top += row;
            if index + 1 < members.len() {
                hline(&mut svg, PADDING, right, row_top, &theme.table_border, " stroke-opacity=\"0.15\"");
            }
        }
        hline(&mut svg, PADDING, right, row_top, &theme.table_border, "");
    }

    let team_count = projects.iter().filter(|project| project.is_team()).count();
    let highest = projects
        .iter()
        .filter_map(|project| project.final_mark)
        .max()
        .unwrap_or(0);
    let footer_top = layout.footer_top();
    svg.push_str(&format!(
        "<text x=\"{PADDING}\" y=\"{}\" font-size=\"11\" fill=\"{}\"># {} completed · {} team · {} solo · best {}/100",
        footer_top + 18,
        theme.footer_text,
        projects.len(),
        team_count,
        projects.len() - team_count,
        highest
    ));
    if let Some(note) = options.footer_note.as_deref() {
        svg.push_str(&format!(" · {}", escape_xml(note)));
    }
    svg.push_str("</text>");
    prompt(&mut svg, theme, PADDING, height - 30, login, "echo $?", 14);
    svg.push_str(&format!(
        "<text x=\"{PADDING}\" y=\"{}\" font-size=\"14\" fill=\"{}\">0</text>",
        height - 10,
        theme.command_text
    ));
    close_document(&mut svg);
    svg
}
