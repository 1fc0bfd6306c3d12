//! Document geometry for the terminal widgets.
//!
//! Tables stack a title bar, a command line, a header row, one row per
//! group header and one per item, then a footer. Every repeated row shares
//! the same height, so the document grows linearly with the data.

use crate::normalize::{ClassifyOptions, classify_projects};
use crate::profile::StudentProfile;
use crate::render::WidgetKind;

pub const DEFAULT_WIDTH: u32 = 800;
/// Widest document a generator accepts.
pub const MAX_WIDTH: u32 = 4000;

pub const SKILLS_CONTAINER_MIN: u32 = 300;
pub const SKILLS_CONTAINER_MAX: u32 = 1000;
pub const PROJECTS_CONTAINER_MIN: u32 = 300;
pub const PROJECTS_CONTAINER_MAX: u32 = 1200;
pub const STUDENT_CONTAINER_HEIGHT: u32 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLayout {
    pub width: u32,
    pub title_bar: u32,
    pub command_line: u32,
    pub table_header: u32,
    pub row_height: u32,
    pub footer: u32,
    pub group_count: usize,
    pub item_count: usize,
}

impl TableLayout {
    pub fn skills(width: u32, group_count: usize, item_count: usize) -> Self {
        Self {
            width,
            title_bar: 40,
            command_line: 68,
            table_header: 40,
            row_height: 30,
            footer: 40,
            group_count,
            item_count,
        }
    }

    pub fn projects(width: u32, group_count: usize, item_count: usize) -> Self {
        Self {
            width,
            title_bar: 36,
            command_line: 52,
            table_header: 32,
            row_height: 26,
            footer: 70,
            group_count,
            item_count,
        }
    }

    pub fn height(&self) -> u32 {
        let rows = (self.group_count + self.item_count) as u32;
        self.title_bar + self.command_line + self.table_header + rows * self.row_height + self.footer
    }

    /// Top edge of the table header.
    pub fn table_top(&self) -> u32 {
        self.title_bar + self.command_line
    }

    /// Top edge of the first data row.
    pub fn rows_top(&self) -> u32 {
        self.table_top() + self.table_header
    }

    pub fn footer_top(&self) -> u32 {
        self.height() - self.footer
    }

    /// Column anchor at `percent` of the width, rounded down.
    pub fn column_x(&self, percent: u32) -> u32 {
        (u64::from(self.width) * u64::from(percent) / 100) as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileLayout {
    pub width: u32,
    pub title_bar: u32,
    pub top_bar: u32,
    pub command_line: u32,
    pub basic_info: u32,
    pub statistics: u32,
    pub coalition: u32,
    pub footer: u32,
    pub padding: u32,
    pub line_height: u32,
}

impl ProfileLayout {
    pub fn new(width: u32, has_coalition: bool) -> Self {
        Self {
            width,
            title_bar: 36,
            top_bar: 20,
            command_line: 50,
            basic_info: 200,
            statistics: 200,
            coalition: if has_coalition { 90 } else { 0 },
            footer: 20,
            padding: 40,
            line_height: 30,
        }
    }

    pub fn height(&self) -> u32 {
        self.title_bar
            + self.top_bar
            + self.command_line
            + self.basic_info
            + self.statistics
            + self.coalition
            + self.footer
            + 20
    }

    pub fn basic_top(&self) -> u32 {
        self.title_bar + self.top_bar + self.command_line
    }

    pub fn statistics_top(&self) -> u32 {
        self.basic_top() + self.basic_info + 10
    }

    pub fn coalition_top(&self) -> u32 {
        self.statistics_top() + self.statistics + 10
    }

    pub fn right_column_x(&self) -> u32 {
        self.width / 2 + 20
    }
}

/// Height a caller should reserve around a widget, e.g. a PNG canvas.
///
/// This is deliberately looser than the generated document height: the
/// widget itself always emits its exact computed size.
pub fn container_height(kind: WidgetKind, profile: &StudentProfile) -> u32 {
    match kind {
        WidgetKind::Skills => {
            let count = profile.skill_count() as u32;
            (200 + count * 25).clamp(SKILLS_CONTAINER_MIN, SKILLS_CONTAINER_MAX)
        }
        WidgetKind::Projects => {
            let count = classify_projects(profile, &ClassifyOptions::default())
                .completed
                .len() as u32;
            (200 + count * 30).clamp(PROJECTS_CONTAINER_MIN, PROJECTS_CONTAINER_MAX)
        }
        WidgetKind::Student => STUDENT_CONTAINER_HEIGHT,
        WidgetKind::Badge => crate::render::badge::BADGE_HEIGHT,
    }
}
