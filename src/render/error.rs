use super::escape_xml;
use super::terminal::{close_document, open_document, prompt};
use crate::theme::Theme;

pub const ERROR_WIDTH: u32 = 500;
pub const ERROR_HEIGHT: u32 = 200;

pub const SKILLS_COMMAND: &str = "ls -la skills --by-cursus";
pub const PROJECTS_COMMAND: &str = "ls -la ./projects | grep \"Completed\"";
pub const STUDENT_COMMAND: &str = "whoami --all";

const PROMPT_USER: &str = "user";

/// Fixed-size terminal session ending in a non-zero exit code.
pub fn render_error(message: &str, theme_name: &str) -> String {
    render_error_with(message, &Theme::resolve(theme_name), STUDENT_COMMAND)
}

/// Same panel with an explicit theme and the command the failed widget would have run.
pub fn render_error_with(message: &str, theme: &Theme, command: &str) -> String {
    let mut svg = String::new();
    open_document(&mut svg, theme, ERROR_WIDTH, ERROR_HEIGHT, 36, "error: bash");
    prompt(&mut svg, theme, 15, 60, PROMPT_USER, command, 14);
    svg.push_str(&format!(
        "<rect x=\"15\" y=\"75\" width=\"{}\" height=\"50\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1\" stroke-opacity=\"0.3\"/>",
        ERROR_WIDTH - 30,
        theme.error_fill,
        theme.danger
    ));
    svg.push_str(&format!(
        "<text x=\"25\" y=\"105\" font-size=\"14\" fill=\"{}\">error: {}</text>",
        theme.danger,
        escape_xml(message)
    ));
    prompt(&mut svg, theme, 15, 150, PROMPT_USER, "echo $?", 14);
    svg.push_str(&format!(
        "<text x=\"15\" y=\"175\" font-size=\"14\" fill=\"{}\">1</text>",
        theme.command_text
    ));
    close_document(&mut svg);
    svg
}
