const MONOSPACE_STACK: &str =
    "'JetBrains Mono', SFMono-Regular, Menlo, Monaco, Consolas, 'Courier New', monospace";

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: String,
    pub font_family: String,
    pub background: String,
    pub window_border: String,
    pub header_background: String,
    pub top_bar: String,
    pub title_text: String,
    pub prompt_user: String,
    pub prompt_host: String,
    pub prompt_path: String,
    pub command_text: String,
    pub table_border: String,
    pub table_header: String,
    pub primary_text: String,
    pub label_text: String,
    pub section_title: String,
    pub success: String,
    pub warning: String,
    pub danger: String,
    pub muted: String,
    pub team_badge: String,
    pub solo_badge: String,
    pub footer_text: String,
    pub footer_background: String,
    pub error_fill: String,
    pub coalition_default: String,
    pub coalition_colors: Vec<(String, String)>,
}

fn palette(entries: &[(&str, &str)]) -> Vec<(String, String)> {
    entries
        .iter()
        .map(|(name, color)| (name.to_string(), color.to_string()))
        .collect()
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            name: "dark".to_string(),
            font_family: MONOSPACE_STACK.to_string(),
            background: "#0D1117".to_string(),
            window_border: "#000000".to_string(),
            header_background: "#161B22".to_string(),
            top_bar: "#1C2128".to_string(),
            title_text: "#C9D1D9".to_string(),
            prompt_user: "#39D353".to_string(),
            prompt_host: "#58A6FF".to_string(),
            prompt_path: "#58A6FF".to_string(),
            command_text: "#C9D1D9".to_string(),
            table_border: "#30363D".to_string(),
            table_header: "#FF7B72".to_string(),
            primary_text: "#79C0FF".to_string(),
            label_text: "#8B949E".to_string(),
            section_title: "#7D8590".to_string(),
            success: "#39D353".to_string(),
            warning: "#FFCA28".to_string(),
            danger: "#F85149".to_string(),
            muted: "#8B949E".to_string(),
            team_badge: "#D2A8FF".to_string(),
            solo_badge: "#79C0FF".to_string(),
            footer_text: "#8B949E".to_string(),
            footer_background: "#161B22".to_string(),
            error_fill: "rgba(255, 123, 114, 0.1)".to_string(),
            coalition_default: "#58A6FF".to_string(),
            coalition_colors: palette(&[
                ("The Alliance", "#00BABC"),
                ("The Assembly", "#FF6950"),
                ("The Order", "#9736E8"),
                ("The Federation", "#FFCD42"),
                ("Commodore", "#39D353"),
                ("Freax", "#FFCA28"),
                ("Bios", "#00BABC"),
            ]),
        }
    }

    pub fn light() -> Self {
        Self {
            name: "light".to_string(),
            font_family: MONOSPACE_STACK.to_string(),
            background: "#F6F8FA".to_string(),
            window_border: "#D0D7DE".to_string(),
            header_background: "#F6F8FA".to_string(),
            top_bar: "#EAEEF2".to_string(),
            title_text: "#24292F".to_string(),
            prompt_user: "#0969DA".to_string(),
            prompt_host: "#8250DF".to_string(),
            prompt_path: "#0969DA".to_string(),
            command_text: "#24292F".to_string(),
            table_border: "#D0D7DE".to_string(),
            table_header: "#CF222E".to_string(),
            primary_text: "#0969DA".to_string(),
            label_text: "#57606A".to_string(),
            section_title: "#57606A".to_string(),
            success: "#1A7F37".to_string(),
            warning: "#9A6700".to_string(),
            danger: "#CF222E".to_string(),
            muted: "#57606A".to_string(),
            team_badge: "#8250DF".to_string(),
            solo_badge: "#0969DA".to_string(),
            footer_text: "#57606A".to_string(),
            footer_background: "#EAEEF2".to_string(),
            error_fill: "rgba(207, 34, 46, 0.1)".to_string(),
            coalition_default: "#0969DA".to_string(),
            coalition_colors: palette(&[
                ("The Alliance", "#1F9598"),
                ("The Assembly", "#CF222E"),
                ("The Order", "#8250DF"),
                ("The Federation", "#9A6700"),
                ("Commodore", "#1A7F37"),
                ("Freax", "#9A6700"),
                ("Bios", "#1F9598"),
            ]),
        }
    }

    /// Looks a theme up by name. Unknown names get the dark theme.
    pub fn resolve(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            _ => Self::dark(),
        }
    }

    pub fn coalition_color(&self, coalition: &str) -> &str {
        self.coalition_colors
            .iter()
            .find(|(name, _)| name == coalition)
            .map(|(_, color)| color.as_str())
            .unwrap_or(&self.coalition_default)
    }

    pub fn is_dark(&self) -> bool {
        self.name != "light"
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_names_fall_back_to_dark() {
        assert_eq!(Theme::resolve("solarized"), Theme::dark());
        assert_eq!(Theme::resolve(""), Theme::dark());
        assert_eq!(Theme::resolve("light").name, "light");
    }

    #[test]
    fn coalition_palette_lookup() {
        let theme = Theme::dark();
        assert_eq!(theme.coalition_color("The Order"), "#9736E8");
        assert_eq!(theme.coalition_color("Nobody"), theme.coalition_default);
    }
}
