//! URL to route resolution and query-string options.

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use url::form_urlencoded;

use crate::layout::MAX_WIDTH;
use crate::render::{WidgetKind, WidgetOptions};

static LOGIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]{1,64}$").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Widget { kind: WidgetKind, login: Login },
    PngWidget { kind: WidgetKind, login: Login },
    Student { login: Login },
    Badge { login: Login },
    NotFound,
}

/// A login segment: decoded, and either valid or kept raw for error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Login {
    Valid(String),
    Invalid(String),
}

impl Login {
    fn from_segment(segment: &str) -> Self {
        let decoded = percent_decode_str(segment).decode_utf8_lossy().into_owned();
        if LOGIN_RE.is_match(&decoded) && decoded != "." && decoded != ".." {
            Login::Valid(decoded)
        } else {
            Login::Invalid(decoded)
        }
    }

    pub fn raw(&self) -> &str {
        match self {
            Login::Valid(login) | Login::Invalid(login) => login,
        }
    }
}

/// Splits a request target into its path and query parts.
pub fn split_target(target: &str) -> (&str, &str) {
    match target.split_once('?') {
        Some((path, query)) => (path, query),
        None => (target, ""),
    }
}

pub fn resolve_route(path: &str) -> Route {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    match segments.as_slice() {
        ["api", "widget", kind, login] => Route::Widget {
            kind: WidgetKind::from_token(kind).unwrap_or(WidgetKind::Skills),
            login: Login::from_segment(login),
        },
        ["api", "png-widget", kind, login] => Route::PngWidget {
            kind: WidgetKind::from_token(kind).unwrap_or(WidgetKind::Skills),
            login: Login::from_segment(login),
        },
        ["api", "student", login] => Route::Student {
            login: Login::from_segment(login),
        },
        ["api", "github-badge", login] => Route::Badge {
            login: Login::from_segment(login),
        },
        _ => Route::NotFound,
    }
}

/// Query parameters understood by the widget endpoints.
///
/// Values that do not parse are dropped so the configured default applies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetQuery {
    pub theme: Option<String>,
    pub width: Option<u32>,
    pub max_skills: Option<usize>,
    pub max_projects: Option<usize>,
    pub include_piscine: Option<bool>,
}

fn positive<T: std::str::FromStr + PartialOrd + Default>(value: &str) -> Option<T> {
    value.trim().parse::<T>().ok().filter(|v| *v > T::default())
}

impl WidgetQuery {
    pub fn parse(query: &str) -> Self {
        let mut parsed = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "theme" => parsed.theme = Some(value.into_owned()),
                "width" => parsed.width = positive(&value).filter(|&width| width <= MAX_WIDTH),
                "maxSkills" => parsed.max_skills = positive(&value),
                "maxProjects" => parsed.max_projects = positive(&value),
                "includePiscine" => parsed.include_piscine = Some(value == "true" || value == "1"),
                _ => {}
            }
        }
        parsed
    }

    /// Overlays the query onto `defaults`.
    pub fn options(&self, defaults: &WidgetOptions) -> WidgetOptions {
        WidgetOptions {
            width: self.width.unwrap_or(defaults.width),
            max_skills: self.max_skills.unwrap_or(defaults.max_skills),
            max_projects: self.max_projects.unwrap_or(defaults.max_projects),
            include_piscine: self.include_piscine.unwrap_or(defaults.include_piscine),
            ..defaults.clone()
        }
    }
}
