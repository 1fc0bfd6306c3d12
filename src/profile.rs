use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::WidgetError;

/// Cursus id of the C Piscine.
pub const PISCINE_CURSUS_ID: u32 = 9;
/// Cursus id of the main curriculum.
pub const MAIN_CURSUS_ID: u32 = 21;
/// Canonical name of the main curriculum.
pub const MAIN_CURSUS_NAME: &str = "42cursus";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Finished,
    InProgress,
    WaitingForCorrection,
    SearchingAGroup,
    CreatingGroup,
    Parent,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ProjectStatus {
    pub fn from_token(token: &str) -> Self {
        match token {
            "finished" => Self::Finished,
            "in_progress" => Self::InProgress,
            "waiting_for_correction" => Self::WaitingForCorrection,
            "searching_a_group" => Self::SearchingAGroup,
            "creating_group" => Self::CreatingGroup,
            "parent" => Self::Parent,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub level: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Skill {
    pub fn new(name: impl Into<String>, level: f64) -> Self {
        Self {
            name: name.into(),
            level,
            description: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectRecord {
    pub project_name: String,
    pub status: ProjectStatus,
    pub validated: bool,
    pub final_mark: Option<i32>,
    pub completion_date: Option<DateTime<Utc>>,
    pub cursus_ids: Vec<u32>,
    pub team: Option<Team>,
}

impl ProjectRecord {
    pub fn is_piscine(&self) -> bool {
        self.cursus_ids.contains(&PISCINE_CURSUS_ID)
    }

    pub fn team_size(&self) -> u32 {
        self.team.as_ref().map(|team| team.size).unwrap_or(1).max(1)
    }

    pub fn is_team(&self) -> bool {
        self.team_size() > 1
    }

    /// Display name of the cursus the project belongs to, taken from its first cursus id.
    pub fn cursus_label(&self) -> String {
        match self.cursus_ids.first() {
            Some(&PISCINE_CURSUS_ID) => "C Piscine".to_string(),
            Some(&MAIN_CURSUS_ID) => "42 Cursus".to_string(),
            Some(67) => "42 Events".to_string(),
            Some(id) => format!("Cursus {id}"),
            None => "Other".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cursus {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursusUser {
    pub cursus: Cursus,
    pub level: f64,
    pub skills: Vec<Skill>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Coalition {
    pub name: String,
    pub color: Option<String>,
    pub score: i64,
    pub image_url: Option<String>,
}

/// A student's record as delivered by the data source.
///
/// `skills` is keyed by cursus name; a `BTreeMap` keeps iteration order
/// stable so rendering stays byte-for-byte reproducible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentProfile {
    pub login: String,
    pub display_name: String,
    pub email: Option<String>,
    pub skills: BTreeMap<String, Vec<Skill>>,
    pub projects_users: Vec<ProjectRecord>,
    pub cursus_users: Vec<CursusUser>,
    pub coalition: Option<Coalition>,
    pub correction_points: i64,
    pub wallet: i64,
    pub created_at: Option<DateTime<Utc>>,
}

impl StudentProfile {
    pub fn new(login: impl Into<String>) -> Self {
        let login = login.into();
        Self {
            display_name: login.clone(),
            login,
            ..Default::default()
        }
    }

    /// Checks the identity fields every widget depends on.
    pub fn validate(&self) -> Result<(), WidgetError> {
        if self.login.trim().is_empty() {
            return Err(WidgetError::ProfileInvalid(
                "Invalid student profile: missing login".to_string(),
            ));
        }
        Ok(())
    }

    pub fn display_name_or_login(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.login
        } else {
            &self.display_name
        }
    }

    pub fn skill_count(&self) -> usize {
        self.skills.values().map(Vec::len).sum()
    }
}
