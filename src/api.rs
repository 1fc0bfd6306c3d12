//! Upstream 42 intra payloads and their conversion into [`StudentProfile`].
//!
//! The shapes mirror `/v2/users/:login` merged with the paginated
//! `projects_users` and `coalitions` endpoints. The upstream is loose about
//! nulls and field names, so every collection is nullable here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

use crate::error::SourceError;
use crate::profile::{
    Coalition, Cursus, CursusUser, ProjectRecord, ProjectStatus, Skill, StudentProfile, Team,
};

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiUser {
    pub login: Option<String>,
    pub displayname: Option<String>,
    pub usual_full_name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub correction_point: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub wallet: i64,
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub cursus_users: Vec<ApiCursusUser>,
    #[serde(default, deserialize_with = "nullable")]
    pub projects_users: Vec<ApiProjectUser>,
    #[serde(default, deserialize_with = "nullable")]
    pub coalitions: Vec<ApiCoalition>,
    pub coalition: Option<ApiCoalition>,
    /// Pre-grouped skills, as emitted by older exports and the demo data.
    pub skills: Option<BTreeMap<String, Vec<ApiSkill>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiCursus {
    pub id: Option<u32>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiCursusUser {
    pub cursus: Option<ApiCursus>,
    pub level: Option<f64>,
    #[serde(default, deserialize_with = "nullable")]
    pub skills: Vec<ApiSkill>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiSkill {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub level: f64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiProject {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiTeam {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub users: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiProjectUser {
    pub project: Option<ApiProject>,
    pub project_name: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "validated?")]
    pub validated_flag: Option<bool>,
    pub validated: Option<bool>,
    pub final_mark: Option<f64>,
    pub marked_at: Option<String>,
    pub updated_at: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub cursus_ids: Vec<u32>,
    #[serde(default, deserialize_with = "nullable")]
    pub teams: Vec<ApiTeam>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiCoalition {
    pub name: Option<String>,
    pub color: Option<String>,
    pub score: Option<i64>,
    pub image_url: Option<String>,
}

fn parse_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<ApiSkill> for Skill {
    fn from(skill: ApiSkill) -> Self {
        Skill {
            name: skill.name,
            level: skill.level,
            description: non_empty(skill.description),
        }
    }
}

impl From<ApiProjectUser> for ProjectRecord {
    fn from(raw: ApiProjectUser) -> Self {
        let project_name = raw
            .project
            .and_then(|project| project.name)
            .or(raw.project_name)
            .unwrap_or_else(|| "Unknown Project".to_string());
        let team = raw.teams.into_iter().next().map(|team| Team {
            size: team.users.len() as u32,
            name: team.name,
        });
        let completion_date =
            parse_date(raw.marked_at.as_deref()).or_else(|| parse_date(raw.updated_at.as_deref()));
        ProjectRecord {
            project_name,
            status: raw
                .status
                .as_deref()
                .map(ProjectStatus::from_token)
                .unwrap_or_default(),
            validated: raw.validated.or(raw.validated_flag).unwrap_or(false),
            final_mark: raw.final_mark.map(|mark| mark.round() as i32),
            completion_date,
            cursus_ids: raw.cursus_ids,
            team,
        }
    }
}

impl From<ApiCoalition> for Coalition {
    fn from(raw: ApiCoalition) -> Self {
        Coalition {
            name: raw.name.unwrap_or_default(),
            color: non_empty(raw.color),
            score: raw.score.unwrap_or(0),
            image_url: raw.image_url,
        }
    }
}

impl From<ApiUser> for StudentProfile {
    fn from(raw: ApiUser) -> Self {
        let login = raw.login.unwrap_or_default();
        let display_name = non_empty(raw.displayname)
            .or(non_empty(raw.usual_full_name))
            .unwrap_or_else(|| login.clone());

        let cursus_users: Vec<CursusUser> = raw
            .cursus_users
            .into_iter()
            .map(|entry| {
                let cursus = entry.cursus.unwrap_or_default();
                CursusUser {
                    cursus: Cursus {
                        id: cursus.id.unwrap_or(0),
                        name: cursus.name.unwrap_or_else(|| "Unknown Cursus".to_string()),
                    },
                    level: entry.level.unwrap_or(0.0),
                    skills: entry.skills.into_iter().map(Skill::from).collect(),
                }
            })
            .collect();

        let skills = match raw.skills {
            Some(grouped) => grouped
                .into_iter()
                .map(|(cursus, skills)| (cursus, skills.into_iter().map(Skill::from).collect()))
                .collect(),
            None => {
                let mut grouped = BTreeMap::new();
                for entry in &cursus_users {
                    grouped.insert(entry.cursus.name.clone(), entry.skills.clone());
                }
                grouped
            }
        };

        let coalition = raw
            .coalition
            .or_else(|| raw.coalitions.into_iter().next())
            .map(Coalition::from);

        StudentProfile {
            login,
            display_name,
            email: non_empty(raw.email),
            skills,
            projects_users: raw.projects_users.into_iter().map(ProjectRecord::from).collect(),
            cursus_users,
            coalition,
            correction_points: raw.correction_point,
            wallet: raw.wallet,
            created_at: parse_date(raw.created_at.as_deref()),
        }
    }
}

/// Parses a student document.
///
/// Accepts either an upstream payload (snake_case, `displayname`,
/// `projects_users`) or a profile previously exported by this crate
/// (camelCase, as served by `/api/student/{login}`).
pub fn parse_profile(input: &str) -> Result<StudentProfile, SourceError> {
    let value: serde_json::Value = serde_json::from_str(input)?;
    if !value.is_object() {
        return Err(SourceError::Malformed(
            "expected a JSON object describing a student".to_string(),
        ));
    }
    let exported = ["projectsUsers", "cursusUsers", "displayName", "correctionPoints"]
        .iter()
        .any(|key| value.get(key).is_some());
    if exported {
        return Ok(serde_json::from_value(value)?);
    }
    let raw: ApiUser = serde_json::from_value(value)?;
    Ok(StudentProfile::from(raw))
}
