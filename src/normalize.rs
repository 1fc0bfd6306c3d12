//! Per-visualization working sets derived from a [`StudentProfile`].
//!
//! Everything here is a pure function of its inputs. The completion
//! predicate ([`is_completed`]) is shared by the projects table and the
//! profile statistics so the two can never disagree on a count.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

use crate::profile::{
    CursusUser, MAIN_CURSUS_ID, MAIN_CURSUS_NAME, ProjectRecord, ProjectStatus, Skill,
    StudentProfile,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SkillGroup {
    pub cursus: String,
    pub skills: Vec<Skill>,
}

/// Skills regrouped by cursus, in display order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedSkills {
    pub groups: Vec<SkillGroup>,
}

impl GroupedSkills {
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn skill_count(&self) -> usize {
        self.groups.iter().map(|group| group.skills.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.skill_count() == 0
    }

    pub fn has_descriptions(&self) -> bool {
        self.groups
            .iter()
            .flat_map(|group| group.skills.iter())
            .any(|skill| skill.description.is_some())
    }
}

fn is_piscine_name(name: &str) -> bool {
    name.to_lowercase().contains("piscine")
}

fn by_level_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Flattens every cursus' skills, keeps the `max_total` strongest and
/// regroups them. Piscine groups come first, the rest alphabetically.
pub fn group_skills_by_cursus(profile: &StudentProfile, max_total: usize) -> GroupedSkills {
    let mut tagged: Vec<(&str, &Skill)> = profile
        .skills
        .iter()
        .flat_map(|(cursus, skills)| skills.iter().map(move |skill| (cursus.as_str(), skill)))
        .collect();
    tagged.sort_by(|a, b| by_level_desc(a.1.level, b.1.level));
    if tagged.len() > max_total {
        debug!(
            total = tagged.len(),
            kept = max_total,
            "truncating skill list"
        );
        tagged.truncate(max_total);
    }

    let mut groups: Vec<SkillGroup> = Vec::new();
    for (cursus, skill) in tagged {
        match groups.iter_mut().find(|group| group.cursus == cursus) {
            Some(group) => group.skills.push(skill.clone()),
            None => groups.push(SkillGroup {
                cursus: cursus.to_string(),
                skills: vec![skill.clone()],
            }),
        }
    }
    groups.sort_by(|a, b| {
        is_piscine_name(&b.cursus)
            .cmp(&is_piscine_name(&a.cursus))
            .then_with(|| a.cursus.cmp(&b.cursus))
    });
    GroupedSkills { groups }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyOptions {
    pub include_piscine: bool,
    /// Upper bound on `completed`; `None` keeps every project.
    pub max_count: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedProjects {
    pub completed: Vec<ProjectRecord>,
    pub failed: Vec<ProjectRecord>,
    pub in_progress: Vec<ProjectRecord>,
}

/// A project counts as completed when it is finished, validated and carries a positive mark.
pub fn is_completed(project: &ProjectRecord) -> bool {
    project.status == ProjectStatus::Finished
        && project.validated
        && project.final_mark.is_some_and(|mark| mark > 0)
}

pub fn is_failed(project: &ProjectRecord) -> bool {
    project.status == ProjectStatus::Finished && !project.validated
}

pub fn is_in_progress(project: &ProjectRecord) -> bool {
    project.status == ProjectStatus::InProgress
}

fn considered<'a>(
    profile: &'a StudentProfile,
    include_piscine: bool,
) -> impl Iterator<Item = &'a ProjectRecord> {
    profile
        .projects_users
        .iter()
        .filter(move |project| include_piscine || !project.is_piscine())
}

fn by_date_desc(a: &Option<DateTime<Utc>>, b: &Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn classify_projects(profile: &StudentProfile, options: &ClassifyOptions) -> ClassifiedProjects {
    let mut classified = ClassifiedProjects::default();
    let mut skipped_piscine = 0usize;
    for project in &profile.projects_users {
        if !options.include_piscine && project.is_piscine() {
            skipped_piscine += 1;
            continue;
        }
        if is_completed(project) {
            classified.completed.push(project.clone());
        } else if is_failed(project) {
            classified.failed.push(project.clone());
        } else if is_in_progress(project) {
            classified.in_progress.push(project.clone());
        }
    }
    if skipped_piscine > 0 {
        debug!(skipped = skipped_piscine, "excluded piscine projects");
    }

    classified
        .completed
        .sort_by(|a, b| by_date_desc(&a.completion_date, &b.completion_date));
    if let Some(max) = options.max_count {
        classified.completed.truncate(max);
    }
    classified
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelSource {
    Override,
    MainCursusName,
    MainCursusId,
    Highest,
    Missing,
}

/// Resolves the main-track level: override, then the `42cursus` name, then
/// cursus id 21, then the highest level of any cursus, then zero.
pub fn resolve_level(cursus_users: &[CursusUser], level_override: Option<f64>) -> (f64, LevelSource) {
    if let Some(level) = level_override {
        return (level, LevelSource::Override);
    }
    if let Some(entry) = cursus_users
        .iter()
        .find(|entry| entry.cursus.name == MAIN_CURSUS_NAME)
    {
        return (entry.level, LevelSource::MainCursusName);
    }
    if let Some(entry) = cursus_users
        .iter()
        .find(|entry| entry.cursus.id == MAIN_CURSUS_ID)
    {
        return (entry.level, LevelSource::MainCursusId);
    }
    cursus_users
        .iter()
        .map(|entry| entry.level)
        .max_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .map(|level| (level, LevelSource::Highest))
        .unwrap_or((0.0, LevelSource::Missing))
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatsOptions {
    pub level_override: Option<f64>,
    pub include_piscine: bool,
    /// Reference instant for the account age; without it the age is unknown.
    pub as_of: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentStats {
    pub level: f64,
    pub correction_points: i64,
    pub wallet: i64,
    pub total_projects: usize,
    pub completed_count: usize,
    pub failed_count: usize,
    pub in_progress_count: usize,
    pub average_mark: f64,
    pub highest_mark: i32,
    pub total_skills: usize,
    pub skills_average: f64,
    pub account_age_days: Option<i64>,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Every skill instance across the grouped mapping and the cursus records.
/// A cursus record's skill already present under the same cursus name in
/// the mapping is the same instance and is not counted twice.
fn skill_instances(profile: &StudentProfile) -> Vec<&Skill> {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut instances = Vec::new();
    for (cursus, skills) in &profile.skills {
        for skill in skills {
            seen.insert((cursus.as_str(), skill.name.as_str()));
            instances.push(skill);
        }
    }
    for entry in &profile.cursus_users {
        for skill in &entry.skills {
            if seen.insert((entry.cursus.name.as_str(), skill.name.as_str())) {
                instances.push(skill);
            }
        }
    }
    instances
}

pub fn compute_stats(profile: &StudentProfile, options: &StatsOptions) -> StudentStats {
    let (level, source) = resolve_level(&profile.cursus_users, options.level_override);
    debug!(login = %profile.login, level, ?source, "resolved level");

    let classified = classify_projects(
        profile,
        &ClassifyOptions {
            include_piscine: options.include_piscine,
            max_count: None,
        },
    );
    let marks: Vec<i32> = classified
        .completed
        .iter()
        .filter_map(|project| project.final_mark)
        .collect();
    let average_mark = if marks.is_empty() {
        0.0
    } else {
        round_to(
            marks.iter().map(|&mark| f64::from(mark)).sum::<f64>() / marks.len() as f64,
            1,
        )
    };

    let instances = skill_instances(profile);
    let distinct: BTreeSet<&str> = instances.iter().map(|skill| skill.name.as_str()).collect();
    let skills_average = if instances.is_empty() {
        0.0
    } else {
        round_to(
            instances.iter().map(|skill| skill.level).sum::<f64>() / instances.len() as f64,
            2,
        )
    };

    let account_age_days = match (options.as_of, profile.created_at) {
        (Some(now), Some(created)) => Some((now - created).num_days().max(0)),
        _ => None,
    };

    StudentStats {
        level,
        correction_points: profile.correction_points,
        wallet: profile.wallet,
        total_projects: considered(profile, options.include_piscine).count(),
        completed_count: classified.completed.len(),
        failed_count: classified.failed.len(),
        in_progress_count: classified.in_progress.len(),
        average_mark,
        highest_mark: marks.iter().copied().max().unwrap_or(0),
        total_skills: distinct.len(),
        skills_average,
        account_age_days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Cursus, Team};
    use chrono::TimeZone;

    fn project(name: &str, status: ProjectStatus, validated: bool, mark: Option<i32>) -> ProjectRecord {
        ProjectRecord {
            project_name: name.to_string(),
            status,
            validated,
            final_mark: mark,
            cursus_ids: vec![21],
            ..Default::default()
        }
    }

    fn dated(mut project: ProjectRecord, day: u32) -> ProjectRecord {
        project.completion_date = Some(Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap());
        project
    }

    fn cursus(id: u32, name: &str, level: f64) -> CursusUser {
        CursusUser {
            cursus: Cursus {
                id,
                name: name.to_string(),
            },
            level,
            skills: Vec::new(),
        }
    }

    #[test]
    fn groups_sort_piscine_first_then_alphabetically() {
        let mut profile = StudentProfile::new("x");
        profile
            .skills
            .insert("Web".to_string(), vec![Skill::new("React", 3.0)]);
        profile.skills.insert(
            "42cursus".to_string(),
            vec![Skill::new("C", 9.45), Skill::new("Unix", 2.0)],
        );
        profile
            .skills
            .insert("C Piscine".to_string(), vec![Skill::new("Shell", 1.0)]);

        let grouped = group_skills_by_cursus(&profile, 100);
        let names: Vec<&str> = grouped.groups.iter().map(|g| g.cursus.as_str()).collect();
        assert_eq!(names, ["C Piscine", "42cursus", "Web"]);
        assert_eq!(grouped.groups[1].skills[0].name, "C");
        assert_eq!(grouped.skill_count(), 4);
    }

    #[test]
    fn truncation_keeps_strongest_skills_across_groups() {
        let mut profile = StudentProfile::new("x");
        profile.skills.insert(
            "A".to_string(),
            vec![Skill::new("a1", 1.0), Skill::new("a2", 8.0)],
        );
        profile
            .skills
            .insert("B".to_string(), vec![Skill::new("b1", 5.0)]);

        let grouped = group_skills_by_cursus(&profile, 2);
        assert_eq!(grouped.skill_count(), 2);
        assert_eq!(grouped.groups[0].skills, vec![Skill::new("a2", 8.0)]);
        assert_eq!(grouped.groups[1].skills, vec![Skill::new("b1", 5.0)]);
    }

    #[test]
    fn repeated_skill_names_stay_in_each_cursus() {
        let mut profile = StudentProfile::new("x");
        profile
            .skills
            .insert("A".to_string(), vec![Skill::new("Unix", 1.0)]);
        profile
            .skills
            .insert("B".to_string(), vec![Skill::new("Unix", 2.0)]);
        let grouped = group_skills_by_cursus(&profile, 10);
        assert_eq!(grouped.group_count(), 2);

        let stats = compute_stats(&profile, &StatsOptions::default());
        assert_eq!(stats.total_skills, 1);
        assert_eq!(stats.skills_average, 1.5);
    }

    #[test]
    fn completion_requires_positive_mark() {
        assert!(is_completed(&project("a", ProjectStatus::Finished, true, Some(100))));
        assert!(!is_completed(&project("b", ProjectStatus::Finished, true, Some(0))));
        assert!(!is_completed(&project("c", ProjectStatus::Finished, true, None)));
        assert!(!is_completed(&project("d", ProjectStatus::Finished, false, Some(80))));
        assert!(!is_completed(&project("e", ProjectStatus::InProgress, true, Some(80))));
    }

    #[test]
    fn classifies_and_sorts_by_date_with_missing_last() {
        let mut profile = StudentProfile::new("x");
        profile.projects_users = vec![
            project("undated", ProjectStatus::Finished, true, Some(90)),
            dated(project("older", ProjectStatus::Finished, true, Some(100)), 1),
            dated(project("newer", ProjectStatus::Finished, true, Some(125)), 20),
            project("failed", ProjectStatus::Finished, false, Some(0)),
            project("running", ProjectStatus::InProgress, false, None),
            project("waiting", ProjectStatus::WaitingForCorrection, false, None),
        ];
        let classified = classify_projects(&profile, &ClassifyOptions::default());
        let names: Vec<&str> = classified
            .completed
            .iter()
            .map(|p| p.project_name.as_str())
            .collect();
        assert_eq!(names, ["newer", "older", "undated"]);
        assert_eq!(classified.failed.len(), 1);
        assert_eq!(classified.in_progress.len(), 1);

        let limited = classify_projects(
            &profile,
            &ClassifyOptions {
                include_piscine: false,
                max_count: Some(1),
            },
        );
        assert_eq!(limited.completed.len(), 1);
        assert_eq!(limited.completed[0].project_name, "newer");
    }

    #[test]
    fn piscine_projects_are_excluded_by_default() {
        let mut profile = StudentProfile::new("x");
        let mut piscine = project("C 00", ProjectStatus::Finished, true, Some(100));
        piscine.cursus_ids = vec![9];
        let mut failed_piscine = project("C 01", ProjectStatus::Finished, false, Some(0));
        failed_piscine.cursus_ids = vec![9];
        profile.projects_users = vec![piscine, failed_piscine];

        let classified = classify_projects(&profile, &ClassifyOptions::default());
        assert!(classified.completed.is_empty());
        assert!(classified.failed.is_empty());

        let included = classify_projects(
            &profile,
            &ClassifyOptions {
                include_piscine: true,
                max_count: None,
            },
        );
        assert_eq!(included.completed.len(), 1);
        assert_eq!(included.failed.len(), 1);
    }

    #[test]
    fn level_chain_order() {
        let entries = vec![
            cursus(9, "C Piscine", 9.0),
            cursus(21, "Main", 4.0),
            cursus(1, "42cursus", 6.5),
        ];
        assert_eq!(resolve_level(&entries, Some(1.0)), (1.0, LevelSource::Override));
        assert_eq!(resolve_level(&entries, None), (6.5, LevelSource::MainCursusName));
        assert_eq!(
            resolve_level(&entries[..2], None),
            (4.0, LevelSource::MainCursusId)
        );
        assert_eq!(resolve_level(&entries[..1], None), (9.0, LevelSource::Highest));
        assert_eq!(resolve_level(&[], None), (0.0, LevelSource::Missing));
    }

    #[test]
    fn alternate_capitalization_falls_through_to_highest() {
        let mut profile = StudentProfile::new("x");
        profile.cursus_users = vec![cursus(3, "42 Cursus", 7.25)];
        assert_eq!(compute_stats(&profile, &StatsOptions::default()).level, 7.25);
        profile.cursus_users.push(cursus(4, "Piscine Discovery", 11.0));
        assert_eq!(compute_stats(&profile, &StatsOptions::default()).level, 11.0);
    }

    #[test]
    fn stats_aggregate_marks_and_age() {
        let mut profile = StudentProfile::new("x");
        profile.created_at = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let mut team = project("ft_transcendence", ProjectStatus::Finished, true, Some(125));
        team.team = Some(Team { size: 4, name: None });
        profile.projects_users = vec![
            team,
            project("libft", ProjectStatus::Finished, true, Some(100)),
            project("push_swap", ProjectStatus::Finished, true, Some(84)),
            project("cub3d", ProjectStatus::Finished, false, Some(0)),
            project("webserv", ProjectStatus::InProgress, false, None),
        ];
        let stats = compute_stats(
            &profile,
            &StatsOptions {
                as_of: Some(Utc.with_ymd_and_hms(2024, 1, 11, 23, 0, 0).unwrap()),
                ..Default::default()
            },
        );
        assert_eq!(stats.total_projects, 5);
        assert_eq!(stats.completed_count, 3);
        assert_eq!(stats.failed_count, 1);
        assert_eq!(stats.in_progress_count, 1);
        assert_eq!(stats.average_mark, 103.0);
        assert_eq!(stats.highest_mark, 125);
        assert_eq!(stats.account_age_days, Some(10));

        let classified = classify_projects(&profile, &ClassifyOptions::default());
        assert_eq!(classified.completed.len(), stats.completed_count);
    }

    #[test]
    fn empty_profile_has_zeroed_stats() {
        let stats = compute_stats(&StudentProfile::new("x"), &StatsOptions::default());
        assert_eq!(stats.average_mark, 0.0);
        assert_eq!(stats.highest_mark, 0);
        assert_eq!(stats.skills_average, 0.0);
        assert_eq!(stats.account_age_days, None);
    }

    #[test]
    fn cursus_skills_are_not_double_counted() {
        let mut profile = StudentProfile::new("x");
        let mut main = cursus(21, "42cursus", 5.0);
        main.skills = vec![Skill::new("C", 4.0), Skill::new("Git", 2.0)];
        profile.cursus_users = vec![main];
        profile
            .skills
            .insert("42cursus".to_string(), vec![Skill::new("C", 4.0)]);
        let stats = compute_stats(&profile, &StatsOptions::default());
        assert_eq!(stats.total_skills, 2);
        assert_eq!(stats.skills_average, 3.0);
    }
}
