//! Where student profiles come from.

use chrono::{TimeZone, Utc};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::api::parse_profile;
use crate::cache::{Clock, SystemClock, TtlCache};
use crate::error::SourceError;
use crate::profile::{
    Coalition, Cursus, CursusUser, ProjectRecord, ProjectStatus, Skill, StudentProfile, Team,
};

pub const DEFAULT_PROFILE_TTL: Duration = Duration::from_secs(10 * 60);

pub trait StudentSource: Send + Sync {
    fn fetch_student_data(&self, login: &str) -> Result<StudentProfile, SourceError>;
}

impl<S: StudentSource + ?Sized> StudentSource for Box<S> {
    fn fetch_student_data(&self, login: &str) -> Result<StudentProfile, SourceError> {
        (**self).fetch_student_data(login)
    }
}

impl<S: StudentSource + ?Sized> StudentSource for Arc<S> {
    fn fetch_student_data(&self, login: &str) -> Result<StudentProfile, SourceError> {
        (**self).fetch_student_data(login)
    }
}

/// Reads `<dir>/<login>.json` holding an upstream or exported profile.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl StudentSource for DirectorySource {
    fn fetch_student_data(&self, login: &str) -> Result<StudentProfile, SourceError> {
        if login.is_empty() || login.contains(['/', '\\']) || login.starts_with('.') {
            return Err(SourceError::NotFound(login.to_string()));
        }
        let path = self.dir.join(format!("{login}.json"));
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(SourceError::NotFound(login.to_string()));
            }
            Err(err) => return Err(err.into()),
        };
        debug!(path = %path.display(), "loaded student data");
        parse_profile(&text)
    }
}

/// Serves the built-in demo profile under whatever login is asked for.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockSource;

impl StudentSource for MockSource {
    fn fetch_student_data(&self, login: &str) -> Result<StudentProfile, SourceError> {
        let mut profile = demo_profile();
        if !login.is_empty() && login != profile.login {
            profile.login = login.to_string();
            profile.display_name = login.to_string();
        }
        Ok(profile)
    }
}

fn project(name: &str, mark: i32, team: u32, cursus: u32, date: (i32, u32, u32)) -> ProjectRecord {
    ProjectRecord {
        project_name: name.to_string(),
        status: ProjectStatus::Finished,
        validated: true,
        final_mark: Some(mark),
        completion_date: Utc.with_ymd_and_hms(date.0, date.1, date.2, 14, 0, 0).single(),
        cursus_ids: vec![cursus],
        team: Some(Team { size: team, name: None }),
    }
}

pub fn demo_profile() -> StudentProfile {
    let mut profile = StudentProfile::new("zelhajou");
    profile.display_name = "Zakaria El Hajjouji".to_string();
    profile.skills.insert(
        "42cursus".to_string(),
        vec![
            Skill::new("C", 9.45),
            Skill::new("Shell", 8.75),
            Skill::new("Git", 7.9),
            Skill::new("Unix", 8.2),
            Skill::new("Algorithms", 7.5),
            Skill::new("Network & System Administration", 6.8),
            Skill::new("Web", 5.6),
        ],
    );
    profile.skills.insert(
        "42cursus - Web".to_string(),
        vec![
            Skill::new("JavaScript", 8.1),
            Skill::new("React", 7.8),
            Skill::new("Node.js", 7.3),
            Skill::new("CSS", 6.9),
            Skill::new("TypeScript", 6.2),
        ],
    );
    profile.cursus_users = vec![
        CursusUser {
            cursus: Cursus { id: 9, name: "C Piscine".to_string() },
            level: 9.1,
            skills: Vec::new(),
        },
        CursusUser {
            cursus: Cursus { id: 21, name: "42cursus".to_string() },
            level: 11.37,
            skills: Vec::new(),
        },
    ];
    profile.projects_users = vec![
        project("Libft", 125, 1, 21, (2022, 11, 28)),
        project("ft_printf", 100, 1, 21, (2022, 12, 19)),
        project("get_next_line", 112, 1, 21, (2023, 1, 10)),
        project("minishell", 101, 2, 21, (2023, 6, 2)),
        project("cub3d", 115, 2, 21, (2023, 9, 14)),
        project("ft_transcendence", 125, 5, 21, (2024, 5, 30)),
        project("Shell00", 80, 1, 9, (2022, 7, 8)),
    ];
    profile.coalition = Some(Coalition {
        name: "The Order".to_string(),
        color: None,
        score: 4242,
        image_url: None,
    });
    profile.correction_points = 8;
    profile.wallet = 320;
    profile.created_at = Utc.with_ymd_and_hms(2022, 6, 27, 9, 0, 0).single();
    profile
}

/// Wraps a source with an owned TTL cache of successful lookups.
pub struct CachedSource<S> {
    inner: S,
    cache: TtlCache<String, StudentProfile>,
}

impl<S: StudentSource> CachedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self::with_clock(inner, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(inner: S, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner,
            cache: TtlCache::new(ttl, clock),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: StudentSource> StudentSource for CachedSource<S> {
    fn fetch_student_data(&self, login: &str) -> Result<StudentProfile, SourceError> {
        let key = login.to_lowercase();
        if let Some(profile) = self.cache.get(&key) {
            debug!(login, "profile cache hit");
            return Ok(profile);
        }
        match self.inner.fetch_student_data(login) {
            Ok(profile) => {
                self.cache.insert(key, profile.clone());
                Ok(profile)
            }
            Err(err) => {
                warn!(login, error = %err, "student data lookup failed");
                Err(err)
            }
        }
    }
}
