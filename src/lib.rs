//! Terminal-style SVG widgets for 42 student profiles.
//!
//! A [`StudentProfile`] goes through [`normalize`] into per-widget working
//! sets, which the generators in [`render`] turn into standalone SVG
//! documents. Generators never fail: bad or empty input yields a themed
//! error panel instead.

pub mod api;
pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod layout;
pub mod normalize;
pub mod profile;
#[cfg(feature = "png")]
pub mod raster;
pub mod render;
#[cfg(feature = "serve")]
pub mod serve;
pub mod source;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;

pub use api::parse_profile;
pub use config::{Config, load_config};
pub use error::{SourceError, WidgetError};
pub use layout::container_height;
pub use normalize::{
    ClassifiedProjects, GroupedSkills, StudentStats, classify_projects, compute_stats,
    group_skills_by_cursus, resolve_level,
};
pub use profile::StudentProfile;
#[cfg(feature = "png")]
pub use raster::rasterize;
pub use render::{
    WidgetKind, WidgetOptions, escape_xml, generate_badge, generate_projects, generate_skills,
    generate_student_profile, generate_widget, render_error, render_widget,
};
pub use source::StudentSource;
pub use theme::Theme;
