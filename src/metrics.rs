//! Derives the numbers shown on the card from a fetched profile.

use crate::profile::{CursusId, ProjectStatus, UserProfile};
use crate::{Error, Result};
use std::fmt;

pub const UNNAMED_SKILL: &str = "Unnamed skill";
pub const UNNAMED_PROJECT: &str = "Unnamed project";

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsOptions {
  pub cursus_id: CursusId,
  /// Level that counts as 100% on the target bar.
  pub target_level: f64,
  /// In-progress project left off the activity list.
  pub excluded_project: Option<String>,
}

impl Default for MetricsOptions {
  fn default() -> Self {
    Self {
      cursus_id: CursusId::MAIN,
      target_level: 21.0,
      excluded_project: None,
    }
  }
}

/// A cursus level split into whole levels and hundredths.
///
/// Both parts come from a single rounding of `value * 100`, so `5.999` is
/// `6.00` rather than `5.100`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Level {
  pub value: f64,
  pub integer: u64,
  pub hundredths: u8,
}

impl Level {
  pub fn new(value: f64) -> Self {
    let value = non_negative(value);
    let total = (value * 100.0).round() as u64;

    Self {
      value,
      integer: total / 100,
      hundredths: (total % 100) as u8,
    }
  }
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{:02}", self.integer, self.hundredths)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkillLevel {
  pub name: String,
  pub level: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
  pub login: String,
  pub cursus_id: CursusId,
  pub cursus_name: Option<String>,
  pub level: Level,
  pub target_level: f64,
  pub target_percent: f64,
  /// Highest level first; equal levels keep the order of the payload.
  pub skills: Vec<SkillLevel>,
  pub activities: Vec<String>,
}

pub fn extract(profile: &UserProfile, options: &MetricsOptions) -> Result<Metrics> {
  let cursus = profile
    .cursus(options.cursus_id)
    .ok_or_else(|| Error::CursusNotFound {
      cursus_id: options.cursus_id,
      login: profile.login.clone(),
    })?;

  let level = Level::new(cursus.level.unwrap_or_default());

  let mut skills: Vec<SkillLevel> = cursus
    .skills
    .iter()
    .map(|skill| SkillLevel {
      name: skill
        .name
        .clone()
        .unwrap_or_else(|| UNNAMED_SKILL.to_owned()),
      level: non_negative(skill.level.unwrap_or_default()),
    })
    .collect();

  sort_skills(&mut skills);

  Ok(Metrics {
    login: profile.login.clone(),
    cursus_id: options.cursus_id,
    cursus_name: cursus.cursus.as_ref().and_then(|c| c.name.clone()),
    level,
    target_level: options.target_level,
    target_percent: target_percent(level.value, options.target_level),
    skills,
    activities: activities(profile, options),
  })
}

/// Share of `target` reached by `level`, in `[0, 100]`.
pub fn target_percent(level: f64, target: f64) -> f64 {
  if target <= 0.0 || target.is_nan() {
    return 100.0;
  }

  (non_negative(level) / target * 100.0).clamp(0.0, 100.0)
}

/// Stable, so skills of equal level stay in payload order.
pub fn sort_skills(skills: &mut [SkillLevel]) {
  skills.sort_by(|a, b| b.level.total_cmp(&a.level));
}

fn activities(profile: &UserProfile, options: &MetricsOptions) -> Vec<String> {
  profile
    .projects_users
    .iter()
    .filter(|project| project.status == ProjectStatus::InProgress)
    .filter(|project| {
      !project.cursus_ids.is_empty()
        && project
          .cursus_ids
          .iter()
          .all(|id| *id == options.cursus_id)
    })
    .map(|project| project.name().unwrap_or(UNNAMED_PROJECT).to_owned())
    .filter(|name| options.excluded_project.as_deref() != Some(name.as_str()))
    .collect()
}

fn non_negative(value: f64) -> f64 {
  if value.is_finite() && value > 0.0 {
    value
  } else {
    0.0
  }
}
