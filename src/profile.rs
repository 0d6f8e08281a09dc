//! Subset of the intra `/v2/users/{login}` payload the card is built from.
//!
//! Everything else in the response is ignored.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CursusId(pub u64);

impl CursusId {
  /// The main 42 cursus.
  pub const MAIN: Self = Self(21);
}

impl Default for CursusId {
  fn default() -> Self {
    Self::MAIN
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
  pub login: String,
  #[serde(default)]
  pub cursus_users: Vec<CursusUser>,
  #[serde(default)]
  pub projects_users: Vec<ProjectUser>,
}

impl UserProfile {
  pub fn cursus(&self, cursus_id: CursusId) -> Option<&CursusUser> {
    self
      .cursus_users
      .iter()
      .find(|cursus| cursus.cursus_id == cursus_id)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursusUser {
  pub cursus_id: CursusId,
  #[serde(default)]
  pub level: Option<f64>,
  #[serde(default)]
  pub skills: Vec<Skill>,
  #[serde(default)]
  pub cursus: Option<Cursus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cursus {
  #[serde(default)]
  pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub level: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectUser {
  #[serde(default)]
  pub status: ProjectStatus,
  #[serde(default)]
  pub project: Option<Project>,
  #[serde(default)]
  pub cursus_ids: Vec<CursusId>,
}

impl ProjectUser {
  pub fn name(&self) -> Option<&str> {
    self.project.as_ref()?.name.as_deref()
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
  #[serde(default)]
  pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
  InProgress,
  Finished,
  SearchingAGroup,
  CreatingGroup,
  WaitingForCorrection,
  Parent,
  #[default]
  #[serde(other)]
  Other,
}
