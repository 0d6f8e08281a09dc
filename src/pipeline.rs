//! Fetch, extract, render, write.

use crate::metrics::{self, MetricsOptions};
use crate::profile::UserProfile;
use crate::render::{Card, CardConfig};
use crate::template::Template;
use crate::{Error, IntraApi, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// Where user profiles come from.
#[async_trait]
pub trait ProfileSource {
  async fn fetch_user(&self, login: &str) -> Result<UserProfile>;
}

#[async_trait]
impl ProfileSource for IntraApi {
  async fn fetch_user(&self, login: &str) -> Result<UserProfile> {
    self.get_user(login).await
  }
}

#[derive(Debug, Clone)]
pub struct CardJob {
  pub login: String,
  pub metrics: MetricsOptions,
  pub card: CardConfig,
  /// Renders through this SVG template instead of the built-in layout.
  pub template: Option<PathBuf>,
  pub output: PathBuf,
}

impl CardJob {
  pub fn new(login: impl Into<String>, output: impl Into<PathBuf>) -> Self {
    Self {
      login: login.into(),
      metrics: MetricsOptions::default(),
      card: CardConfig::default(),
      template: None,
      output: output.into(),
    }
  }
}

/// Builds the complete card markup in memory.
///
/// The template is loaded before the profile is fetched, so a bad template
/// path fails without a profile request.
pub async fn build_card<S>(source: &S, job: &CardJob) -> Result<String>
where
  S: ProfileSource + Sync + ?Sized,
{
  let template = match &job.template {
    Some(path) => {
      let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| Error::TemplateRead {
          path: path.clone(),
          source,
        })?;
      let template = Template::parse(&text)?;

      if !template.has_skills() {
        tracing::warn!(path = %path.display(), "template has no skills placeholder");
      }

      Some(template)
    }
    None => None,
  };

  let profile = source.fetch_user(&job.login).await?;
  let metrics = metrics::extract(&profile, &job.metrics)?;

  tracing::info!(
    login = %metrics.login,
    level = %metrics.level,
    target_percent = metrics.target_percent,
    skills = metrics.skills.len(),
    activities = metrics.activities.len(),
    "extracted metrics"
  );

  let card = Card::new(&metrics, &job.card);

  Ok(match template {
    Some(template) => template.render(&card),
    None => card.to_svg(),
  })
}

/// Builds the card and writes it to `job.output` in one go. Nothing is
/// written when any step before fails.
pub async fn write_card<S>(source: &S, job: &CardJob) -> Result<()>
where
  S: ProfileSource + Sync + ?Sized,
{
  let svg = build_card(source, job).await?;

  tokio::fs::write(&job.output, svg.as_bytes())
    .await
    .map_err(|source| Error::Write {
      path: job.output.clone(),
      source,
    })?;

  tracing::info!(path = %job.output.display(), bytes = svg.len(), "wrote card");

  Ok(())
}
