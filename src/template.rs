//! User supplied SVG templates.
//!
//! A template is split once into literal text and placeholders, then rendered
//! in one pass. Substituted values are never scanned again, so a skill named
//! `%%LEVEL%%` is printed as is.

use crate::render::{number, Card};
use std::str::FromStr;
use thiserror::Error;

pub const SKILLS_MARKER: &str = "<!-- SKILLS_PLACEHOLDER -->";
pub const ACTIVITIES_MARKER: &str = "<!-- ACTIVITIES_PLACEHOLDER -->";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
  #[error("unknown template placeholder %%{0}%%")]
  UnknownPlaceholder(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
  Login,
  Level,
  LevelInt,
  LevelDecimal,
  LevelBarWidth,
  TargetPercent,
  TargetBarWidth,
  SkillsHeight,
  Height,
}

impl Field {
  fn from_name(name: &str) -> Option<Self> {
    Some(match name {
      "LOGIN" => Self::Login,
      "LEVEL" => Self::Level,
      "LEVEL_INT" => Self::LevelInt,
      "LEVEL_DECIMAL" => Self::LevelDecimal,
      "LEVEL_BAR_WIDTH" => Self::LevelBarWidth,
      "TARGET_PERCENT" | "RNCP7_PERCENT" => Self::TargetPercent,
      "TARGET_BAR_WIDTH" => Self::TargetBarWidth,
      "SKILLS_HEIGHT" => Self::SkillsHeight,
      "HEIGHT" => Self::Height,
      _ => return None,
    })
  }

  fn value(self, card: &Card<'_>) -> String {
    let metrics = card.metrics();

    match self {
      Self::Login => crate::render::escape(&metrics.login).into_owned(),
      Self::Level => metrics.level.to_string(),
      Self::LevelInt => metrics.level.integer.to_string(),
      Self::LevelDecimal => format!("{:02}", metrics.level.hundredths),
      Self::LevelBarWidth => number(card.level_bar_width()),
      Self::TargetPercent => card.target_percent_label().to_string(),
      Self::TargetBarWidth => number(card.target_bar_width()),
      Self::SkillsHeight => card.skills_height().to_string(),
      Self::Height => card.height().to_string(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
  Literal(String),
  Field(Field),
  Skills,
  Activities,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
  segments: Vec<Segment>,
}

impl Template {
  pub fn parse(source: &str) -> Result<Self, TemplateError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = source;

    while let Some(start) = next_token(rest) {
      literal.push_str(&rest[..start]);
      rest = &rest[start..];

      let (segment, consumed) = if let Some(after) = rest.strip_prefix(SKILLS_MARKER) {
        (Some(Segment::Skills), rest.len() - after.len())
      } else if let Some(after) = rest.strip_prefix(ACTIVITIES_MARKER) {
        (Some(Segment::Activities), rest.len() - after.len())
      } else if rest.starts_with("%%") {
        match placeholder(rest)? {
          Some((field, consumed)) => (Some(Segment::Field(field)), consumed),
          None => (None, 1),
        }
      } else {
        (None, 1)
      };

      match segment {
        Some(segment) => {
          if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
          }
          segments.push(segment);
        }
        None => literal.push_str(&rest[..consumed]),
      }

      rest = &rest[consumed..];
    }

    literal.push_str(rest);

    if !literal.is_empty() {
      segments.push(Segment::Literal(literal));
    }

    Ok(Self { segments })
  }

  pub fn has_skills(&self) -> bool {
    self.segments.contains(&Segment::Skills)
  }

  pub fn render(&self, card: &Card<'_>) -> String {
    let mut output = String::new();

    for segment in &self.segments {
      match segment {
        Segment::Literal(text) => output.push_str(text),
        Segment::Field(field) => output.push_str(&field.value(card)),
        Segment::Skills => output.push_str(&card.skills_markup()),
        Segment::Activities => output.push_str(&card.activities_markup()),
      }
    }

    output
  }
}

impl FromStr for Template {
  type Err = TemplateError;

  fn from_str(source: &str) -> Result<Self, Self::Err> {
    Self::parse(source)
  }
}

/// Offset of the next `%%` or `<!--`.
fn next_token(text: &str) -> Option<usize> {
  match (text.find("%%"), text.find("<!--")) {
    (Some(a), Some(b)) => Some(a.min(b)),
    (a, b) => a.or(b),
  }
}

/// Reads `%%NAME%%` at the start of `text`. Returns `None` when the `%%` does
/// not open a placeholder-shaped token.
fn placeholder(text: &str) -> Result<Option<(Field, usize)>, TemplateError> {
  let inner = &text[2..];
  let Some(end) = inner.find("%%") else {
    return Ok(None);
  };
  let name = &inner[..end];

  let shaped = !name.is_empty()
    && name.starts_with(|c: char| c.is_ascii_uppercase())
    && name
      .chars()
      .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');

  if !shaped {
    return Ok(None);
  }

  match Field::from_name(name) {
    Some(field) => Ok(Some((field, end + 4))),
    None => Err(TemplateError::UnknownPlaceholder(name.to_owned())),
  }
}
