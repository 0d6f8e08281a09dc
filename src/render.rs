//! SVG progress card.
//!
//! Layout, top to bottom: title, level bar, target bar, skills (one or more
//! columns), in-progress projects. The canvas height is the sum of the
//! sections actually drawn plus the bottom padding.

use crate::metrics::Metrics;
use derive_builder::Builder;
use std::borrow::Cow;

const TITLE_HEIGHT: u32 = 40;
const HEADING_HEIGHT: u32 = 32;
const LABEL_BASELINE: u32 = 14;
const BAR_OFFSET: u32 = 20;
const ACTIVITY_BASELINE: u32 = 16;
const MIN_ACTIVITY_ROW_HEIGHT: u32 = 18;
const FONT: &str = "'Segoe UI', Ubuntu, 'Helvetica Neue', sans-serif";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
  pub background: String,
  pub text: String,
  pub muted: String,
  pub accent: String,
  pub target: String,
  pub track: String,
  pub skill: String,
}

impl Default for Palette {
  fn default() -> Self {
    Self {
      background: "#0d1117".into(),
      text: "#c9d1d9".into(),
      muted: "#8b949e".into(),
      accent: "#00babc".into(),
      target: "#f0883e".into(),
      track: "#30363d".into(),
      skill: "#58a6ff".into(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(default, setter(into))]
pub struct CardConfig {
  /// Minimum canvas width; grows to fit the skill columns.
  pub width: u32,
  pub padding: u32,
  pub track_width: u32,
  pub bar_height: u32,
  pub row_height: u32,
  pub activity_row_height: u32,
  pub columns: u32,
  pub column_gap: u32,
  /// Skill level drawn as a full bar.
  pub skill_max: f64,
  pub target_label: String,
  pub show_activities: bool,
  pub palette: Palette,
}

impl Default for CardConfig {
  fn default() -> Self {
    Self {
      width: 800,
      padding: 20,
      track_width: 350,
      bar_height: 8,
      row_height: 40,
      activity_row_height: 24,
      columns: 1,
      column_gap: 40,
      skill_max: 20.0,
      target_label: "RNCP 7".into(),
      show_activities: true,
      palette: Palette::default(),
    }
  }
}

/// Width of a bar filled to `value / max` of `track`.
pub fn bar_width(value: f64, max: f64, track: f64) -> f64 {
  if max <= 0.0 || max.is_nan() || value.is_nan() {
    return 0.0;
  }

  (track * value / max).clamp(0.0, track)
}

/// Characters XML 1.0 does not allow anywhere in a document.
fn is_forbidden_in_xml(c: char) -> bool {
  matches!(c, '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}')
}

/// Escapes text for use in SVG character data and attribute values.
///
/// Characters XML cannot carry at all become U+FFFD.
pub fn escape(text: &str) -> Cow<'_, str> {
  if !text.contains(|c: char| matches!(c, '&' | '<' | '>' | '"' | '\'') || is_forbidden_in_xml(c)) {
    return Cow::Borrowed(text);
  }

  let mut escaped = String::with_capacity(text.len() + 8);

  for c in text.chars() {
    match c {
      '&' => escaped.push_str("&amp;"),
      '<' => escaped.push_str("&lt;"),
      '>' => escaped.push_str("&gt;"),
      '"' => escaped.push_str("&quot;"),
      '\'' => escaped.push_str("&#39;"),
      c if is_forbidden_in_xml(c) => escaped.push(char::REPLACEMENT_CHARACTER),
      c => escaped.push(c),
    }
  }

  Cow::Owned(escaped)
}

/// Formats a coordinate with at most two decimals and no trailing zeros.
pub(crate) fn number(value: f64) -> String {
  let formatted = format!("{value:.2}");

  formatted
    .trim_end_matches('0')
    .trim_end_matches('.')
    .to_owned()
}

#[derive(Debug, Clone, Copy)]
pub struct Card<'a> {
  metrics: &'a Metrics,
  config: &'a CardConfig,
}

impl<'a> Card<'a> {
  pub fn new(metrics: &'a Metrics, config: &'a CardConfig) -> Self {
    Self { metrics, config }
  }

  pub fn metrics(&self) -> &Metrics {
    self.metrics
  }

  /// Columns actually used: at least one, never more than there are skills.
  fn columns(&self) -> u32 {
    let skills = u32::try_from(self.metrics.skills.len()).unwrap_or(u32::MAX);

    self.config.columns.clamp(1, skills.max(1))
  }

  fn track(&self) -> f64 {
    f64::from(self.config.track_width)
  }

  fn row_height(&self) -> u32 {
    self
      .config
      .row_height
      .max(BAR_OFFSET.saturating_add(self.config.bar_height).saturating_add(6))
  }

  fn activity_row_height(&self) -> u32 {
    self.config.activity_row_height.max(MIN_ACTIVITY_ROW_HEIGHT)
  }

  fn skill_rows(&self) -> u32 {
    u32::try_from(self.metrics.skills.len())
      .unwrap_or(u32::MAX)
      .div_ceil(self.columns())
  }

  fn shows_activities(&self) -> bool {
    self.config.show_activities && !self.metrics.activities.is_empty()
  }

  pub fn width(&self) -> u32 {
    let columns = self.columns();
    let content = columns
      .saturating_mul(self.config.track_width)
      .saturating_add((columns - 1).saturating_mul(self.config.column_gap));

    self
      .config
      .width
      .max(self.config.padding.saturating_mul(2).saturating_add(content))
  }

  fn header_height(&self) -> u32 {
    self
      .config
      .padding
      .saturating_add(TITLE_HEIGHT)
      .saturating_add(self.row_height().saturating_mul(2))
  }

  /// Height of the skill rows alone, as produced by [`Card::skills_markup`].
  pub fn skills_height(&self) -> u32 {
    self.skill_rows().saturating_mul(self.row_height())
  }

  fn skills_section_height(&self) -> u32 {
    if self.metrics.skills.is_empty() {
      0
    } else {
      HEADING_HEIGHT.saturating_add(self.skills_height())
    }
  }

  fn activities_section_height(&self) -> u32 {
    if self.shows_activities() {
      let rows = u32::try_from(self.metrics.activities.len()).unwrap_or(u32::MAX);

      HEADING_HEIGHT.saturating_add(rows.saturating_mul(self.activity_row_height()))
    } else {
      0
    }
  }

  pub fn height(&self) -> u32 {
    self
      .header_height()
      .saturating_add(self.skills_section_height())
      .saturating_add(self.activities_section_height())
      .saturating_add(self.config.padding)
  }

  /// Fill of the level bar: progress through the current level.
  pub fn level_bar_width(&self) -> f64 {
    bar_width(f64::from(self.metrics.level.hundredths), 100.0, self.track())
  }

  pub fn target_bar_width(&self) -> f64 {
    bar_width(self.metrics.target_percent, 100.0, self.track())
  }

  /// Whole percent reached, never rounded up to a value not yet reached.
  pub fn target_percent_label(&self) -> u32 {
    self.metrics.target_percent.floor() as u32
  }

  fn bar_row(&self, label: &str, value: &str, fill: f64, class: &str) -> String {
    let track = self.config.track_width;
    let bar_height = self.config.bar_height;
    let radius = number(f64::from(bar_height) / 2.0);

    format!(
      "<text class=\"label\" y=\"{LABEL_BASELINE}\">{label}</text>\
<text class=\"label\" x=\"{track}\" y=\"{LABEL_BASELINE}\" text-anchor=\"end\">{value}</text>\
<rect y=\"{BAR_OFFSET}\" width=\"{track}\" height=\"{bar_height}\" rx=\"{radius}\" class=\"track\"/>\
<rect y=\"{BAR_OFFSET}\" width=\"{fill}\" height=\"{bar_height}\" rx=\"{radius}\" class=\"{class}\"/>",
      fill = number(fill),
    )
  }

  /// Skill rows in local coordinates, starting at the origin.
  pub fn skills_markup(&self) -> String {
    let columns = self.columns();
    let column_width = self
      .config
      .track_width
      .saturating_add(self.config.column_gap);
    let mut svg = String::new();

    for (index, skill) in self.metrics.skills.iter().enumerate() {
      let index = index as u32;
      let x = (index % columns).saturating_mul(column_width);
      let y = (index / columns).saturating_mul(self.row_height());
      let fill = bar_width(skill.level, self.config.skill_max, self.track());

      svg.push_str(&format!(
        "<g transform=\"translate({x}, {y})\">{}</g>\n",
        self.bar_row(
          &escape(&skill.name),
          &format!("{:.2}", skill.level),
          fill,
          "skill-bar"
        )
      ));
    }

    svg
  }

  /// In-progress project names in local coordinates, starting at the origin.
  pub fn activities_markup(&self) -> String {
    let row_height = self.activity_row_height();
    let mut svg = String::new();

    for (index, name) in self.metrics.activities.iter().enumerate() {
      let y = u32::try_from(index)
        .unwrap_or(u32::MAX)
        .saturating_mul(row_height)
        .saturating_add(ACTIVITY_BASELINE);

      svg.push_str(&format!(
        "<text class=\"muted\" y=\"{y}\">\u{2022} {}</text>\n",
        escape(name)
      ));
    }

    svg
  }

  fn style(&self) -> String {
    let palette = &self.config.palette;

    format!(
      "<style>
  .background {{ fill: {background}; }}
  .title {{ font: 600 20px {FONT}; fill: {text}; }}
  .heading {{ font: 600 16px {FONT}; fill: {accent}; }}
  .label {{ font: 400 14px {FONT}; fill: {text}; }}
  .muted {{ font: 400 13px {FONT}; fill: {muted}; }}
  .track {{ fill: {track}; }}
  .level-bar {{ fill: {accent}; }}
  .target-bar {{ fill: {target}; }}
  .skill-bar {{ fill: {skill}; }}
</style>
",
      background = palette.background,
      text = palette.text,
      muted = palette.muted,
      accent = palette.accent,
      target = palette.target,
      track = palette.track,
      skill = palette.skill,
    )
  }

  fn title(&self) -> String {
    let cursus = self.metrics.cursus_name.as_deref().unwrap_or("42cursus");

    format!("{} \u{00b7} {}", self.metrics.login, cursus)
  }

  pub fn to_svg(&self) -> String {
    let width = self.width();
    let height = self.height();
    let padding = self.config.padding;
    let row_height = self.row_height();
    let title = escape(&self.title()).into_owned();
    let mut svg = String::new();

    svg.push_str(&format!(
      "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" \
viewBox=\"0 0 {width} {height}\" role=\"img\" aria-label=\"{title}\">\n"
    ));
    svg.push_str(&self.style());
    svg.push_str(&format!(
      "<rect width=\"{width}\" height=\"{height}\" rx=\"10\" class=\"background\"/>\n"
    ));
    svg.push_str(&format!(
      "<text class=\"title\" x=\"{padding}\" y=\"{}\">{title}</text>\n",
      padding + 26
    ));

    let mut y = padding + TITLE_HEIGHT;

    svg.push_str(&format!(
      "<g transform=\"translate({padding}, {y})\">{}</g>\n",
      self.bar_row(
        &format!("Level {}", self.metrics.level),
        &format!("{}%", self.metrics.level.hundredths),
        self.level_bar_width(),
        "level-bar"
      )
    ));
    y += row_height;

    svg.push_str(&format!(
      "<g transform=\"translate({padding}, {y})\">{}</g>\n",
      self.bar_row(
        &format!(
          "{} (level {})",
          escape(&self.config.target_label),
          number(self.metrics.target_level)
        ),
        &format!("{}%", self.target_percent_label()),
        self.target_bar_width(),
        "target-bar"
      )
    ));
    y += row_height;

    if !self.metrics.skills.is_empty() {
      svg.push_str(&format!(
        "<text class=\"heading\" x=\"{padding}\" y=\"{}\">Skills</text>\n",
        y + 22
      ));
      y += HEADING_HEIGHT;
      svg.push_str(&format!(
        "<g class=\"skills\" transform=\"translate({padding}, {y})\">\n{}</g>\n",
        self.skills_markup()
      ));
      y += self.skills_height();
    }

    if self.shows_activities() {
      svg.push_str(&format!(
        "<text class=\"heading\" x=\"{padding}\" y=\"{}\">In progress</text>\n",
        y + 22
      ));
      y += HEADING_HEIGHT;
      svg.push_str(&format!(
        "<g class=\"activities\" transform=\"translate({padding}, {y})\">\n{}</g>\n",
        self.activities_markup()
      ));
    }

    svg.push_str("</svg>\n");
    svg
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::metrics::{Level, SkillLevel};
  use crate::profile::CursusId;

  fn metrics(skills: &[(&str, f64)], activities: &[&str]) -> Metrics {
    Metrics {
      login: "norminet".into(),
      cursus_id: CursusId::MAIN,
      cursus_name: None,
      level: Level::new(5.43),
      target_level: 21.0,
      target_percent: crate::metrics::target_percent(5.43, 21.0),
      skills: skills
        .iter()
        .map(|(name, level)| SkillLevel {
          name: (*name).to_owned(),
          level: *level,
        })
        .collect(),
      activities: activities.iter().map(|name| (*name).to_owned()).collect(),
    }
  }

  #[test]
  fn bar_width_is_clamped_to_the_track() {
    assert_eq!(bar_width(0.0, 21.0, 350.0), 0.0);
    assert_eq!(bar_width(21.0, 21.0, 350.0), 350.0);
    assert_eq!(bar_width(40.0, 21.0, 350.0), 350.0);
    assert_eq!(bar_width(-2.0, 21.0, 350.0), 0.0);
    assert_eq!(bar_width(10.0, 20.0, 350.0), 175.0);
    assert_eq!(bar_width(10.0, 0.0, 350.0), 0.0);
  }

  #[test]
  fn escapes_markup() {
    assert_eq!(escape("C & <Shell>"), "C &amp; &lt;Shell&gt;");
    assert_eq!(escape("\"quoted\" 'x'"), "&quot;quoted&quot; &#39;x&#39;");
    assert!(matches!(escape("Unix"), Cow::Borrowed("Unix")));
    assert!(matches!(escape("tab\there\r\n"), Cow::Borrowed(_)));
  }

  #[test]
  fn replaces_characters_xml_cannot_carry() {
    assert_eq!(escape("a\u{1}b"), "a\u{fffd}b");
    assert_eq!(escape("\u{0}\u{b}\u{c}\u{1f}<"), "\u{fffd}\u{fffd}\u{fffd}\u{fffd}&lt;");

    let config = CardConfig::default();
    let data = metrics(&[("a\u{1}b", 1.0)], &["x\u{8}y"]);
    let svg = Card::new(&data, &config).to_svg();

    assert!(!svg.contains('\u{1}'));
    assert!(!svg.contains('\u{8}'));
    assert!(svg.contains(">a\u{fffd}b<"));
    assert!(svg.contains("x\u{fffd}y"));
  }

  #[test]
  fn formats_numbers_without_trailing_zeros() {
    assert_eq!(number(350.0), "350");
    assert_eq!(number(0.0), "0");
    assert_eq!(number(82.5), "82.5");
    assert_eq!(number(150.5_f64 + 0.004), "150.5");
    assert_eq!(number(49.0 / 3.0), "16.33");
  }

  #[test]
  fn height_fits_rows_exactly() {
    let config = CardConfig::default();

    let empty = metrics(&[], &[]);
    assert_eq!(Card::new(&empty, &config).height(), 20 + 40 + 80 + 20);

    let two = metrics(&[("C", 4.2), ("Shell", 2.8)], &[]);
    assert_eq!(Card::new(&two, &config).height(), 140 + 32 + 80 + 20);

    let with_activities = metrics(&[("C", 4.2), ("Shell", 2.8)], &["ft_irc", "cub3d"]);
    assert_eq!(
      Card::new(&with_activities, &config).height(),
      140 + 32 + 80 + 32 + 48 + 20
    );

    let hidden = CardConfigBuilder::default()
      .show_activities(false)
      .build()
      .unwrap();
    assert_eq!(Card::new(&with_activities, &hidden).height(), 272);
  }

  #[test]
  fn two_columns_halve_the_skill_rows() {
    let config = CardConfigBuilder::default().columns(2u32).build().unwrap();
    let three = metrics(&[("C", 4.2), ("Shell", 2.8), ("Unix", 1.0)], &[]);
    let card = Card::new(&three, &config);

    assert_eq!(card.skills_height(), 80);
    assert_eq!(card.height(), 140 + 32 + 80 + 20);
    assert_eq!(card.width(), 800);

    let wide = CardConfigBuilder::default()
      .columns(3u32)
      .width(0u32)
      .build()
      .unwrap();
    assert_eq!(Card::new(&three, &wide).width(), 20 + 3 * 350 + 2 * 40 + 20);

    let markup = card.skills_markup();
    assert!(markup.contains("translate(0, 0)"));
    assert!(markup.contains("translate(390, 0)"));
    assert!(markup.contains("translate(0, 40)"));
  }

  #[test]
  fn huge_column_counts_do_not_overflow() {
    let config = CardConfigBuilder::default()
      .columns(20_000_000u32)
      .build()
      .unwrap();
    let two = metrics(&[("C", 4.2), ("Shell", 2.8)], &[]);
    let card = Card::new(&two, &config);

    assert_eq!(card.width(), 800);
    assert_eq!(card.skills_height(), 40);
    assert!(card.skills_markup().contains("translate(390, 0)"));

    let wide = CardConfigBuilder::default()
      .columns(u32::MAX)
      .track_width(u32::MAX / 2)
      .column_gap(u32::MAX)
      .build()
      .unwrap();
    let card = Card::new(&two, &wide);

    assert_eq!(card.width(), u32::MAX);
    assert!(card.skills_markup().contains(&format!("translate({}, 0)", u32::MAX)));
  }

  #[test]
  fn zero_columns_fall_back_to_one() {
    let config = CardConfigBuilder::default().columns(0u32).build().unwrap();
    let two = metrics(&[("C", 4.2), ("Shell", 2.8)], &[]);

    assert_eq!(Card::new(&two, &config).skills_height(), 80);
  }

  #[test]
  fn renders_the_card() {
    let config = CardConfig::default();
    let data = metrics(&[("C", 4.2), ("Shell", 2.8)], &[]);
    let svg = Card::new(&data, &config).to_svg();

    assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"800\" height=\"272\""));
    assert!(svg.trim_end().ends_with("</svg>"));
    assert!(svg.contains("Level 5.43"));
    assert!(svg.contains("RNCP 7 (level 21)"));
    assert!(svg.contains(">25%<"));
    assert!(svg.contains(">4.20<"));

    let c = svg.find(">C<").unwrap();
    let shell = svg.find(">Shell<").unwrap();
    assert!(c < shell);

    // 4.2 / 20 of 350
    assert!(svg.contains("width=\"73.5\""));
    // 43 / 100 of 350
    assert!(svg.contains("width=\"150.5\""));
    assert!(!svg.contains("In progress"));
  }

  #[test]
  fn escapes_names_from_the_payload() {
    let config = CardConfig::default();
    let data = metrics(&[("<script>&", 1.0)], &["a\"b<c>"]);
    let svg = Card::new(&data, &config).to_svg();

    assert!(svg.contains("&lt;script&gt;&amp;"));
    assert!(svg.contains("a&quot;b&lt;c&gt;"));
    assert!(!svg.contains("<script>"));
    assert_eq!(svg.matches('<').count(), svg.matches('>').count());
  }

  #[test]
  fn lists_activities() {
    let config = CardConfig::default();
    let data = metrics(&[], &["ft_irc", "cub3d"]);
    let svg = Card::new(&data, &config).to_svg();

    assert!(svg.contains("In progress"));
    assert!(svg.contains("\u{2022} ft_irc"));
    assert!(svg.contains("y=\"40\">\u{2022} cub3d"));
    assert!(!svg.contains("Skills"));
  }
}
