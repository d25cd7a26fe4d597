//! Library for configuration types definitions and configuration file loading using [`toml`] and
//! [`serde`]

#[macro_use]
extern crate tracing;
use std::io::{self, Read};
use std::{fs, path};

use serde::{Deserialize, Deserializer};

const fn default_true() -> bool {
    true
}

const fn default_drag_threshold() -> i32 {
    9
}

const fn default_font_height() -> i32 {
    17
}

const fn default_titlebar_padding() -> i32 {
    3
}

const fn default_border_thickness() -> i32 {
    2
}

const fn default_floating_minimum() -> (i32, i32) {
    (75, 50)
}

const fn default_floating_maximum() -> (i32, i32) {
    // Zero means "derive from the output the window is on".
    (0, 0)
}

const fn default_hide_cursor_timeout() -> u64 {
    0
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    pub general: General,
    pub cursor: Cursor,
    pub decorations: Decorations,
    pub outputs: Vec<OutputConfig>,
    pub workspaces: Vec<WorkspaceConfig>,
}

/// Gap sizes around the tiling area, one per screen edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SideGaps {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl SideGaps {
    pub const fn uniform(value: i32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SmartGaps {
    #[default]
    Off,
    On,
    InverseOuter,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FocusWrapping {
    No,
    #[default]
    Yes,
    Force,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct General {
    pub gaps_inner: i32,
    pub gaps_outer: SideGaps,
    pub smart_gaps: SmartGaps,
    #[serde(default = "default_drag_threshold")]
    pub tiling_drag_threshold: i32,
    pub focus_wrapping: FocusWrapping,
    pub auto_back_and_forth: bool,
    #[serde(default = "default_true")]
    pub show_marks: bool,
    #[serde(default = "default_floating_minimum")]
    pub floating_minimum_size: (i32, i32),
    #[serde(default = "default_floating_maximum")]
    pub floating_maximum_size: (i32, i32),
}

impl Default for General {
    fn default() -> Self {
        Self {
            gaps_inner: 0,
            gaps_outer: SideGaps::default(),
            smart_gaps: SmartGaps::Off,
            tiling_drag_threshold: default_drag_threshold(),
            focus_wrapping: FocusWrapping::Yes,
            auto_back_and_forth: false,
            show_marks: true,
            floating_minimum_size: default_floating_minimum(),
            floating_maximum_size: default_floating_maximum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Cursor {
    #[serde(default = "default_hide_cursor_timeout")]
    pub hide_cursor_timeout_ms: u64,
    pub hide_cursor_when_typing: bool,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            hide_cursor_timeout_ms: default_hide_cursor_timeout(),
            hide_cursor_when_typing: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TitleAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BorderStyle {
    None,
    Pixel,
    #[default]
    Normal,
    Csd,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Decorations {
    #[serde(default = "default_border_thickness")]
    pub titlebar_border_thickness: i32,
    #[serde(default = "default_titlebar_padding")]
    pub titlebar_h_padding: i32,
    #[serde(default = "default_titlebar_padding")]
    pub titlebar_v_padding: i32,
    #[serde(default = "default_font_height")]
    pub font_height: i32,
    pub title_align: TitleAlign,
    pub border_style: BorderStyle,
    #[serde(default = "default_border_thickness")]
    pub border_thickness: i32,
    #[serde(deserialize_with = "deserialize_color")]
    pub focused_tint: [f32; 4],
    #[serde(deserialize_with = "deserialize_color")]
    pub unfocused_tint: [f32; 4],
    #[serde(deserialize_with = "deserialize_color")]
    pub urgent_tint: [f32; 4],
}

impl Default for Decorations {
    fn default() -> Self {
        Self {
            titlebar_border_thickness: default_border_thickness(),
            titlebar_h_padding: default_titlebar_padding(),
            titlebar_v_padding: default_titlebar_padding(),
            font_height: default_font_height(),
            title_align: TitleAlign::Left,
            border_style: BorderStyle::Normal,
            border_thickness: default_border_thickness(),
            focused_tint: csscolorparser::parse("#285577").unwrap().to_array(),
            unfocused_tint: csscolorparser::parse("#222222").unwrap().to_array(),
            urgent_tint: csscolorparser::parse("#900000").unwrap().to_array(),
        }
    }
}

fn deserialize_color<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[f32; 4], D::Error> {
    csscolorparser::Color::deserialize(deserializer).map(|c| c.to_array())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputTransform {
    #[default]
    Normal,
    #[serde(rename = "90")]
    Rotate90,
    #[serde(rename = "180")]
    Rotate180,
    #[serde(rename = "270")]
    Rotate270,
    Flipped,
    Flipped90,
    Flipped180,
    Flipped270,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderBitDepth {
    #[default]
    Eight,
    Ten,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct OutputConfig {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Preferred mode as `(width, height, refresh-mHz)`. `None` picks the output's
    /// advertised preferred mode.
    #[serde(default)]
    pub mode: Option<(i32, i32, Option<i32>)>,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub transform: OutputTransform,
    #[serde(default)]
    pub position: Option<(i32, i32)>,
    #[serde(default)]
    pub render_bit_depth: RenderBitDepth,
    #[serde(default)]
    pub adaptive_sync: bool,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default = "default_true")]
    pub dpms: bool,
}

fn default_scale() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct WorkspaceConfig {
    pub name: String,
    /// Output names this workspace prefers, most-preferred first.
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub gaps_inner: Option<i32>,
    #[serde(default)]
    pub gaps_outer: Option<SideGaps>,
}

impl Config {
    /// Find the configuration block for a named workspace, if any.
    pub fn workspace_config(&self, name: &str) -> Option<&WorkspaceConfig> {
        self.workspaces.iter().find(|ws| ws.name == name)
    }

    /// Find the configuration block for a named output, if any.
    pub fn output_config(&self, name: &str) -> Option<&OutputConfig> {
        self.outputs.iter().find(|output| output.name == name)
    }

    fn validate(self) -> Result<Self, Error> {
        if self.general.gaps_inner < 0 {
            return Err(Error::Invalid("general.gaps-inner must be >= 0"));
        }
        let outer = self.general.gaps_outer;
        if outer.top < 0 || outer.right < 0 || outer.bottom < 0 || outer.left < 0 {
            return Err(Error::Invalid("general.gaps-outer must be >= 0"));
        }
        if self.general.tiling_drag_threshold < 0 {
            return Err(Error::Invalid("general.tiling-drag-threshold must be >= 0"));
        }
        if self.decorations.font_height <= 0 {
            return Err(Error::Invalid("decorations.font-height must be > 0"));
        }
        for output in &self.outputs {
            if output.scale <= 0.0 {
                return Err(Error::Invalid("outputs.scale must be > 0"));
            }
        }
        Ok(self)
    }
}

pub fn load(path: &path::Path) -> Result<Config, Error> {
    debug!(?path, "Loading engine configuration");
    let mut file = fs::OpenOptions::new().read(true).open(path)?;
    let mut buf = String::new();
    let _ = file.read_to_string(&mut buf)?;
    let config: Config = toml::from_str(&buf)?;
    config.validate()
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error occured when loading the configuration file: {0}")]
    IO(#[from] io::Error),
    #[error("An error occured while parsing the configuration file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration value: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.general.tiling_drag_threshold, 9);
        assert_eq!(config.general.smart_gaps, SmartGaps::Off);
        assert!(config.general.show_marks);
    }

    #[test]
    fn parses_gap_overrides() {
        let config: Config = toml::from_str(
            r#"
            [general]
            gaps-inner = 10
            gaps-outer = { top = 20, right = 0, bottom = 0, left = 0 }
            smart-gaps = "inverse-outer"

            [[workspaces]]
            name = "web"
            outputs = ["DP-1", "HDMI-A-1"]
            gaps-inner = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.general.gaps_inner, 10);
        assert_eq!(config.general.gaps_outer.top, 20);
        assert_eq!(config.general.smart_gaps, SmartGaps::InverseOuter);
        let ws = config.workspace_config("web").unwrap();
        assert_eq!(ws.outputs, vec!["DP-1", "HDMI-A-1"]);
        assert_eq!(ws.gaps_inner, Some(4));
    }

    #[test]
    fn rejects_negative_gaps() {
        let config: Config = toml::from_str("[general]\ngaps-inner = -3\n").unwrap();
        assert!(config.validate().is_err());
    }
}
