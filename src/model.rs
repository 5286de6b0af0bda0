use crate::error::{Result, ScriptError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentinel the model writes into `characterPrompt` when a scene has no people.
pub const NO_CHARACTER: &str = "N/A";

/// One timed segment of a video script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// 1-based position inside the owning script.
    pub scene: u32,
    pub storyboard: String,
    pub voiceover: String,
    pub image_prompt: String,
    pub character_prompt: String,
    pub veo_prompt: String,
    pub seconds: u32,
    pub music: String,
}

impl Scene {
    pub fn has_character(&self) -> bool {
        self.character_prompt.trim() != NO_CHARACTER
    }
}

/// A complete generated artifact: metadata plus ordered scenes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoScript {
    pub id: String,
    pub topic: String,
    pub created_at: DateTime<Utc>,
    pub video_type: String,
    #[serde(default)]
    pub style: Style,
    pub scenes: Vec<Scene>,
}

/// Start and end offsets of a scene, in seconds from the top of the video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneTiming {
    pub start: u32,
    pub end: u32,
}

impl VideoScript {
    pub fn total_seconds(&self) -> u32 {
        self.scenes.iter().map(|s| s.seconds).sum()
    }

    /// Running sum of the preceding scenes' seconds, in scene order.
    pub fn scene_timings(&self) -> Vec<SceneTiming> {
        let mut cursor = 0u32;
        self.scenes
            .iter()
            .map(|scene| {
                let start = cursor;
                cursor = cursor.saturating_add(scene.seconds);
                SceneTiming { start, end: cursor }
            })
            .collect()
    }
}

/// `mm:ss`, minutes keep growing past 59.
pub fn format_timestamp(total_seconds: u32) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// What the generation service returns, before the session stamps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptFragment {
    pub video_type: String,
    pub scenes: Vec<Scene>,
}

impl ScriptFragment {
    /// Parses the provider's text output. Only the top-level shape is checked
    /// field by field; scenes must deserialize as a whole or the fragment is
    /// rejected.
    pub fn from_json(text: &str) -> Result<Self> {
        let root: serde_json::Value = serde_json::from_str(text.trim())
            .map_err(|e| ScriptError::Generation(format!("response is not JSON: {e}")))?;

        let video_type = match root.get("videoType").and_then(|v| v.as_str()) {
            Some(v) if !v.trim().is_empty() => v.to_string(),
            _ => {
                return Err(ScriptError::Generation(
                    "response lacks a videoType string".to_string(),
                ));
            }
        };

        let scenes = match root.get("scenes") {
            Some(v) if v.is_array() => v.clone(),
            _ => {
                return Err(ScriptError::Generation(
                    "response lacks a scenes array".to_string(),
                ));
            }
        };

        let scenes: Vec<Scene> = serde_json::from_value(scenes)
            .map_err(|e| ScriptError::Generation(format!("malformed scene: {e}")))?;
        if scenes.is_empty() {
            return Err(ScriptError::Generation("response has no scenes".to_string()));
        }

        Ok(Self { video_type, scenes })
    }

    pub fn into_script(
        self,
        id: String,
        topic: &str,
        created_at: DateTime<Utc>,
        style: Style,
    ) -> VideoScript {
        VideoScript {
            id,
            topic: topic.to_string(),
            created_at,
            video_type: self.video_type,
            style,
            scenes: self.scenes,
        }
    }
}

/// Requested total length of the video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TargetDuration {
    #[serde(rename = "30秒")]
    Sec30,
    #[default]
    #[serde(rename = "60秒")]
    Sec60,
    #[serde(rename = "90秒")]
    Sec90,
    #[serde(rename = "3分鐘")]
    Min3,
    #[serde(rename = "5分鐘")]
    Min5,
}

impl TargetDuration {
    pub const ALL: [TargetDuration; 5] = [
        TargetDuration::Sec30,
        TargetDuration::Sec60,
        TargetDuration::Sec90,
        TargetDuration::Min3,
        TargetDuration::Min5,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Sec30 => "30秒",
            Self::Sec60 => "60秒",
            Self::Sec90 => "90秒",
            Self::Min3 => "3分鐘",
            Self::Min5 => "5分鐘",
        }
    }

    pub fn seconds(self) -> u32 {
        match self {
            Self::Sec30 => 30,
            Self::Sec60 => 60,
            Self::Sec90 => 90,
            Self::Min3 => 180,
            Self::Min5 => 300,
        }
    }
}

impl fmt::Display for TargetDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TargetDuration {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.label() == s || d.seconds().to_string() == s)
            .ok_or_else(|| {
                ScriptError::Validation(format!(
                    "unknown duration '{s}', expected one of: {}",
                    labels(Self::ALL.iter().map(|d| d.label()))
                ))
            })
    }
}

/// Tone of the script, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Style {
    #[default]
    #[serde(rename = "專業")]
    Professional,
    #[serde(rename = "幽默")]
    Humorous,
    #[serde(rename = "懸疑")]
    Suspense,
    #[serde(rename = "感性")]
    Emotional,
    #[serde(rename = "活潑")]
    Lively,
}

impl Style {
    pub const ALL: [Style; 5] = [
        Style::Professional,
        Style::Humorous,
        Style::Suspense,
        Style::Emotional,
        Style::Lively,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Professional => "專業",
            Self::Humorous => "幽默",
            Self::Suspense => "懸疑",
            Self::Emotional => "感性",
            Self::Lively => "活潑",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Style {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|style| style.label() == s)
            .ok_or_else(|| {
                ScriptError::Validation(format!(
                    "unknown style '{s}', expected one of: {}",
                    labels(Self::ALL.iter().map(|st| st.label()))
                ))
            })
    }
}

fn labels<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items.collect::<Vec<_>>().join(", ")
}


#[cfg(test)]
mod tests {
    use super::fixtures::script;
    use super::*;

    #[test]
    fn timings_are_running_sums() {
        let s = script("1", "2024-05-01T10:00:00.000Z", &[10, 20, 15]);
        let timings = s.scene_timings();
        let starts: Vec<u32> = timings.iter().map(|t| t.start).collect();
        let ends: Vec<u32> = timings.iter().map(|t| t.end).collect();
        assert_eq!(starts, vec![0, 10, 30]);
        assert_eq!(ends, vec![10, 30, 45]);
        assert_eq!(s.total_seconds(), 45);
    }

    #[test]
    fn timestamp_format() {
        assert_eq!(format_timestamp(0), "00:00");
        assert_eq!(format_timestamp(75), "01:15");
        assert_eq!(format_timestamp(3600), "60:00");
    }

    #[test]
    fn scene_uses_camel_case_keys() {
        let s = script("1", "2024-05-01T10:00:00.000Z", &[5]);
        let json = serde_json::to_value(&s).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("videoType").is_some());
        assert_eq!(json["style"], "專業");
        let scene = &json["scenes"][0];
        for key in [
            "scene",
            "storyboard",
            "voiceover",
            "imagePrompt",
            "characterPrompt",
            "veoPrompt",
            "seconds",
            "music",
        ] {
            assert!(scene.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn legacy_record_without_style_gets_default() {
        let json = r#"{"id":"1","topic":"t","createdAt":"2024-05-01T10:00:00.000Z",
            "videoType":"教學","scenes":[]}"#;
        let s: VideoScript = serde_json::from_str(json).unwrap();
        assert_eq!(s.style, Style::Professional);
    }

    #[test]
    fn fragment_rejects_bad_shapes() {
        assert!(ScriptFragment::from_json("not json").is_err());
        assert!(ScriptFragment::from_json(r#"{"scenes":[]}"#).is_err());
        assert!(ScriptFragment::from_json(r#"{"videoType":"","scenes":[]}"#).is_err());
        assert!(ScriptFragment::from_json(r#"{"videoType":"廣告","scenes":{}}"#).is_err());
        assert!(ScriptFragment::from_json(r#"{"videoType":"廣告","scenes":[]}"#).is_err());
        assert!(
            ScriptFragment::from_json(r#"{"videoType":"廣告","scenes":[{"scene":1}]}"#).is_err()
        );
    }

    #[test]
    fn fragment_accepts_padded_document() {
        let text = r#"
            {"videoType":"廣告","scenes":[{"scene":1,"storyboard":"s","voiceover":"v",
            "imagePrompt":"i","characterPrompt":"N/A","veoPrompt":"p","seconds":30,"music":"m"}]}
        "#;
        let fragment = ScriptFragment::from_json(text).unwrap();
        assert_eq!(fragment.video_type, "廣告");
        assert_eq!(fragment.scenes.len(), 1);
        assert!(!fragment.scenes[0].has_character());
    }

    #[test]
    fn labels_parse() {
        assert_eq!("30秒".parse::<TargetDuration>().unwrap(), TargetDuration::Sec30);
        assert_eq!("180".parse::<TargetDuration>().unwrap(), TargetDuration::Min3);
        assert_eq!(" 幽默 ".parse::<Style>().unwrap(), Style::Humorous);
        assert!(matches!(
            "快".parse::<Style>(),
            Err(ScriptError::Validation(_))
        ));
    }
}
