use crate::error::ScriptError;
use crate::model::Scene;
use std::fmt;
use std::str::FromStr;

/// Text fields of a scene that may be edited after generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneField {
    Storyboard,
    Voiceover,
    Music,
    ImagePrompt,
    CharacterPrompt,
    VeoPrompt,
}

impl SceneField {
    pub const ALL: [SceneField; 6] = [
        SceneField::Storyboard,
        SceneField::Voiceover,
        SceneField::Music,
        SceneField::ImagePrompt,
        SceneField::CharacterPrompt,
        SceneField::VeoPrompt,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Storyboard => "storyboard",
            Self::Voiceover => "voiceover",
            Self::Music => "music",
            Self::ImagePrompt => "imagePrompt",
            Self::CharacterPrompt => "characterPrompt",
            Self::VeoPrompt => "veoPrompt",
        }
    }
}

impl fmt::Display for SceneField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SceneField {
    type Err = ScriptError;

    /// Accepts the JSON key in any case, with or without `-`/`_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(|c| c.to_lowercase())
            .collect();
        Self::ALL
            .into_iter()
            .find(|f| f.key().to_lowercase() == wanted)
            .ok_or_else(|| {
                ScriptError::Validation(format!(
                    "'{s}' is not an editable scene field (scene and seconds are fixed)"
                ))
            })
    }
}

/// Partial overwrite of a scene's editable fields; `None` keeps the old text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneEdit {
    pub storyboard: Option<String>,
    pub voiceover: Option<String>,
    pub music: Option<String>,
    pub image_prompt: Option<String>,
    pub character_prompt: Option<String>,
    pub veo_prompt: Option<String>,
}

impl SceneEdit {
    pub fn single(field: SceneField, value: impl Into<String>) -> Self {
        Self::default().set(field, value)
    }

    pub fn set(mut self, field: SceneField, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match field {
            SceneField::Storyboard => self.storyboard = value,
            SceneField::Voiceover => self.voiceover = value,
            SceneField::Music => self.music = value,
            SceneField::ImagePrompt => self.image_prompt = value,
            SceneField::CharacterPrompt => self.character_prompt = value,
            SceneField::VeoPrompt => self.veo_prompt = value,
        }
        self
    }
}

/// Returns a new scene with the edited fields overwritten. `scene` and
/// `seconds` always carry over.
pub fn apply_edit(scene: &Scene, edit: &SceneEdit) -> Scene {
    fn pick(new: &Option<String>, old: &str) -> String {
        new.clone().unwrap_or_else(|| old.to_string())
    }

    Scene {
        scene: scene.scene,
        storyboard: pick(&edit.storyboard, &scene.storyboard),
        voiceover: pick(&edit.voiceover, &scene.voiceover),
        image_prompt: pick(&edit.image_prompt, &scene.image_prompt),
        character_prompt: pick(&edit.character_prompt, &scene.character_prompt),
        veo_prompt: pick(&edit.veo_prompt, &scene.veo_prompt),
        seconds: scene.seconds,
        music: pick(&edit.music, &scene.music),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::scene;

    #[test]
    fn edits_only_named_fields() {
        let original = scene(2, 12);
        let edited = apply_edit(
            &original,
            &SceneEdit::single(SceneField::Voiceover, "新的口白").set(SceneField::Music, ""),
        );
        assert_eq!(edited.voiceover, "新的口白");
        assert_eq!(edited.music, "");
        assert_eq!(edited.storyboard, original.storyboard);
        assert_eq!(edited.scene, 2);
        assert_eq!(edited.seconds, 12);
        assert_eq!(original.voiceover, "旁白 2");
    }

    #[test]
    fn identical_values_are_idempotent() {
        let original = scene(1, 8);
        let mut edit = SceneEdit::default();
        for field in SceneField::ALL {
            let value = match field {
                SceneField::Storyboard => original.storyboard.clone(),
                SceneField::Voiceover => original.voiceover.clone(),
                SceneField::Music => original.music.clone(),
                SceneField::ImagePrompt => original.image_prompt.clone(),
                SceneField::CharacterPrompt => original.character_prompt.clone(),
                SceneField::VeoPrompt => original.veo_prompt.clone(),
            };
            edit = edit.set(field, value);
        }
        assert_eq!(apply_edit(&original, &edit), original);
        assert_eq!(apply_edit(&original, &SceneEdit::default()), original);
    }

    #[test]
    fn field_names_parse_loosely() {
        assert_eq!("imagePrompt".parse::<SceneField>().unwrap(), SceneField::ImagePrompt);
        assert_eq!("veo-prompt".parse::<SceneField>().unwrap(), SceneField::VeoPrompt);
        assert_eq!("CHARACTER_PROMPT".parse::<SceneField>().unwrap(), SceneField::CharacterPrompt);
        assert!("seconds".parse::<SceneField>().is_err());
        assert!("scene".parse::<SceneField>().is_err());
    }
}
