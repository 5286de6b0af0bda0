use crate::error::{Result, ScriptError};
use crate::logok;
use crate::model::VideoScript;
use chrono::Local;
use once_cell::sync::OnceCell;
use regex::Regex;
use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};

pub const METADATA_SHEET: &str = "影片資訊";
pub const STORYBOARD_SHEET: &str = "分鏡腳本";
pub const FILE_SUFFIX: &str = "腳本";

const MAX_STEM_CHARS: usize = 50;
const MAX_COLUMN_WIDTH: usize = 100;

pub const SCENE_HEADERS: [&str; 8] = [
    "場景",
    "秒數",
    "分鏡腳本",
    "口白文字腳本",
    "音樂 / 音效",
    "Image Prompt (圖片生成提示詞)",
    "Character Prompt (人物生成提示詞)",
    "Veo Prompt (Veo 影片生成提示詞)",
];

fn file_stem_regex() -> Result<&'static Regex> {
    static STEM_RE: OnceCell<Regex> = OnceCell::new();
    STEM_RE.get_or_try_init(|| {
        Regex::new(r#"[\\/?%*:|"<>]"#)
            .map_err(|e| ScriptError::Export(format!("file name pattern: {e}")))
    })
}

/// Replaces characters that are illegal in file names and caps the length.
pub fn sanitize_file_stem(topic: &str) -> Result<String> {
    let cleaned = file_stem_regex()?.replace_all(topic.trim(), "-");
    let stem: String = cleaned
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_STEM_CHARS)
        .collect();
    if stem.trim().is_empty() {
        return Ok("script".to_string());
    }
    Ok(stem)
}

pub fn export_file_name(script: &VideoScript) -> Result<String> {
    Ok(format!(
        "{}-{}.xlsx",
        sanitize_file_stem(&script.topic)?,
        FILE_SUFFIX
    ))
}

pub fn metadata_rows(script: &VideoScript) -> Vec<(&'static str, String)> {
    vec![
        ("主題", script.topic.clone()),
        ("影片類型", script.video_type.clone()),
        ("風格", script.style.label().to_string()),
        (
            "建立時間",
            script
                .created_at
                .with_timezone(&Local)
                .format("%Y/%m/%d %H:%M:%S")
                .to_string(),
        ),
    ]
}

/// One row per scene, columns in the order of [`SCENE_HEADERS`].
pub fn scene_rows(script: &VideoScript) -> Vec<[String; 8]> {
    script
        .scenes
        .iter()
        .map(|s| {
            [
                s.scene.to_string(),
                s.seconds.to_string(),
                s.storyboard.clone(),
                s.voiceover.clone(),
                s.music.clone(),
                s.image_prompt.clone(),
                s.character_prompt.clone(),
                s.veo_prompt.clone(),
            ]
        })
        .collect()
}

/// Writes `<sanitized-topic>-腳本.xlsx` into `out_dir` and returns its path.
pub fn export_script<P: AsRef<Path>>(script: &VideoScript, out_dir: P) -> Result<PathBuf> {
    let out_dir = out_dir.as_ref();
    std::fs::create_dir_all(out_dir)
        .map_err(|e| ScriptError::Export(format!("create {}: {e}", out_dir.display())))?;
    let path = out_dir.join(export_file_name(script)?);

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(METADATA_SHEET)?;
        for (row, (label, value)) in metadata_rows(script).into_iter().enumerate() {
            sheet.write_string_with_format(row as u32, 0, label, &bold)?;
            sheet.write_string(row as u32, 1, value)?;
        }
        sheet.set_column_width(0, 15)?;
        sheet.set_column_width(1, 80)?;
    }

    {
        let rows = scene_rows(script);
        let sheet = workbook.add_worksheet();
        sheet.set_name(STORYBOARD_SHEET)?;
        for (col, header) in SCENE_HEADERS.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *header, &bold)?;
        }
        for (i, (row, scene)) in rows.iter().zip(&script.scenes).enumerate() {
            let r = i as u32 + 1;
            sheet.write_number(r, 0, scene.scene)?;
            sheet.write_number(r, 1, scene.seconds)?;
            for (col, text) in row.iter().enumerate().skip(2) {
                sheet.write_string(r, col as u16, text)?;
            }
        }
        for (col, header) in SCENE_HEADERS.iter().enumerate() {
            let widest = rows
                .iter()
                .map(|row| row[col].chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0);
            sheet.set_column_width(col as u16, ((widest + 5).min(MAX_COLUMN_WIDTH)) as f64)?;
        }
    }

    workbook.save(&path)?;
    logok(format!("Exported {} scenes to {}", script.scenes.len(), path.display()));
    Ok(path)
}
