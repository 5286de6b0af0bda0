use ai_video_script::api::GeminiBackend;
use ai_video_script::config::Config;
use ai_video_script::editor::{SceneEdit, SceneField};
use ai_video_script::export::export_script;
use ai_video_script::generation::GenerationClient;
use ai_video_script::model::format_timestamp;
use ai_video_script::prompt::{self, TEMPLATES};
use ai_video_script::repository::ScriptRepository;
use ai_video_script::{ScriptSession, Style, TargetDuration, VideoScript, init};
use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const PLACEHOLDER_MARK: &str = "[請填寫";

#[derive(Parser, Debug)]
#[command(name = "ai-video-script")]
#[command(about = "Generate, edit and export AI video scripts", long_about = None)]
struct Args {
    /// JSON config file (otherwise GEMINI_API_KEY / API_KEY from the environment)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new script and save it
    Generate {
        /// Video topic
        #[arg(short, long)]
        topic: Option<String>,

        /// Start from a named template (see `templates`)
        #[arg(long, conflicts_with = "topic")]
        template: Option<String>,

        /// Text replacing the template's [請填寫…] placeholder
        #[arg(long, requires = "template")]
        fill: Option<String>,

        /// Total length: 30秒, 60秒, 90秒, 3分鐘, 5分鐘
        #[arg(short, long, default_value = "60秒")]
        duration: TargetDuration,

        /// Tone: 專業, 幽默, 懸疑, 感性, 活潑
        #[arg(short, long, default_value = "專業")]
        style: Style,

        /// Also write the .xlsx export
        #[arg(long)]
        export: bool,
    },
    /// List saved scripts, newest first
    List,
    /// Print one saved script with scene timings
    Show { id: String },
    /// Overwrite one text field of one scene
    Edit {
        id: String,

        /// 1-based scene number
        #[arg(long)]
        scene: usize,

        /// storyboard, voiceover, music, imagePrompt, characterPrompt, veoPrompt
        #[arg(long)]
        field: SceneField,

        #[arg(long)]
        value: String,
    },
    /// Write a saved script to an .xlsx workbook
    Export {
        id: String,

        /// Output directory (defaults to the configured export dir)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Show the built-in topic templates
    Templates,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    // The credential is checked before any command runs.
    let cfg = match &args.config {
        Some(path) => Config::load(path).await?,
        None => Config::from_env()?,
    };
    init::ensure_directories(&cfg).await?;

    let client = GenerationClient::new(Arc::new(GeminiBackend::new(&cfg)?));
    debug!("Generation backend: {}", client.backend_name());
    let session = ScriptSession::new(client, ScriptRepository::new(&cfg.data_dir));

    match args.command {
        Command::Generate {
            topic,
            template,
            fill,
            duration,
            style,
            export,
        } => {
            let topic = resolve_topic(topic, template.as_deref(), fill.as_deref())?;
            let script = session.generate(&topic, duration, style).await?;
            print_script(&script);

            let state = session.snapshot();
            if let Some(w) = state.warning {
                warn!("腳本未能儲存：{}", w);
            } else if let Some(toast) = state.toast {
                println!("\n{}", toast.message);
            }
            if export {
                let path = export_script(&script, &cfg.export_dir)?;
                println!("Exported to {}", path.display());
            }
        }
        Command::List => {
            let scripts = session.saved_scripts().await;
            if scripts.is_empty() {
                println!("還沒有任何腳本");
            }
            for s in scripts {
                println!(
                    "{}  {}  類型: {}  風格: {}  {}",
                    s.id,
                    s.created_at.with_timezone(&Local).format("%Y/%m/%d"),
                    s.video_type,
                    s.style,
                    s.topic
                );
            }
        }
        Command::Show { id } => {
            let script = find_script(&session, &id).await?;
            session.select_script(script.clone());
            print_script(&script);
        }
        Command::Edit {
            id,
            scene,
            field,
            value,
        } => {
            let script = find_script(&session, &id).await?;
            if scene == 0 || scene > script.scenes.len() {
                bail!(
                    "scene {} does not exist; script {} has {} scenes",
                    scene,
                    id,
                    script.scenes.len()
                );
            }
            let updated = session
                .edit_scene(&id, scene - 1, &SceneEdit::single(field, value))
                .await?;
            if let Some(w) = session.snapshot().warning {
                warn!("修改未能儲存：{}", w);
            }
            print_script(&updated);
        }
        Command::Export { id, out } => {
            let script = find_script(&session, &id).await?;
            let dir = out.unwrap_or_else(|| cfg.export_dir.clone());
            let path = export_script(&script, &dir)?;
            println!("Exported to {}", path.display());
        }
        Command::Templates => {
            for (name, text) in TEMPLATES {
                println!("{name}\n    {text}");
            }
        }
    }

    Ok(())
}

fn resolve_topic(topic: Option<String>, template: Option<&str>, fill: Option<&str>) -> Result<String> {
    let Some(name) = template else {
        return Ok(topic.unwrap_or_default());
    };
    let text = prompt::template(name).with_context(|| format!("unknown template '{name}'"))?;

    let topic = match fill {
        Some(fill) => fill_placeholder(text, fill),
        None => text.to_string(),
    };
    if topic.contains(PLACEHOLDER_MARK) {
        warn!("Template placeholder left unfilled; pass --fill to replace it");
    }
    Ok(topic)
}

fn fill_placeholder(text: &str, fill: &str) -> String {
    match text.find(PLACEHOLDER_MARK) {
        Some(start) => match text[start..].find(']') {
            Some(len) => format!("{}{}{}", &text[..start], fill, &text[start + len + 1..]),
            None => text.to_string(),
        },
        None => text.to_string(),
    }
}

async fn find_script(session: &ScriptSession, id: &str) -> Result<VideoScript> {
    session
        .repository()
        .find(id)
        .await
        .with_context(|| format!("no saved script with id {id}"))
}

fn print_script(script: &VideoScript) {
    println!("{}  [{}]  影片類型：{}  風格：{}", script.id, script.topic, script.video_type, script.style);
    println!(
        "建立時間：{}  總長：{}",
        script.created_at.with_timezone(&Local).format("%Y/%m/%d %H:%M:%S"),
        format_timestamp(script.total_seconds())
    );

    for (scene, timing) in script.scenes.iter().zip(script.scene_timings()) {
        println!(
            "\n── 場景 {}  {} - {}  ({}秒)",
            scene.scene,
            format_timestamp(timing.start),
            format_timestamp(timing.end),
            scene.seconds
        );
        println!("分鏡腳本：{}", scene.storyboard);
        println!("口白：{}", scene.voiceover);
        println!("音樂 / 音效：{}", scene.music);
        println!("Image Prompt: {}", scene.image_prompt);
        if scene.has_character() {
            println!("Character Prompt: {}", scene.character_prompt);
        }
        println!("Veo Prompt: {}", scene.veo_prompt);
    }
}
