use ai_video_script::api::GenerationBackend;
use ai_video_script::editor::{SceneEdit, SceneField};
use ai_video_script::export::{export_file_name, export_script};
use ai_video_script::generation::GenerationClient;
use ai_video_script::repository::ScriptRepository;
use ai_video_script::{Phase, ScriptError, ScriptSession, Style, TargetDuration};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const HEALTH_REPLY: &str = r#"{
  "videoType": "衛教",
  "scenes": [
    {"scene": 1, "storyboard": "護理師示範搓手", "voiceover": "洗手要搓滿二十秒。",
     "imagePrompt": "nurse demonstrating hand washing", "characterPrompt": "a friendly nurse in scrubs",
     "veoPrompt": "hands rubbing with soap foam", "seconds": 20, "music": "輕柔的背景音樂"},
    {"scene": 2, "storyboard": "沖水特寫", "voiceover": "請諮詢專業醫師或藥師。",
     "imagePrompt": "water rinsing hands", "characterPrompt": "N/A",
     "veoPrompt": "water flowing over hands", "seconds": 10, "music": "水聲"}
  ]
}"#;

struct CountingBackend {
    calls: AtomicUsize,
    saw_directive: AtomicUsize,
}

#[async_trait]
impl GenerationBackend for CountingBackend {
    fn name(&self) -> &str {
        "counting"
    }

    async fn generate_json(&self, prompt: &str, schema: &Value) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if prompt.contains("特別注意事項") {
            self.saw_directive.fetch_add(1, Ordering::SeqCst);
        }
        assert_eq!(schema["required"][1], "scenes");
        Ok(HEALTH_REPLY.to_string())
    }
}

fn backend() -> Arc<CountingBackend> {
    Arc::new(CountingBackend {
        calls: AtomicUsize::new(0),
        saw_directive: AtomicUsize::new(0),
    })
}

#[tokio::test]
async fn generate_edit_reload_export() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    let backend = backend();

    let session = ScriptSession::new(
        GenerationClient::new(backend.clone()),
        ScriptRepository::new(&data_dir),
    );
    let script = session
        .generate("兒童衛教：正確洗手", TargetDuration::Sec30, Style::Lively)
        .await
        .unwrap();
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.saw_directive.load(Ordering::SeqCst), 1);
    assert_eq!(script.total_seconds(), 30);
    assert_eq!(session.snapshot().phase, Phase::Success);

    session
        .edit_scene(
            &script.id,
            1,
            &SceneEdit::single(SceneField::Music, "流水聲與鳥鳴"),
        )
        .await
        .unwrap();

    // A fresh session over the same store sees the edit.
    let reopened = ScriptSession::new(
        GenerationClient::new(backend.clone()),
        ScriptRepository::new(&data_dir),
    );
    let saved = reopened.saved_scripts().await;
    assert_eq!(saved.len(), 1);
    let stored = &saved[0];
    assert_eq!(stored.id, script.id);
    assert_eq!(stored.created_at, script.created_at);
    assert_eq!(stored.style, Style::Lively);
    assert_eq!(stored.scenes[0], script.scenes[0]);
    assert_eq!(stored.scenes[1].music, "流水聲與鳥鳴");
    assert_eq!(stored.scenes[1].seconds, 10);

    let timings: Vec<(u32, u32)> = stored
        .scene_timings()
        .into_iter()
        .map(|t| (t.start, t.end))
        .collect();
    assert_eq!(timings, vec![(0, 20), (20, 30)]);

    let path = export_script(stored, dir.path().join("exports")).unwrap();
    assert!(path.exists());
    assert!(path.ends_with(export_file_name(stored).unwrap()));
}

#[tokio::test]
async fn sessions_keep_their_own_state() {
    let dir = tempfile::tempdir().unwrap();
    let backend = backend();
    let a = ScriptSession::new(
        GenerationClient::new(backend.clone()),
        ScriptRepository::new(dir.path().join("a")),
    );
    let b = ScriptSession::new(
        GenerationClient::new(backend.clone()),
        ScriptRepository::new(dir.path().join("b")),
    );

    let (ra, rb) = tokio::join!(
        a.generate("公司形象", TargetDuration::Sec60, Style::Professional),
        b.generate("", TargetDuration::Sec60, Style::Professional),
    );

    assert!(ra.is_ok());
    assert!(matches!(rb, Err(ScriptError::Validation(_))));
    assert_eq!(a.snapshot().phase, Phase::Success);
    assert_eq!(b.snapshot().phase, Phase::Failed);
    assert!(b.snapshot().current.is_none());
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.saw_directive.load(Ordering::SeqCst), 0);
}
