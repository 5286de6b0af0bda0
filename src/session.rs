use crate::editor::{SceneEdit, apply_edit};
use crate::error::{Result, ScriptError};
use crate::generation::GenerationClient;
use crate::model::{Scene, Style, TargetDuration, VideoScript};
use crate::repository::ScriptRepository;
use crate::{logi, logok, logw};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const EMPTY_TOPIC_MESSAGE: &str = "請輸入影片主題！";
pub const SAVED_MESSAGE: &str = "腳本已成功儲存！";
pub const UPDATED_MESSAGE: &str = "腳本已成功更新！";
pub const TOAST_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Generating,
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
}

/// What a front end needs to render one session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub phase: Phase,
    pub current: Option<VideoScript>,
    pub error: Option<String>,
    pub save_confirmation: bool,
    pub toast: Option<Toast>,
    /// Set when a write to the store failed; the workflow carried on.
    pub warning: Option<String>,
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Generating
    }
}

/// Orchestrates generate and edit requests for one user session.
///
/// At most one generation runs at a time; a second `generate` while the first
/// is pending is rejected with [`ScriptError::Busy`]. All view state lives in
/// this value, so independent sessions never share anything but the store.
pub struct ScriptSession {
    client: GenerationClient,
    repo: ScriptRepository,
    state: Arc<Mutex<SessionState>>,
    in_flight: AtomicBool,
    last_id: AtomicI64,
    toast_seq: AtomicU64,
    toast_timer: Mutex<Option<JoinHandle<()>>>,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl ScriptSession {
    pub fn new(client: GenerationClient, repo: ScriptRepository) -> Self {
        Self {
            client,
            repo,
            state: Arc::new(Mutex::new(SessionState::default())),
            in_flight: AtomicBool::new(false),
            last_id: AtomicI64::new(0),
            toast_seq: AtomicU64::new(0),
            toast_timer: Mutex::new(None),
        }
    }

    pub fn repository(&self) -> &ScriptRepository {
        &self.repo
    }

    pub fn snapshot(&self) -> SessionState {
        lock(&self.state).clone()
    }

    fn update<F: FnOnce(&mut SessionState)>(&self, f: F) {
        f(&mut *lock(&self.state));
    }

    pub async fn generate(
        &self,
        topic: &str,
        duration: TargetDuration,
        style: Style,
    ) -> Result<VideoScript> {
        // A blank topic is a validation error even while another request runs;
        // the pending request's view state is then left alone.
        if topic.trim().is_empty() {
            if !self.in_flight.load(Ordering::SeqCst) {
                self.update(|s| {
                    s.phase = Phase::Failed;
                    s.error = Some(EMPTY_TOPIC_MESSAGE.to_string());
                });
            }
            return Err(ScriptError::Validation(EMPTY_TOPIC_MESSAGE.to_string()));
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            logw("Generate ignored: another request is still running");
            return Err(ScriptError::Busy);
        }
        let _in_flight = InFlight(&self.in_flight);

        self.update(|s| {
            s.phase = Phase::Generating;
            s.current = None;
            s.error = None;
            s.save_confirmation = false;
            s.warning = None;
        });

        let fragment = match self.client.generate(topic, duration, style).await {
            Ok(fragment) => fragment,
            Err(e) => {
                let message = e.to_string();
                self.update(|s| {
                    s.phase = Phase::Failed;
                    s.error = Some(message);
                });
                return Err(e);
            }
        };

        let now = Utc::now();
        let existing = self.repo.load_all().await;
        let id = self.mint_id(now, &existing);
        let script = fragment.into_script(id, topic, now, style);

        let warning = match self.repo.append(script.clone()).await {
            Ok(_) => {
                logok(format!("Saved script {} to {}", script.id, self.repo.path().display()));
                None
            }
            Err(e) => {
                logw(format!("Script {} was not saved: {}", script.id, e));
                Some(e.to_string())
            }
        };

        self.update(|s| {
            s.phase = Phase::Success;
            s.current = Some(script.clone());
            s.save_confirmation = true;
            s.warning = warning;
        });
        self.show_toast(SAVED_MESSAGE);
        Ok(script)
    }

    /// Epoch milliseconds, bumped past anything already stored or minted here.
    fn mint_id(&self, now: DateTime<Utc>, existing: &[VideoScript]) -> String {
        let mut candidate = now
            .timestamp_millis()
            .max(self.last_id.load(Ordering::SeqCst) + 1);
        while existing.iter().any(|s| s.id == candidate.to_string()) {
            candidate += 1;
        }
        self.last_id.store(candidate, Ordering::SeqCst);
        candidate.to_string()
    }

    /// Replaces scene `scene_index` of script `script_id` and writes the script
    /// through to the store.
    ///
    /// # Panics
    /// When `scene_index` is not a position in the script's scene list.
    pub async fn update_scene(
        &self,
        script_id: &str,
        scene_index: usize,
        scene: Scene,
    ) -> Result<VideoScript> {
        let shown = self.snapshot().current.filter(|s| s.id == script_id);
        let mut script = match shown {
            Some(script) => script,
            None => self
                .repo
                .find(script_id)
                .await
                .ok_or_else(|| ScriptError::UnknownScript(script_id.to_string()))?,
        };

        assert!(
            scene_index < script.scenes.len(),
            "scene index {} out of range for script {} with {} scenes",
            scene_index,
            script_id,
            script.scenes.len()
        );
        script.scenes[scene_index] = scene;

        let warning = match self.repo.replace(script_id, script.clone()).await {
            Ok(_) => None,
            Err(e) => {
                logw(format!("Edit to script {} was not saved: {}", script_id, e));
                Some(e.to_string())
            }
        };

        self.update(|s| {
            if s.current.as_ref().is_some_and(|c| c.id == script_id) {
                s.current = Some(script.clone());
            }
            if warning.is_some() {
                s.warning = warning;
            }
        });
        logi(format!("Updated scene {} of script {}", scene_index + 1, script_id));
        self.show_toast(UPDATED_MESSAGE);
        Ok(script)
    }

    /// Applies `edit` to the stored scene and hands the result to
    /// [`update_scene`](Self::update_scene).
    pub async fn edit_scene(
        &self,
        script_id: &str,
        scene_index: usize,
        edit: &SceneEdit,
    ) -> Result<VideoScript> {
        let shown = self.snapshot().current.filter(|s| s.id == script_id);
        let script = match shown {
            Some(script) => script,
            None => self
                .repo
                .find(script_id)
                .await
                .ok_or_else(|| ScriptError::UnknownScript(script_id.to_string()))?,
        };
        let Some(old) = script.scenes.get(scene_index) else {
            panic!(
                "scene index {} out of range for script {} with {} scenes",
                scene_index,
                script_id,
                script.scenes.len()
            );
        };
        let scene = apply_edit(old, edit);
        self.update_scene(script_id, scene_index, scene).await
    }

    pub fn select_script(&self, script: VideoScript) {
        self.update(|s| {
            s.current = Some(script);
            s.error = None;
            s.save_confirmation = false;
            if s.phase != Phase::Generating {
                s.phase = Phase::Idle;
            }
        });
    }

    /// Stored scripts, newest first.
    pub async fn saved_scripts(&self) -> Vec<VideoScript> {
        self.repo.list_recent().await
    }

    /// Shows `message` and arms a fire-once dismiss timer. A newer toast
    /// cancels the older timer.
    fn show_toast(&self, message: &str) {
        let id = self.toast_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.update(|s| {
            s.toast = Some(Toast {
                id,
                message: message.to_string(),
            })
        });

        let state = Arc::clone(&self.state);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(TOAST_DURATION).await;
            let mut guard = lock(&state);
            if guard.toast.as_ref().is_some_and(|t| t.id == id) {
                guard.toast = None;
            }
        });
        if let Some(previous) = lock(&self.toast_timer).replace(timer) {
            previous.abort();
        }
    }

    pub fn dismiss_toast(&self) {
        if let Some(timer) = lock(&self.toast_timer).take() {
            timer.abort();
        }
        self.update(|s| s.toast = None);
    }
}

impl Drop for ScriptSession {
    fn drop(&mut self) {
        if let Some(timer) = lock(&self.toast_timer).take() {
            timer.abort();
        }
    }
}
