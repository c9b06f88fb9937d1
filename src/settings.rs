use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use crate::modules::history::DEFAULT_HISTORY_LIMIT;
use crate::modules::image_io::DEFAULT_JPEG_QUALITY;

const APP_DIR: &str = "slate_editor";
const MAX_RECENT_FILES: usize = 10;
pub const HISTORY_LIMIT_RANGE: std::ops::RangeInclusive<usize> = 2..=200;

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub enum ThemePreference { System, Light, Dark }

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct AppSettings {
    pub theme_preference: ThemePreference,
    pub history_limit: usize,
    pub jpeg_quality: u8,
    pub show_status_bar: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme_preference: ThemePreference::System,
            history_limit: DEFAULT_HISTORY_LIMIT,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            show_status_bar: true,
        }
    }
}

impl AppSettings {
    pub fn load() -> Self { Self::load_from(&config_path("app_settings.json")) }

    pub fn save(&self) { self.save_to(&config_path("app_settings.json")) }

    fn load_from(path: &Path) -> Self {
        let mut settings: AppSettings = read_json(path).unwrap_or_default();
        settings.sanitize();
        settings
    }

    fn save_to(&self, path: &Path) { write_json(path, self) }

    fn sanitize(&mut self) {
        self.history_limit = self.history_limit.clamp(*HISTORY_LIMIT_RANGE.start(), *HISTORY_LIMIT_RANGE.end());
        self.jpeg_quality = self.jpeg_quality.clamp(1, 100);
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct RecentFile { pub path: PathBuf, pub timestamp: i64 }

impl RecentFile {
    /// Local time of the last open or save, e.g. `2024-05-01 14:03`.
    pub fn opened_at(&self) -> String {
        chrono::DateTime::from_timestamp(self.timestamp, 0)
            .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default()
    }
}

#[derive(Serialize, Deserialize, Default, Debug)]
pub struct RecentFiles { files: Vec<RecentFile>, #[serde(skip)] store: Option<PathBuf> }

impl RecentFiles {
    pub fn load() -> Self {
        let path: PathBuf = config_path("recent_files.json");
        let mut recent: RecentFiles = read_json(&path).unwrap_or_default();
        recent.store = Some(path);
        recent
    }

    pub fn add_file(&mut self, path: PathBuf) {
        self.files.retain(|f| f.path != path);
        let timestamp: i64 = chrono::Utc::now().timestamp();
        self.files.insert(0, RecentFile { path, timestamp });
        self.files.truncate(MAX_RECENT_FILES);
        self.persist();
    }

    pub fn remove_file(&mut self, path: &Path) {
        self.files.retain(|f| f.path != path);
        self.persist();
    }

    pub fn clear(&mut self) {
        self.files.clear();
        self.persist();
    }

    pub fn get_files(&self) -> &[RecentFile] { &self.files }

    fn persist(&self) {
        if let Some(store) = &self.store { write_json(store, self); }
    }
}

fn config_path(file: &str) -> PathBuf {
    let mut path: PathBuf = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path.push(file);
    path
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Option<T> {
    let contents: String = fs::read_to_string(path).ok()?;
    serde_json::from_str(&contents)
        .inspect_err(|e| warn!(path = %path.display(), error = %e, "ignoring unreadable config"))
        .ok()
}

fn write_json<T: Serialize>(path: &Path, value: &T) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!(path = %parent.display(), error = %e, "cannot create config directory");
            return;
        }
    }
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            if let Err(e) = fs::write(path, json) { warn!(path = %path.display(), error = %e, "cannot write config"); }
        }
        Err(e) => warn!(error = %e, "cannot serialize config"),
    }
}
