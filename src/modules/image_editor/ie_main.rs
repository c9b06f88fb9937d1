use eframe::egui;
use image::DynamicImage;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use crate::modules::controller::EditorController;
use crate::modules::error::{EditorError, EditorResult};
use crate::modules::image_io::ImageFormat;
use crate::modules::processor::{MAX_DIMENSION, MIN_BLUR_RADIUS, Operation};

pub(super) const BLUR_RANGE: RangeInclusive<f32> = 0.0..=20.0;
pub(super) const BRIGHTNESS_RANGE: RangeInclusive<f32> = -100.0..=100.0;
pub(super) const CONTRAST_RANGE: RangeInclusive<f32> = 0.5..=3.0;
pub(super) const EDGE_RANGE: RangeInclusive<f32> = 0.0..=500.0;
pub(super) const SIZE_RANGE: RangeInclusive<u32> = 1..=MAX_DIMENSION;

const DEFAULT_EDGE_LOW: f32 = 50.0;
const DEFAULT_EDGE_HIGH: f32 = 150.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoticeKind { Info, Warning, Error }

/// A message waiting to be shown in a dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice { pub kind: NoticeKind, pub title: String, pub message: String }

impl Notice {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Info, title: title.into(), message: message.into() }
    }

    pub fn from_error(err: &EditorError) -> Self {
        let kind: NoticeKind = match err {
            EditorError::InvalidParameter(_) | EditorError::NoImage => NoticeKind::Warning,
            EditorError::UnsupportedFormat(_) | EditorError::Io(_) => NoticeKind::Error,
        };
        let message: String = match err {
            EditorError::NoImage => "Please open an image first.".to_string(),
            other => other.to_string(),
        };
        Self { kind, title: err.title().to_string(), message }
    }
}

/// Which slider group the canvas preview currently reflects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum PreviewSource { Blur, Adjust }

pub struct ImageEditor {
    pub(super) controller: EditorController,
    pub(super) texture: Option<egui::TextureHandle>,
    pub(super) texture_dirty: bool,
    pub(super) preview: Option<(PreviewSource, DynamicImage)>,
    pub(super) blur_radius: f32,
    pub(super) brightness: f32,
    pub(super) contrast: f32,
    pub(super) edge_low: f32,
    pub(super) edge_high: f32,
    pub(super) resize_w: u32,
    pub(super) resize_h: u32,
    pub(super) resize_locked: bool,
    pub(super) notice: Option<Notice>,
    file_callback: Option<Box<dyn Fn(PathBuf) + Send + Sync>>,
}

impl ImageEditor {
    pub fn new(history_limit: usize, jpeg_quality: u8) -> Self {
        Self {
            controller: EditorController::new(history_limit, jpeg_quality),
            texture: None,
            texture_dirty: false,
            preview: None,
            blur_radius: 0.0,
            brightness: 0.0,
            contrast: 1.0,
            edge_low: DEFAULT_EDGE_LOW,
            edge_high: DEFAULT_EDGE_HIGH,
            resize_w: 1,
            resize_h: 1,
            resize_locked: true,
            notice: None,
            file_callback: None,
        }
    }

    /// Called with the path of every file that was opened or saved.
    pub fn set_file_callback(&mut self, callback: Box<dyn Fn(PathBuf) + Send + Sync>) { self.file_callback = Some(callback); }

    pub fn controller(&self) -> &EditorController { &self.controller }
    pub fn is_dirty(&self) -> bool { self.controller.is_dirty() }
    pub fn has_image(&self) -> bool { self.controller.has_image() }
    pub fn set_history_limit(&mut self, limit: usize) { self.controller.set_history_limit(limit); }
    pub fn set_jpeg_quality(&mut self, quality: u8) { self.controller.set_jpeg_quality(quality); }
    pub fn show_notice(&mut self, notice: Notice) { self.notice = Some(notice); }

    pub(super) fn report(&mut self, err: EditorError) { self.notice = Some(Notice::from_error(&err)); }

    fn notify_file(&self, path: PathBuf) {
        if let Some(callback) = &self.file_callback { callback(path); }
    }

    pub fn open_path(&mut self, path: PathBuf) -> bool {
        let (w, h) = match self.controller.open(&path) {
            Ok(img) => (img.width(), img.height()),
            Err(e) => { self.report(e); return false; }
        };
        self.resize_w = w;
        self.resize_h = h;
        self.reset_sliders();
        self.texture_dirty = true;
        self.notify_file(path);
        true
    }

    pub fn open_dialog(&mut self) -> bool {
        let extensions: Vec<&str> = ImageFormat::all_extensions();
        match rfd::FileDialog::new().set_title("Open Image").add_filter("Image files", extensions.as_slice()).pick_file() {
            Some(path) => self.open_path(path),
            None => false,
        }
    }

    /// Saves to the file the image came from, or asks for one.
    pub fn save(&mut self) -> bool {
        match self.controller.save_current() {
            Ok(true) => {
                self.notice = Some(Notice::info("Saved", "Image saved successfully."));
                if let Some(path) = self.controller.file_path() { self.notify_file(path.to_path_buf()); }
                true
            }
            Ok(false) => self.save_as(),
            Err(e) => { self.report(e); false }
        }
    }

    pub fn save_as(&mut self) -> bool {
        if !self.has_image() { self.report(EditorError::NoImage); return false; }
        let mut dialog: rfd::FileDialog = rfd::FileDialog::new().set_title("Save Image As");
        for format in ImageFormat::all() {
            dialog = dialog.add_filter(format.as_str(), format.extensions());
        }
        let file_name: String = self.controller.file_path()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| "untitled.png".to_string());
        match dialog.set_file_name(file_name).save_file() {
            Some(mut path) => {
                if path.extension().is_none() { path.set_extension(ImageFormat::Png.extension()); }
                self.save_to(path)
            }
            None => false,
        }
    }

    pub(super) fn save_to(&mut self, path: PathBuf) -> bool {
        match self.controller.save(&path) {
            Ok(()) => {
                self.notice = Some(Notice::info("Saved", "Image saved successfully."));
                self.notify_file(path);
                true
            }
            Err(e) => { self.report(e); false }
        }
    }

    pub fn apply(&mut self, operation: Operation) -> bool {
        let size: EditorResult<(u32, u32)> = self.controller.apply(operation).map(|img| (img.width(), img.height()));
        self.after_apply(size)
    }

    fn apply_chain(&mut self, operations: &[Operation]) -> bool {
        let size: EditorResult<(u32, u32)> = self.controller.apply_all(operations).map(|img| (img.width(), img.height()));
        self.after_apply(size)
    }

    fn after_apply(&mut self, size: EditorResult<(u32, u32)>) -> bool {
        match size {
            Ok((w, h)) => {
                self.resize_w = w;
                self.resize_h = h;
                self.preview = None;
                self.texture_dirty = true;
                true
            }
            Err(e) => { self.report(e); false }
        }
    }

    pub fn apply_blur(&mut self) {
        if !self.has_image() { return self.report(EditorError::NoImage); }
        if self.blur_radius < MIN_BLUR_RADIUS {
            self.notice = Some(Notice::info("Blur", format!("Move the blur slider to at least {MIN_BLUR_RADIUS} first.")));
            return;
        }
        if self.apply(Operation::Blur { radius: self.blur_radius }) { self.blur_radius = 0.0; }
    }

    pub fn apply_brightness_contrast(&mut self) {
        if !self.has_image() { return self.report(EditorError::NoImage); }
        let operations: Vec<Operation> = self.adjust_operations();
        if operations.is_empty() {
            self.notice = Some(Notice::info("Brightness / Contrast", "The sliders are at their neutral positions."));
            return;
        }
        if self.apply_chain(&operations) {
            self.brightness = 0.0;
            self.contrast = 1.0;
        }
    }

    pub fn apply_edges(&mut self) -> bool { self.apply(Operation::Edges { low: self.edge_low, high: self.edge_high }) }

    pub fn apply_resize(&mut self) -> bool { self.apply(Operation::Resize { width: self.resize_w, height: self.resize_h }) }

    pub fn undo(&mut self) {
        match self.controller.undo() {
            Ok(Some(img)) => {
                let (w, h) = (img.width(), img.height());
                self.after_history_move(w, h);
            }
            Ok(None) => self.notice = Some(Notice::info("Undo", "Nothing to undo.")),
            Err(e) => self.report(e),
        }
    }

    pub fn redo(&mut self) {
        match self.controller.redo() {
            Ok(Some(img)) => {
                let (w, h) = (img.width(), img.height());
                self.after_history_move(w, h);
            }
            Ok(None) => self.notice = Some(Notice::info("Redo", "Nothing to redo.")),
            Err(e) => self.report(e),
        }
    }

    fn after_history_move(&mut self, w: u32, h: u32) {
        self.resize_w = w;
        self.resize_h = h;
        self.reset_sliders();
        self.texture_dirty = true;
    }

    pub fn reset_sliders(&mut self) {
        self.blur_radius = 0.0;
        self.brightness = 0.0;
        self.contrast = 1.0;
        if self.preview.take().is_some() { self.texture_dirty = true; }
    }

    pub(super) fn adjust_operations(&self) -> Vec<Operation> {
        let mut operations: Vec<Operation> = Vec::with_capacity(2);
        if self.brightness != 0.0 { operations.push(Operation::Brightness { offset: self.brightness }); }
        if self.contrast != 1.0 { operations.push(Operation::Contrast { scale: self.contrast }); }
        operations
    }

    /// Recomputes the canvas preview after a slider in `source` moved.
    pub(super) fn refresh_preview(&mut self, source: PreviewSource) {
        if !self.has_image() { return; }
        let operations: Vec<Operation> = match source {
            PreviewSource::Blur if self.blur_radius >= MIN_BLUR_RADIUS => vec![Operation::Blur { radius: self.blur_radius }],
            PreviewSource::Blur => Vec::new(),
            PreviewSource::Adjust => self.adjust_operations(),
        };
        self.texture_dirty = true;
        if operations.is_empty() {
            self.preview = None;
            return;
        }
        match self.controller.preview(&operations) {
            Ok(img) => self.preview = Some((source, img)),
            Err(e) => { self.preview = None; self.report(e); }
        }
    }

    /// The image the canvas should show: the live preview if any, else the current buffer.
    pub(super) fn displayed(&self) -> Option<&DynamicImage> {
        match &self.preview {
            Some((_, img)) => Some(img),
            None => self.controller.current().ok(),
        }
    }

    /// Keeps the other side in proportion when the lock is on.
    pub(super) fn sync_resize(&mut self, width_changed: bool) {
        if !self.resize_locked { return; }
        let Some(img) = self.controller.current().ok() else { return };
        let (w, h) = (img.width() as f64, img.height() as f64);
        if width_changed {
            self.resize_h = ((self.resize_w as f64 * h / w).round() as u32).clamp(*SIZE_RANGE.start(), *SIZE_RANGE.end());
        } else {
            self.resize_w = ((self.resize_h as f64 * w / h).round() as u32).clamp(*SIZE_RANGE.start(), *SIZE_RANGE.end());
        }
    }

    pub(super) fn ensure_texture(&mut self, ctx: &egui::Context) {
        if !self.texture_dirty { return; }
        self.texture_dirty = false;
        let color_image: egui::ColorImage = match self.displayed() {
            Some(img) => {
                let rgba = img.to_rgba8();
                egui::ColorImage::from_rgba_unmultiplied([rgba.width() as usize, rgba.height() as usize], rgba.as_raw())
            }
            None => { self.texture = None; return; }
        };
        match &mut self.texture {
            Some(texture) => texture.set(color_image, egui::TextureOptions::LINEAR),
            None => self.texture = Some(ctx.load_texture("slate_canvas", color_image, egui::TextureOptions::LINEAR)),
        }
    }

    /// Ctrl+S, Ctrl+Shift+S, Ctrl+Z, Ctrl+Y and Ctrl+Shift+Z.
    pub fn handle_keyboard(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() { return; }
        let (save_as, save, redo, undo) = ctx.input_mut(|i| {
            // Shifted variants first: a plain Ctrl match also accepts Shift.
            let save_as: bool = i.consume_key(egui::Modifiers::CTRL | egui::Modifiers::SHIFT, egui::Key::S);
            let save: bool = i.consume_key(egui::Modifiers::CTRL, egui::Key::S);
            let redo: bool = i.consume_key(egui::Modifiers::CTRL | egui::Modifiers::SHIFT, egui::Key::Z)
                || i.consume_key(egui::Modifiers::CTRL, egui::Key::Y);
            let undo: bool = i.consume_key(egui::Modifiers::CTRL, egui::Key::Z);
            (save_as, save, redo, undo)
        });
        if save_as {
            self.save_as();
        } else if save {
            self.save();
        }
        if redo {
            self.redo();
        } else if undo {
            self.undo();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::history::DEFAULT_HISTORY_LIMIT;
    use crate::modules::image_io::DEFAULT_JPEG_QUALITY;
    use crate::modules::processor::Rotation;
    use image::{Rgb, RgbImage};
    use std::sync::{Arc, Mutex};

    fn editor_with_image(w: u32, h: u32) -> (ImageEditor, tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pic.png");
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| Rgb([(x * 3) as u8, (y * 3) as u8, 90])));
        img.save(&path).unwrap();
        let mut editor = ImageEditor::new(DEFAULT_HISTORY_LIMIT, DEFAULT_JPEG_QUALITY);
        assert!(editor.open_path(path.clone()));
        (editor, dir, path)
    }

    #[test]
    fn open_failure_becomes_error_notice() {
        let mut editor = ImageEditor::new(DEFAULT_HISTORY_LIMIT, DEFAULT_JPEG_QUALITY);
        assert!(!editor.open_path(PathBuf::from("does/not/exist.png")));
        let notice = editor.notice.take().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.title, "File Error");
        assert!(!editor.has_image());
    }

    #[test]
    fn open_seeds_resize_fields_and_notifies() {
        let seen: Arc<Mutex<Vec<PathBuf>>> = Arc::new(Mutex::new(Vec::new()));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        DynamicImage::ImageRgb8(RgbImage::new(40, 25)).save(&path).unwrap();

        let mut editor = ImageEditor::new(DEFAULT_HISTORY_LIMIT, DEFAULT_JPEG_QUALITY);
        let sink = Arc::clone(&seen);
        editor.set_file_callback(Box::new(move |p| sink.lock().unwrap().push(p)));
        assert!(editor.open_path(path.clone()));
        assert_eq!((editor.resize_w, editor.resize_h), (40, 25));
        assert!(editor.texture_dirty);
        assert_eq!(seen.lock().unwrap().as_slice(), &[path]);
    }

    #[test]
    fn undo_at_start_is_an_info_notice() {
        let (mut editor, _dir, _) = editor_with_image(10, 10);
        editor.undo();
        let notice = editor.notice.take().unwrap();
        assert_eq!(notice.kind, NoticeKind::Info);
        assert_eq!(notice.message, "Nothing to undo.");
        editor.redo();
        assert_eq!(editor.notice.take().unwrap().message, "Nothing to redo.");
    }

    #[test]
    fn actions_without_image_warn() {
        let mut editor = ImageEditor::new(DEFAULT_HISTORY_LIMIT, DEFAULT_JPEG_QUALITY);
        editor.apply(Operation::Grayscale);
        let notice = editor.notice.take().unwrap();
        assert_eq!(notice.kind, NoticeKind::Warning);
        assert_eq!(notice.title, "No Image");
        editor.blur_radius = 4.0;
        editor.apply_blur();
        assert_eq!(editor.notice.take().unwrap().kind, NoticeKind::Warning);
    }

    #[test]
    fn slider_preview_does_not_touch_history() {
        let (mut editor, _dir, _) = editor_with_image(12, 12);
        editor.brightness = 40.0;
        editor.refresh_preview(PreviewSource::Adjust);
        assert!(matches!(editor.preview, Some((PreviewSource::Adjust, _))));
        assert!(!editor.controller.can_undo());
        assert_ne!(editor.displayed().unwrap().as_bytes(), editor.controller.current().unwrap().as_bytes());

        editor.brightness = 0.0;
        editor.refresh_preview(PreviewSource::Adjust);
        assert!(editor.preview.is_none());
    }

    #[test]
    fn applying_adjustments_records_one_step_and_resets_sliders() {
        let (mut editor, _dir, _) = editor_with_image(12, 12);
        editor.brightness = 25.0;
        editor.contrast = 1.4;
        editor.refresh_preview(PreviewSource::Adjust);
        editor.apply_brightness_contrast();
        assert!(editor.preview.is_none());
        assert_eq!((editor.brightness, editor.contrast), (0.0, 1.0));
        assert_eq!(editor.controller.status().unwrap().undo_depth, 1);
        assert_eq!(editor.controller.undo_label(), Some("Brightness (+25), Contrast (x1.40)"));
    }

    #[test]
    fn neutral_sliders_apply_nothing() {
        let (mut editor, _dir, _) = editor_with_image(12, 12);
        editor.apply_brightness_contrast();
        assert_eq!(editor.notice.take().unwrap().kind, NoticeKind::Info);
        editor.apply_blur();
        assert_eq!(editor.notice.take().unwrap().kind, NoticeKind::Info);
        editor.blur_radius = 0.2;
        editor.apply_blur();
        assert_eq!(editor.notice.take().unwrap().kind, NoticeKind::Info);
        assert!(!editor.controller.can_undo());
    }

    #[test]
    fn rotation_updates_resize_fields_and_undo_restores_them() {
        let (mut editor, _dir, _) = editor_with_image(30, 10);
        editor.apply(Operation::Rotate(Rotation::Cw90));
        assert_eq!((editor.resize_w, editor.resize_h), (10, 30));
        editor.undo();
        assert_eq!((editor.resize_w, editor.resize_h), (30, 10));
        assert!(editor.notice.is_none());
    }

    #[test]
    fn locked_resize_keeps_aspect() {
        let (mut editor, _dir, _) = editor_with_image(40, 20);
        editor.resize_w = 100;
        editor.sync_resize(true);
        assert_eq!(editor.resize_h, 50);
        editor.resize_locked = false;
        editor.resize_h = 7;
        editor.sync_resize(false);
        assert_eq!(editor.resize_w, 100);
        editor.apply_resize();
        assert_eq!(editor.controller.current().unwrap().height(), 7);
    }

    #[test]
    fn save_to_reports_success_and_clears_dirty() {
        let (mut editor, dir, _) = editor_with_image(8, 8);
        editor.apply(Operation::Grayscale);
        assert!(editor.is_dirty());
        assert!(editor.save_to(dir.path().join("out.bmp")));
        assert!(!editor.is_dirty());
        assert_eq!(editor.notice.take().unwrap().title, "Saved");

        assert!(!editor.save_to(dir.path().join("out.gif")));
        assert_eq!(editor.notice.take().unwrap().title, "Unsupported Format");
    }
}
