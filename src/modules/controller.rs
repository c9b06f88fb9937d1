use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use super::error::{EditorError, EditorResult};
use super::history::{DEFAULT_HISTORY_LIMIT, History};
use super::image_io::{self, DEFAULT_JPEG_QUALITY};
use super::processor::Operation;

const OPEN_LABEL: &str = "Open";

/// What the status bar shows about the open document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentStatus {
    pub file_name: String,
    pub path: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub last_operation: String,
    pub dirty: bool,
    pub undo_depth: usize,
    pub redo_depth: usize,
}

/// Owns the open image and its edit history.
///
/// The current image is always the entry under the history cursor, so there
/// is no second copy that could drift from what undo/redo restore.
pub struct EditorController {
    history: Option<History<DynamicImage>>,
    file_path: Option<PathBuf>,
    dirty: bool,
    history_limit: usize,
    jpeg_quality: u8,
}

impl Default for EditorController {
    fn default() -> Self { Self::new(DEFAULT_HISTORY_LIMIT, DEFAULT_JPEG_QUALITY) }
}

impl EditorController {
    pub fn new(history_limit: usize, jpeg_quality: u8) -> Self {
        Self { history: None, file_path: None, dirty: false, history_limit, jpeg_quality }
    }

    pub fn open(&mut self, path: &Path) -> EditorResult<&DynamicImage> {
        let img: DynamicImage = image_io::load_image(path).inspect_err(|e| warn!(path = %path.display(), error = %e, "open failed"))?;
        self.load(img, Some(path.to_path_buf()));
        self.current()
    }

    /// Starts a fresh history from an in-memory image.
    pub fn load(&mut self, img: DynamicImage, path: Option<PathBuf>) {
        match &mut self.history {
            Some(history) => history.reset(img, OPEN_LABEL),
            None => self.history = Some(History::new(img, OPEN_LABEL, self.history_limit)),
        }
        self.file_path = path;
        self.dirty = false;
    }

    pub fn save(&mut self, path: &Path) -> EditorResult<()> {
        let img: &DynamicImage = self.current()?;
        image_io::save_image(img, path, self.jpeg_quality).inspect_err(|e| warn!(path = %path.display(), error = %e, "save failed"))?;
        self.file_path = Some(path.to_path_buf());
        self.dirty = false;
        Ok(())
    }

    /// Saves back to the file the image came from. `Ok(false)` means there is
    /// no such file yet and the caller has to ask for a path.
    pub fn save_current(&mut self) -> EditorResult<bool> {
        self.current()?;
        match self.file_path.clone() {
            Some(path) => self.save(&path).map(|_| true),
            None => Ok(false),
        }
    }

    pub fn apply(&mut self, operation: Operation) -> EditorResult<&DynamicImage> {
        self.apply_all(&[operation])
    }

    /// Applies `operations` in order and records the result as one step.
    pub fn apply_all(&mut self, operations: &[Operation]) -> EditorResult<&DynamicImage> {
        if operations.is_empty() { return self.current(); }
        let result: DynamicImage = self.preview(operations)?;
        let label: String = operations.iter().map(Operation::label).collect::<Vec<_>>().join(", ");
        let history: &mut History<DynamicImage> = self.history.as_mut().ok_or(EditorError::NoImage)?;
        history.record(result, label);
        self.dirty = true;
        info!(operation = history.current_label(), cursor = history.cursor(), len = history.len(), "applied edit");
        Ok(history.current())
    }

    /// Runs `operations` on the current image without touching history.
    pub fn preview(&self, operations: &[Operation]) -> EditorResult<DynamicImage> {
        let current: &DynamicImage = self.current()?;
        let mut result: Option<DynamicImage> = None;
        for op in operations {
            let src: &DynamicImage = result.as_ref().unwrap_or(current);
            result = Some(op.apply(src).inspect_err(|e| warn!(operation = %op.label(), error = %e, "operation rejected"))?);
        }
        Ok(result.unwrap_or_else(|| current.clone()))
    }

    /// `Ok(None)` when there is nothing left to undo.
    pub fn undo(&mut self) -> EditorResult<Option<&DynamicImage>> {
        let history: &mut History<DynamicImage> = self.history.as_mut().ok_or(EditorError::NoImage)?;
        if !history.can_undo() { return Ok(None); }
        self.dirty = true;
        Ok(history.undo())
    }

    /// `Ok(None)` when there is nothing left to redo.
    pub fn redo(&mut self) -> EditorResult<Option<&DynamicImage>> {
        let history: &mut History<DynamicImage> = self.history.as_mut().ok_or(EditorError::NoImage)?;
        if !history.can_redo() { return Ok(None); }
        self.dirty = true;
        Ok(history.redo())
    }

    pub fn current(&self) -> EditorResult<&DynamicImage> {
        self.history.as_ref().map(History::current).ok_or(EditorError::NoImage)
    }

    pub fn has_image(&self) -> bool { self.history.is_some() }
    pub fn is_dirty(&self) -> bool { self.dirty }
    pub fn file_path(&self) -> Option<&Path> { self.file_path.as_deref() }

    pub fn can_undo(&self) -> bool { self.history.as_ref().is_some_and(History::can_undo) }
    pub fn can_redo(&self) -> bool { self.history.as_ref().is_some_and(History::can_redo) }
    pub fn undo_label(&self) -> Option<&str> { self.history.as_ref().and_then(History::undo_label) }
    pub fn redo_label(&self) -> Option<&str> { self.history.as_ref().and_then(History::redo_label) }

    pub fn set_history_limit(&mut self, limit: usize) {
        self.history_limit = limit;
        if let Some(history) = &mut self.history {
            history.set_limit(limit);
            debug!(limit = history.limit(), len = history.len(), "history limit changed");
        }
    }

    pub fn set_jpeg_quality(&mut self, quality: u8) { self.jpeg_quality = quality; }

    pub fn status(&self) -> Option<DocumentStatus> {
        let history: &History<DynamicImage> = self.history.as_ref()?;
        let img: &DynamicImage = history.current();
        let file_name: String = self.file_path.as_ref()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("Untitled")
            .to_string();
        Some(DocumentStatus {
            file_name,
            path: self.file_path.clone(),
            width: img.width(),
            height: img.height(),
            last_operation: history.current_label().to_string(),
            dirty: self.dirty,
            undo_depth: history.undo_depth(),
            redo_depth: history.redo_depth(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::processor::{FlipAxis, Rotation};
    use image::{Rgb, RgbImage};

    fn image_a() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(100, 100, |x, y| Rgb([(x * 2) as u8, (y * 2) as u8, ((x * y) % 200) as u8])))
    }

    fn loaded() -> EditorController {
        let mut c = EditorController::default();
        c.load(image_a(), None);
        c
    }

    fn bytes(c: &EditorController) -> Vec<u8> { c.current().unwrap().as_bytes().to_vec() }

    #[test]
    fn everything_needs_an_image() {
        let mut c = EditorController::default();
        assert!(matches!(c.apply(Operation::Grayscale), Err(EditorError::NoImage)));
        assert!(matches!(c.undo(), Err(EditorError::NoImage)));
        assert!(matches!(c.redo(), Err(EditorError::NoImage)));
        assert!(matches!(c.save(Path::new("x.png")), Err(EditorError::NoImage)));
        assert!(matches!(c.save_current(), Err(EditorError::NoImage)));
        assert!(c.status().is_none());
    }

    #[test]
    fn brightness_blur_undo_scenario() {
        let mut c = loaded();
        let original = bytes(&c);
        c.apply(Operation::Brightness { offset: 50.0 }).unwrap();
        let brightened = bytes(&c);
        c.apply(Operation::Blur { radius: 3.0 }).unwrap();
        assert_ne!(bytes(&c), brightened);

        assert_eq!(c.undo().unwrap().unwrap().as_bytes(), &brightened[..]);
        assert_eq!(c.undo().unwrap().unwrap().as_bytes(), &original[..]);
        assert!(c.undo().unwrap().is_none());
        assert_eq!(bytes(&c), original);
        assert_eq!(c.current().unwrap().width(), 100);
    }

    #[test]
    fn redo_restores_undone_edit() {
        let mut c = loaded();
        c.apply(Operation::Contrast { scale: 1.8 }).unwrap();
        let edited = bytes(&c);
        c.undo().unwrap();
        assert_eq!(c.redo().unwrap().unwrap().as_bytes(), &edited[..]);
        assert!(c.redo().unwrap().is_none());
    }

    #[test]
    fn new_edit_after_undo_drops_redo() {
        let mut c = loaded();
        c.apply(Operation::Grayscale).unwrap();
        c.apply(Operation::Flip(FlipAxis::Vertical)).unwrap();
        c.undo().unwrap();
        c.undo().unwrap();
        c.apply(Operation::Rotate(Rotation::Cw90)).unwrap();
        assert!(!c.can_redo());
        assert!(c.redo().unwrap().is_none());
        assert_eq!(c.undo_label(), Some("Rotate 90°"));
    }

    #[test]
    fn rejected_operation_leaves_state_alone() {
        let mut c = loaded();
        let before = bytes(&c);
        let err = c.apply(Operation::Contrast { scale: 0.0 }).unwrap_err();
        assert!(matches!(err, EditorError::InvalidParameter(_)));
        assert_eq!(bytes(&c), before);
        assert!(!c.can_undo());
        assert!(!c.is_dirty());
    }

    #[test]
    fn chained_edit_is_one_step() {
        let mut c = loaded();
        c.apply_all(&[Operation::Brightness { offset: 20.0 }, Operation::Contrast { scale: 1.5 }]).unwrap();
        assert_eq!(c.status().unwrap().undo_depth, 1);
        assert_eq!(c.undo_label(), Some("Brightness (+20), Contrast (x1.50)"));
        c.undo().unwrap();
        assert!(!c.can_undo());
    }

    #[test]
    fn preview_does_not_record() {
        let c = loaded();
        let preview = c.preview(&[Operation::Brightness { offset: 100.0 }]).unwrap();
        assert_ne!(preview.as_bytes(), c.current().unwrap().as_bytes());
        assert!(!c.can_undo());
        assert_eq!(c.preview(&[]).unwrap().as_bytes(), c.current().unwrap().as_bytes());
    }

    #[test]
    fn history_limit_applies_to_open_document() {
        let mut c = EditorController::new(3, DEFAULT_JPEG_QUALITY);
        c.load(image_a(), None);
        for _ in 0..5 { c.apply(Operation::Flip(FlipAxis::Horizontal)).unwrap(); }
        assert_eq!(c.status().unwrap().undo_depth, 2);
        c.set_history_limit(2);
        assert_eq!(c.status().unwrap().undo_depth, 1);
    }

    #[test]
    fn open_edit_save_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.png");
        image_io::save_image(&image_a(), &src, DEFAULT_JPEG_QUALITY).unwrap();

        let mut c = EditorController::default();
        c.open(&src).unwrap();
        let status = c.status().unwrap();
        assert_eq!(status.file_name, "a.png");
        assert_eq!((status.width, status.height), (100, 100));
        assert_eq!(status.last_operation, "Open");
        assert!(!status.dirty);

        c.apply(Operation::Resize { width: 40, height: 20 }).unwrap();
        assert!(c.is_dirty());
        assert!(c.save_current().unwrap());
        assert!(!c.is_dirty());
        let reopened = image_io::load_image(&src).unwrap();
        assert_eq!((reopened.width(), reopened.height()), (40, 20));

        let copy = dir.path().join("copy.bmp");
        c.save(&copy).unwrap();
        assert_eq!(c.file_path(), Some(copy.as_path()));
    }

    #[test]
    fn opening_resets_history() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.png");
        image_io::save_image(&image_a(), &src, DEFAULT_JPEG_QUALITY).unwrap();

        let mut c = loaded();
        c.apply(Operation::Grayscale).unwrap();
        c.open(&src).unwrap();
        assert!(!c.can_undo());
        assert!(!c.can_redo());
    }

    #[test]
    fn failed_open_keeps_current_document() {
        let mut c = loaded();
        c.apply(Operation::Grayscale).unwrap();
        let before = bytes(&c);
        assert!(matches!(c.open(Path::new("missing/file.png")), Err(EditorError::Io(_))));
        assert!(matches!(c.open(Path::new("notes.txt")), Err(EditorError::UnsupportedFormat(_))));
        assert_eq!(bytes(&c), before);
        assert!(c.can_undo());
    }

    #[test]
    fn unsaved_document_needs_a_path() {
        let mut c = loaded();
        assert!(!c.save_current().unwrap());
    }
}
