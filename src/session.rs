// ============================================================================
// SESSION — caller-owned editing context with bounded undo
// ============================================================================

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::io::{self, IoError, SaveFormat};
use crate::ops::{self, TransformError, TransformParameters};
use crate::raster::Raster;
use crate::settings::Settings;

pub const DEFAULT_MAX_UNDO_STEPS: usize = 20;

/// One image being edited: the raster as loaded, the raster as it stands
/// now, and the snapshots needed to step back.
pub struct Session {
    source_path: Option<PathBuf>,
    original: Raster,
    current: Raster,
    undo_stack: VecDeque<Raster>,
    steps: Vec<&'static str>,
    max_undo_steps: usize,
    /// Set once a step falls out of the undo history.
    committed: bool,
}

impl Session {
    pub fn new(source_path: Option<PathBuf>, raster: Raster) -> Self {
        Self {
            source_path,
            original: raster.clone(),
            current: raster,
            undo_stack: VecDeque::new(),
            steps: Vec::new(),
            max_undo_steps: DEFAULT_MAX_UNDO_STEPS,
            committed: false,
        }
    }

    /// Load `path` and start a session on it.
    pub fn open(path: &Path) -> Result<Self, IoError> {
        let raster = io::load_raster(path)?;
        crate::log_info!(
            "Opened {} ({}x{}, {} channels)",
            path.display(),
            raster.width(),
            raster.height(),
            raster.channels()
        );
        Ok(Self::new(Some(path.to_path_buf()), raster))
    }

    pub fn with_max_undo_steps(mut self, max: usize) -> Self {
        self.max_undo_steps = max;
        self.trim_history();
        self
    }

    /// Apply a transform to the current raster. On failure nothing changes.
    pub fn apply(&mut self, params: &TransformParameters) -> Result<(), TransformError> {
        let next = ops::apply(&self.current, params)?;
        let prev = std::mem::replace(&mut self.current, next);
        self.undo_stack.push_back(prev);
        self.steps.push(params.name());
        self.trim_history();
        crate::log_info!("Applied {}", params.name());
        Ok(())
    }

    /// Step back one transform. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.undo_stack.pop_back() {
            Some(prev) => {
                self.current = prev;
                self.steps.pop();
                true
            }
            None => false,
        }
    }

    /// Discard every modification and return to the raster as loaded.
    pub fn revert(&mut self) {
        self.current = self.original.clone();
        self.undo_stack.clear();
        self.steps.clear();
        self.committed = false;
    }

    pub fn is_modified(&self) -> bool {
        self.committed || !self.steps.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn current(&self) -> &Raster {
        &self.current
    }

    pub fn original(&self) -> &Raster {
        &self.original
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Names of the transforms that can still be undone, oldest first.
    pub fn steps(&self) -> &[&'static str] {
        &self.steps
    }

    pub fn save(&self, path: &Path, format: SaveFormat, quality: u8) -> Result<(), IoError> {
        io::save_raster(&self.current, path, format, quality)?;
        crate::log_info!("Saved {}", path.display());
        Ok(())
    }

    /// Save next to the source file using the configured suffix. The source's
    /// own format is kept when it is writable, else the configured default.
    /// Returns the written path.
    pub fn save_default(&self, settings: &Settings) -> Result<PathBuf, IoError> {
        let source = self
            .source_path
            .as_deref()
            .ok_or_else(|| IoError::Write("session has no source path".to_string()))?;
        let format = io::source_format(source, settings.default_format);
        let path = io::modified_path(source, &settings.output_suffix, format);
        self.save(&path, format, settings.jpeg_quality)?;
        Ok(path)
    }

    fn trim_history(&mut self) {
        let excess = self.undo_stack.len().saturating_sub(self.max_undo_steps);
        self.undo_stack.drain(..excess);
        let excess = self.steps.len().saturating_sub(self.max_undo_steps);
        if excess > 0 {
            self.steps.drain(..excess);
            self.committed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{Color, Preset};

    fn session() -> Session {
        let r = Raster::from_rgb(2, 1, &[200, 10, 10, 5, 5, 5]).unwrap();
        Session::new(None, r)
    }

    #[test]
    fn apply_then_undo_restores_previous() {
        let mut s = session();
        s.apply(&TransformParameters::Grayscale).unwrap();
        assert!(s.is_modified());
        assert_ne!(s.current(), s.original());
        assert!(s.undo());
        assert_eq!(s.current(), s.original());
        assert!(!s.is_modified());
        assert!(!s.undo());
    }

    #[test]
    fn revert_discards_all_steps() {
        let mut s = session();
        s.apply(&TransformParameters::Preset(Preset::Sepia)).unwrap();
        s.apply(&TransformParameters::background_replace(Color::new(0, 255, 0))).unwrap();
        assert_eq!(s.steps(), &["preset", "background"]);
        s.revert();
        assert_eq!(s.current(), s.original());
        assert!(!s.can_undo());
    }

    #[test]
    fn failed_apply_keeps_state() {
        let mut s = session();
        s.apply(&TransformParameters::Grayscale).unwrap();
        let before = s.current().clone();
        let bad = TransformParameters::ContrastBrightness { contrast: 9.0, brightness: 1.0 };
        assert!(s.apply(&bad).is_err());
        assert_eq!(s.current(), &before);
        assert_eq!(s.steps(), &["grayscale"]);
    }

    #[test]
    fn history_is_bounded() {
        let mut s = session().with_max_undo_steps(2);
        for _ in 0..4 {
            s.apply(&TransformParameters::Transparency { level: 10 }).unwrap();
        }
        assert_eq!(s.steps().len(), 2);
        assert!(s.undo());
        assert!(s.undo());
        assert!(!s.undo());
        assert!(s.steps().is_empty());
        // Two steps can no longer be undone, so the image is still edited.
        assert!(s.is_modified());
        assert_ne!(s.current(), s.original());
        s.revert();
        assert!(!s.is_modified());
    }

    #[test]
    fn zero_history_still_tracks_modification() {
        let mut s = session().with_max_undo_steps(0);
        s.apply(&TransformParameters::Grayscale).unwrap();
        assert!(!s.can_undo());
        assert!(s.steps().is_empty());
        assert!(s.is_modified());
    }

    #[test]
    fn save_default_needs_source_path() {
        let s = session();
        assert!(matches!(s.save_default(&Settings::default()), Err(IoError::Write(_))));
    }
}
