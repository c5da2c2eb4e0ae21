use crate::error::{IntersectionError, Result};
use crate::lane::Lane;
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// Evidence
// ---------------------------------------------------------------------------

/// One uploaded traffic image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evidence {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Evidence {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self::new(filename, content_type_for(path), bytes))
    }
}

/// Content type guessed from the extension, JPEG when unknown.
fn content_type_for(path: &Path) -> &'static str {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("image/jpeg")
}

// ---------------------------------------------------------------------------
// EvidenceSlots
// ---------------------------------------------------------------------------

/// At most one [`Evidence`] per lane.
#[derive(Debug, Clone, Default)]
pub struct EvidenceSlots {
    slots: BTreeMap<Lane, Evidence>,
}

impl EvidenceSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store evidence for `lane`, replacing any earlier upload.
    pub fn insert(&mut self, lane: Lane, evidence: Evidence) {
        self.slots.insert(lane, evidence);
    }

    pub fn remove(&mut self, lane: Lane) -> Option<Evidence> {
        self.slots.remove(&lane)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn contains(&self, lane: Lane) -> bool {
        self.slots.contains_key(&lane)
    }

    pub fn get(&self, lane: Lane) -> Option<&Evidence> {
        self.slots.get(&lane)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Lanes without evidence, in priority order.
    pub fn missing(&self) -> Vec<Lane> {
        Lane::all()
            .iter()
            .copied()
            .filter(|l| !self.slots.contains_key(l))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.slots.len() == Lane::COUNT
    }

    /// Copy out all four artifacts for a service call.
    pub fn require_complete(&self) -> Result<Vec<(Lane, Evidence)>> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(IntersectionError::IncompleteInput { missing });
        }
        Ok(self
            .slots
            .iter()
            .map(|(lane, ev)| (*lane, ev.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn jpeg(name: &str) -> Evidence {
        Evidence::new(name, "image/jpeg", vec![0xff, 0xd8])
    }

    #[test]
    fn tracks_missing_lanes_in_priority_order() {
        let mut slots = EvidenceSlots::new();
        slots.insert(Lane::South, jpeg("s.jpg"));
        slots.insert(Lane::East, jpeg("e.jpg"));
        assert_eq!(slots.missing(), vec![Lane::North, Lane::West]);
        assert!(!slots.is_complete());

        match slots.require_complete() {
            Err(IntersectionError::IncompleteInput { missing }) => {
                assert_eq!(missing, vec![Lane::North, Lane::West])
            }
            other => panic!("expected IncompleteInput, got {other:?}"),
        }
    }

    #[test]
    fn complete_slots_yield_every_lane() {
        let mut slots = EvidenceSlots::new();
        for lane in Lane::all() {
            slots.insert(*lane, jpeg(&format!("{lane}.jpg")));
        }
        let all = slots.require_complete().unwrap();
        assert_eq!(all.iter().map(|(l, _)| *l).collect::<Vec<_>>(), Lane::all().to_vec());
    }

    #[test]
    fn upload_replaces_and_remove_discards() {
        let mut slots = EvidenceSlots::new();
        slots.insert(Lane::West, jpeg("old.jpg"));
        slots.insert(Lane::West, jpeg("new.jpg"));
        assert_eq!(slots.len(), 1);
        assert_eq!(slots.get(Lane::West).unwrap().filename, "new.jpg");
        assert!(slots.remove(Lane::West).is_some());
        assert!(slots.is_empty());
    }

    #[test]
    fn from_file_reads_bytes_and_guesses_type() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("north.PNG");
        std::fs::write(&path, b"png-bytes").unwrap();
        let ev = Evidence::from_file(&path).unwrap();
        assert_eq!(ev.filename, "north.PNG");
        assert_eq!(ev.content_type, "image/png");
        assert_eq!(ev.bytes, b"png-bytes");
    }

    #[test]
    fn content_type_covers_less_common_image_formats() {
        let dir = TempDir::new().unwrap();
        for (name, expected) in [
            ("east.tif", "image/tiff"),
            ("south.svg", "image/svg+xml"),
            ("west.webp", "image/webp"),
            ("north.jpeg", "image/jpeg"),
        ] {
            let path = dir.path().join(name);
            std::fs::write(&path, b"bytes").unwrap();
            assert_eq!(Evidence::from_file(&path).unwrap().content_type, expected, "{name}");
        }
    }

    #[test]
    fn unknown_or_missing_extension_defaults_to_jpeg() {
        let dir = TempDir::new().unwrap();
        for name in ["north", "east.unknownext"] {
            let path = dir.path().join(name);
            std::fs::write(&path, b"bytes").unwrap();
            assert_eq!(Evidence::from_file(&path).unwrap().content_type, "image/jpeg", "{name}");
        }
    }
}
