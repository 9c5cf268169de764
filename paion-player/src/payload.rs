//! Payload audio extraction cache
//!
//! The browser plays audio via plain file responses, so the first audio
//! member of each bundle's `payload/` folder is extracted once into a
//! process-lifetime temp directory and reused for subsequent requests.

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tempfile::TempDir;
use tracing::debug;
use zip::ZipArchive;

use paion_common::assets;
use paion_common::{Error, Result};

pub struct PayloadCache {
    temp_root: TempDir,
    extracted: Mutex<HashMap<PathBuf, PathBuf>>,
    next_id: AtomicU64,
}

impl PayloadCache {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            temp_root: tempfile::Builder::new()
                .prefix("paion_audio_cache_")
                .tempdir()?,
            extracted: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        })
    }

    /// Drop cache entries (extracted files stay on disk until the temp
    /// directory is dropped with the process)
    pub fn clear(&self) {
        self.extracted.lock().unwrap().clear();
    }

    /// Extract (or reuse) the payload audio file for a bundle.
    ///
    /// The first `payload/` member with an audio extension wins, in archive
    /// order. A bundle without payload audio is an error.
    pub fn get_audio_file(&self, aifm_path: &Path) -> Result<PathBuf> {
        if let Some(existing) = self.extracted.lock().unwrap().get(aifm_path) {
            return Ok(existing.clone());
        }

        let file = File::open(aifm_path)?;
        let mut archive = ZipArchive::new(file)?;
        let member = archive
            .file_names()
            .find(|n| {
                n.starts_with("payload/") && !n.ends_with('/') && assets::is_audio_name(n)
            })
            .map(str::to_owned)
            .ok_or_else(|| Error::NotFound("no audio found in payload/".to_string()))?;

        let stem = aifm_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "track".to_string());
        let ext = assets::ext_of(&member);
        // unique suffix keeps same-stem bundles from different folders apart,
        // even when first extractions run concurrently
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let out = self.temp_root.path().join(format!("{stem}-{id}.{ext}"));

        let mut src = archive.by_name(&member)?;
        let mut dst = File::create(&out)?;
        io::copy(&mut src, &mut dst)?;
        debug!(bundle = %aifm_path.display(), member = %member, out = %out.display(), "Extracted payload audio");

        self.extracted
            .lock()
            .unwrap()
            .insert(aifm_path.to_path_buf(), out.clone());
        Ok(out)
    }
}
