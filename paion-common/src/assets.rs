//! Asset member selection inside AIFM bundles
//!
//! Bundles carry companion assets (cover art, declaration, prompt, lyrics)
//! under `metadata/` with no fixed naming convention. Selection ranks
//! candidates by name hints, extension priority, then name order, matching
//! how existing packing tools lay out their output.

use serde::{Deserialize, Serialize};

use crate::manifest::MANIFEST_MEMBER;

/// Audio payload extensions, lowercase without the dot
pub const AUDIO_EXTS: &[&str] = &["wav", "mp3", "m4a", "aac", "aiff", "aif", "flac", "ogg"];

/// Cover image extensions
pub const IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Companion asset kinds exposed by the player API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Cover,
    Declaration,
    Prompt,
    Lyrics,
    Manifest,
}

impl AssetKind {
    pub const ALL: [AssetKind; 5] = [
        AssetKind::Cover,
        AssetKind::Declaration,
        AssetKind::Prompt,
        AssetKind::Lyrics,
        AssetKind::Manifest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Cover => "cover",
            AssetKind::Declaration => "declaration",
            AssetKind::Prompt => "prompt",
            AssetKind::Lyrics => "lyrics",
            AssetKind::Manifest => "manifest",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cover" => Some(AssetKind::Cover),
            "declaration" => Some(AssetKind::Declaration),
            "prompt" => Some(AssetKind::Prompt),
            "lyrics" => Some(AssetKind::Lyrics),
            "manifest" => Some(AssetKind::Manifest),
            _ => None,
        }
    }
}

/// Lowercase extension of a member name, without the dot
pub fn ext_of(name: &str) -> String {
    std::path::Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

/// Final path component of a member name
pub fn basename(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn has_ext(name: &str, exts: &[&str]) -> bool {
    let ext = ext_of(name);
    exts.contains(&ext.as_str())
}

/// Whether a member name looks like payload audio
pub fn is_audio_name(name: &str) -> bool {
    has_ext(name, AUDIO_EXTS)
}

/// Pick the best member for an asset kind from the archive member list
pub fn pick_member(names: &[String], kind: AssetKind) -> Option<String> {
    match kind {
        AssetKind::Manifest => names
            .iter()
            .find(|n| n.as_str() == MANIFEST_MEMBER)
            .cloned(),
        AssetKind::Cover => find_cover(names),
        AssetKind::Declaration => choose_by_ext(
            names,
            &["metadata/"],
            &["pdf", "txt"],
            &["declar", "legal", "license", "statement"],
        ),
        AssetKind::Prompt => choose_by_ext(
            names,
            &["metadata/"],
            &["txt"],
            &["prompt", "suno", "udio", "instruction"],
        ),
        AssetKind::Lyrics => choose_by_ext(
            names,
            &["metadata/"],
            &["txt"],
            &["lyric", "lyrics", "words", "verse"],
        ),
    }
}

/// Rank candidates under the given prefixes: hinted names win, then
/// extension priority order, then case-insensitive name order
fn choose_by_ext(
    names: &[String],
    prefixes: &[&str],
    exts_priority: &[&str],
    hints: &[&str],
) -> Option<String> {
    let ext_rank = |name: &str| {
        let ext = ext_of(name);
        exts_priority
            .iter()
            .position(|e| *e == ext)
            .unwrap_or(usize::MAX)
    };

    let mut candidates: Vec<&String> = names
        .iter()
        .filter(|n| !n.ends_with('/'))
        .filter(|n| {
            let lower = n.to_ascii_lowercase();
            prefixes.iter().any(|p| lower.starts_with(p))
                && exts_priority.contains(&ext_of(n).as_str())
        })
        .collect();

    if candidates.is_empty() {
        return None;
    }

    let has_hint = |name: &String| {
        let lower = name.to_ascii_lowercase();
        hints.iter().any(|h| lower.contains(h))
    };

    let hinted: Vec<&String> = candidates.iter().copied().filter(|n| has_hint(n)).collect();
    if !hinted.is_empty() {
        candidates = hinted;
    }

    candidates.sort_by_key(|n| (ext_rank(n), n.to_ascii_lowercase()));
    candidates.first().map(|n| (*n).to_string())
}

fn find_cover(names: &[String]) -> Option<String> {
    const PREFERRED: &[&str] = &[
        "metadata/cover.png",
        "metadata/cover.jpg",
        "metadata/cover.jpeg",
        "metadata/cover.webp",
        "cover.png",
        "cover.jpg",
        "cover.jpeg",
        "cover.webp",
    ];
    for preferred in PREFERRED {
        if let Some(n) = names.iter().find(|n| n.as_str() == *preferred) {
            return Some(n.clone());
        }
    }

    // Any image at the archive root or under metadata/
    names
        .iter()
        .find(|n| {
            let lower = n.to_ascii_lowercase();
            has_ext(&lower, IMAGE_EXTS) && (!lower.contains('/') || lower.starts_with("metadata/"))
        })
        .cloned()
}

/// Guess a Content-Type from a member or file name
pub fn guess_mime(name: &str) -> &'static str {
    match ext_of(name).as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "txt" => "text/plain; charset=utf-8",
        "json" => "application/json; charset=utf-8",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" | "aac" => "audio/mp4",
        "flac" => "audio/flac",
        "ogg" => "audio/ogg",
        _ => "application/octet-stream",
    }
}
