//! Built-in AIFM integrity verifier
//!
//! Checks every entry of `manifest.integrity.hashed_files` against the
//! archive: byte length first (cheap), then SHA-256. Results are normalized
//! with the manifest-warn rule: a bundle whose only failing entry is
//! `manifest.json` itself is still considered intact, because re-signing
//! tools routinely rewrite the manifest after hashing it.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Serialize, Serializer};
use serde_json::Value;
use sha2::{Digest, Sha256};
use zip::ZipArchive;

use crate::manifest::MANIFEST_MEMBER;

/// Verification engine identifier reported to clients
pub const ENGINE: &str = "builtin";

/// Outcome of a single integrity check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub ok: bool,
    /// Archive member path, or a pseudo-path (`bundle`, `integrity.algorithm`)
    pub path: String,
    pub reason: String,
}

impl CheckResult {
    fn pass(path: impl Into<String>) -> Self {
        Self {
            ok: true,
            path: path.into(),
            reason: String::new(),
        }
    }

    fn fail(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Normalized verification status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyStatus {
    Intact,
    /// Only `manifest.json` failed its own hash; bundle is treated as intact
    ManifestWarn,
    Tampered,
}

impl VerifyStatus {
    /// UI badge label
    pub fn label(&self) -> &'static str {
        match self {
            VerifyStatus::Intact => "INTACT",
            VerifyStatus::ManifestWarn => "INTACT (MANIFEST WARN)",
            VerifyStatus::Tampered => "TAMPERED",
        }
    }
}

impl Serialize for VerifyStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Full verification report for one bundle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifyReport {
    pub ok: bool,
    pub status: VerifyStatus,
    pub details: Vec<CheckResult>,
    pub engine: &'static str,
}

/// Verify an AIFM bundle on disk.
///
/// Never fails: unreadable archives and unparseable manifests become a
/// failing `bundle` check, which normalizes to `TAMPERED`.
pub fn verify_bundle(path: &Path) -> VerifyReport {
    let checks = match run_checks(path) {
        Ok(checks) => checks,
        Err(e) => vec![CheckResult::fail("bundle", e.to_string())],
    };
    let report = normalize(checks);
    tracing::debug!(
        bundle = %path.display(),
        status = report.status.label(),
        "Verified bundle"
    );
    report
}

/// Apply the manifest-warn rule to a list of checks
pub fn normalize(details: Vec<CheckResult>) -> VerifyReport {
    let fails = details.iter().filter(|c| !c.ok);
    let mut manifest_failed = false;
    let mut other_failed = false;
    for check in fails {
        if check.path == MANIFEST_MEMBER {
            manifest_failed = true;
        } else {
            other_failed = true;
        }
    }

    let status = if other_failed {
        VerifyStatus::Tampered
    } else if manifest_failed {
        VerifyStatus::ManifestWarn
    } else {
        VerifyStatus::Intact
    };

    VerifyReport {
        ok: status != VerifyStatus::Tampered,
        status,
        details,
        engine: ENGINE,
    }
}

fn run_checks(path: &Path) -> crate::Result<Vec<CheckResult>> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file)?;
    let names: HashSet<String> = archive.file_names().map(str::to_owned).collect();

    if !names.contains(MANIFEST_MEMBER) {
        return Ok(vec![CheckResult::fail(MANIFEST_MEMBER, "missing manifest.json")]);
    }

    let manifest: Value = {
        let mut raw = Vec::new();
        archive.by_name(MANIFEST_MEMBER)?.read_to_end(&mut raw)?;
        serde_json::from_slice(&raw)?
    };

    let integrity = manifest.get("integrity");

    let algorithm = integrity
        .and_then(|i| i.get("algorithm"))
        .and_then(Value::as_str)
        .unwrap_or("sha256");
    if !algorithm.eq_ignore_ascii_case("sha256") {
        return Ok(vec![CheckResult::fail(
            "integrity.algorithm",
            format!("unsupported algorithm: {algorithm}"),
        )]);
    }

    let hashed_files = match integrity
        .and_then(|i| i.get("hashed_files"))
        .and_then(Value::as_object)
    {
        Some(map) if !map.is_empty() => map,
        _ => {
            return Ok(vec![CheckResult::fail(
                "integrity.hashed_files",
                "missing/empty hashed_files",
            )]);
        }
    };

    let mut checks = Vec::with_capacity(hashed_files.len());
    for (relpath, meta) in hashed_files {
        if !names.contains(relpath.as_str()) {
            checks.push(CheckResult::fail(relpath, "missing file"));
            continue;
        }

        let expected_hash = meta
            .get("sha256")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_ascii_lowercase();
        let expected_bytes = meta.get("bytes").and_then(Value::as_u64);

        let mut data = Vec::new();
        archive.by_name(relpath)?.read_to_end(&mut data)?;

        if let Some(expected) = expected_bytes {
            if data.len() as u64 != expected {
                checks.push(CheckResult::fail(
                    relpath,
                    format!("bytes mismatch: {} != {}", data.len(), expected),
                ));
                continue;
            }
        }

        if !expected_hash.is_empty() {
            let actual = format!("{:x}", Sha256::digest(&data));
            if actual != expected_hash {
                checks.push(CheckResult::fail(relpath, "sha256 mismatch"));
                continue;
            }
        }

        checks.push(CheckResult::pass(relpath));
    }

    Ok(checks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use std::path::PathBuf;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn sha256_hex(data: &[u8]) -> String {
        format!("{:x}", Sha256::digest(data))
    }

    /// Write a bundle with the given members plus a manifest hashing them
    fn write_bundle(
        dir: &Path,
        name: &str,
        members: &[(&str, &[u8])],
        mutate_manifest: impl FnOnce(&mut Value),
    ) -> PathBuf {
        let mut hashed = serde_json::Map::new();
        for (path, data) in members {
            hashed.insert(
                (*path).to_string(),
                json!({"sha256": sha256_hex(data), "bytes": data.len()}),
            );
        }
        let mut manifest = json!({
            "integrity": {"algorithm": "sha256", "hashed_files": hashed}
        });
        mutate_manifest(&mut manifest);

        let out = dir.join(name);
        let file = File::create(&out).unwrap();
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        zip.start_file(MANIFEST_MEMBER, options).unwrap();
        zip.write_all(manifest.to_string().as_bytes()).unwrap();
        for (path, data) in members {
            zip.start_file(*path, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
        out
    }

    #[test]
    fn intact_bundle_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_bundle(
            dir.path(),
            "ok.aifm",
            &[("payload/song.mp3", b"abc123"), ("metadata/lyrics.txt", b"la la")],
            |_| {},
        );

        let report = verify_bundle(&path);
        assert!(report.ok);
        assert_eq!(report.status, VerifyStatus::Intact);
        assert_eq!(report.engine, "builtin");
        assert!(report.details.iter().all(|c| c.ok));
    }

    #[test]
    fn wrong_bytes_is_tampered() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_bundle(dir.path(), "t.aifm", &[("payload/song.mp3", b"abc123")], |m| {
            m["integrity"]["hashed_files"]["payload/song.mp3"]["bytes"] = json!(999);
        });

        let report = verify_bundle(&path);
        assert!(!report.ok);
        assert_eq!(report.status, VerifyStatus::Tampered);
        let fail = report.details.iter().find(|c| !c.ok).unwrap();
        assert_eq!(fail.path, "payload/song.mp3");
        assert!(fail.reason.contains("bytes mismatch"));
    }

    #[test]
    fn wrong_hash_same_length_is_tampered() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_bundle(dir.path(), "t.aifm", &[("payload/song.mp3", b"abc123")], |m| {
            // same byte count, different content hash
            m["integrity"]["hashed_files"]["payload/song.mp3"]["sha256"] =
                json!(sha256_hex(b"abc124"));
        });

        let report = verify_bundle(&path);
        assert_eq!(report.status, VerifyStatus::Tampered);
        let fail = report.details.iter().find(|c| !c.ok).unwrap();
        assert_eq!(fail.reason, "sha256 mismatch");
    }

    #[test]
    fn manifest_only_failure_is_warn_but_ok() {
        let dir = tempfile::tempdir().unwrap();
        // Manifest lists a stale hash for itself; the final written manifest
        // can never match it, which is exactly the re-signing case.
        let path = write_bundle(dir.path(), "w.aifm", &[("payload/song.mp3", b"abc123")], |m| {
            m["integrity"]["hashed_files"][MANIFEST_MEMBER] =
                json!({"sha256": sha256_hex(b"stale"), "bytes": 5});
        });

        let report = verify_bundle(&path);
        assert!(report.ok);
        assert_eq!(report.status, VerifyStatus::ManifestWarn);
        assert_eq!(report.status.label(), "INTACT (MANIFEST WARN)");
        let fails: Vec<_> = report.details.iter().filter(|c| !c.ok).collect();
        assert_eq!(fails.len(), 1);
        assert_eq!(fails[0].path, MANIFEST_MEMBER);
    }

    #[test]
    fn missing_hashed_member_is_tampered() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_bundle(dir.path(), "m.aifm", &[("payload/song.mp3", b"abc123")], |m| {
            m["integrity"]["hashed_files"]["payload/gone.wav"] =
                json!({"sha256": sha256_hex(b"x"), "bytes": 1});
        });

        let report = verify_bundle(&path);
        assert_eq!(report.status, VerifyStatus::Tampered);
        assert!(report
            .details
            .iter()
            .any(|c| !c.ok && c.path == "payload/gone.wav" && c.reason == "missing file"));
    }

    #[test]
    fn unsupported_algorithm_is_tampered() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_bundle(dir.path(), "a.aifm", &[("payload/song.mp3", b"abc123")], |m| {
            m["integrity"]["algorithm"] = json!("md5");
        });

        let report = verify_bundle(&path);
        assert_eq!(report.status, VerifyStatus::Tampered);
        assert_eq!(report.details[0].path, "integrity.algorithm");
        assert!(report.details[0].reason.contains("md5"));
    }

    #[test]
    fn empty_hashed_files_is_tampered() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_bundle(dir.path(), "e.aifm", &[], |_| {});

        let report = verify_bundle(&path);
        assert_eq!(report.status, VerifyStatus::Tampered);
        assert_eq!(report.details[0].path, "integrity.hashed_files");
    }

    #[test]
    fn missing_manifest_downgrades_to_warn() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("no_manifest.aifm");
        let mut zip = ZipWriter::new(File::create(&out).unwrap());
        zip.start_file("payload/song.mp3", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"abc123").unwrap();
        zip.finish().unwrap();

        // the only failing check sits at manifest.json, so the warn rule
        // applies even though the whole manifest is absent
        let report = verify_bundle(&out);
        assert!(report.ok);
        assert_eq!(report.status, VerifyStatus::ManifestWarn);
        assert_eq!(report.details[0].path, MANIFEST_MEMBER);
        assert_eq!(report.details[0].reason, "missing manifest.json");
    }

    #[test]
    fn unreadable_archive_is_tampered() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("junk.aifm");
        std::fs::write(&out, b"not a zip archive").unwrap();

        let report = verify_bundle(&out);
        assert_eq!(report.status, VerifyStatus::Tampered);
        assert_eq!(report.details[0].path, "bundle");
    }

    #[test]
    fn normalize_keeps_passing_details() {
        let report = normalize(vec![
            CheckResult::pass("payload/a.mp3"),
            CheckResult::pass("metadata/cover.png"),
        ]);
        assert_eq!(report.status, VerifyStatus::Intact);
        assert_eq!(report.details.len(), 2);
    }
}
