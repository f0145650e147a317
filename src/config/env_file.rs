// src/config/env_file.rs

//! Configuration emitter.
//!
//! Materializes the flat key/value environment map consumed by the subject
//! process into a `KEY=value` artifact. The write is atomic (temp file in
//! the same directory, then rename) so a crash mid-write cannot leave a
//! partially written file, and the key order is deterministic so repeated
//! runs produce byte-identical artifacts.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::errors::Result;

/// Serialize `env` to `path`, atomically replacing any previous artifact.
///
/// Returns the path it wrote to. Values are emitted verbatim; no secret
/// masking is performed (accepted exposure for a local test tool).
pub fn write_env_file(env: &BTreeMap<String, String>, path: &Path) -> Result<PathBuf> {
    let mut contents = String::new();
    for (key, value) in env {
        contents.push_str(key);
        contents.push('=');
        contents.push_str(value);
        contents.push('\n');
    }

    let tmp = tmp_path(path);
    {
        let mut file = fs::File::create(&tmp)
            .with_context(|| format!("creating temp env file {}", tmp.display()))?;
        file.write_all(contents.as_bytes())
            .with_context(|| format!("writing temp env file {}", tmp.display()))?;
        file.sync_all()
            .with_context(|| format!("syncing temp env file {}", tmp.display()))?;
    }
    fs::rename(&tmp, path).with_context(|| {
        format!("renaming {} into place at {}", tmp.display(), path.display())
    })?;

    Ok(path.to_path_buf())
}

fn tmp_path(path: &Path) -> PathBuf {
    // Same directory as the target so the rename stays on one filesystem.
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "env".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_env() -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert("B_KEY".to_string(), "two".to_string());
        env.insert("A_KEY".to_string(), "one".to_string());
        env.insert("C_KEY".to_string(), "three".to_string());
        env
    }

    #[test]
    fn writes_sorted_key_value_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subject.env");

        write_env_file(&sample_env(), &path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "A_KEY=one\nB_KEY=two\nC_KEY=three\n");
    }

    #[test]
    fn overwrite_replaces_previous_artifact_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subject.env");

        write_env_file(&sample_env(), &path).unwrap();

        let mut env = sample_env();
        env.insert("A_KEY".to_string(), "changed".to_string());
        write_env_file(&env, &path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("A_KEY=changed\n"));

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("subject.env")]);
    }
}
