use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::taxonomy::Taxonomy;

pub const INSTANCE_EXTENSION: &str = "xbrl";

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory {}", path.display()))?;
    Ok(())
}

/// Expands `inputs` into instance files. Directories are walked recursively
/// for `*.xbrl`; files named explicitly are taken as given. Names matching a
/// skip pattern are dropped either way. The result is sorted.
pub fn collect_instance_files(inputs: &[PathBuf], taxonomy: &Taxonomy) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            walk(input, &mut files)?;
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            anyhow::bail!("Input not found: {}", input.display());
        }
    }

    files.retain(|path| {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        let skip = taxonomy.should_skip_file(name);
        if skip {
            log::debug!("skipping {}", path.display());
        }
        !skip
    });
    files.sort();
    files.dedup();
    Ok(files)
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, files)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some(INSTANCE_EXTENSION) {
            files.push(path);
        }
    }
    Ok(())
}

/// Document id for a file: its stem, e.g. `S100TEST` for `S100TEST.xbrl`.
pub fn doc_id_for(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_instance_files() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("S100AAAA").join("XBRL").join("PublicDoc");
        ensure_dir(&nested).unwrap();
        fs::write(nested.join("jpcrp030000-asr-001_E00001-000.xbrl"), "<xbrl/>").unwrap();
        fs::write(nested.join("jpaud-aar-cn-001_E00001-000.xbrl"), "<xbrl/>").unwrap();
        fs::write(nested.join("manifest.xml"), "<manifest/>").unwrap();

        let files = collect_instance_files(&[dir.path().to_path_buf()], &taxonomy).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("jpcrp030000-asr-001_E00001-000.xbrl"));
    }

    #[test]
    fn test_missing_input() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let result = collect_instance_files(&[PathBuf::from("does/not/exist.xbrl")], &taxonomy);
        assert!(result.is_err());
    }

    #[test]
    fn test_doc_id_for() {
        assert_eq!(doc_id_for(Path::new("/tmp/S100TEST.xbrl")), "S100TEST");
    }
}
