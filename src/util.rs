use anyhow::{Context, Result};
use memmap2::Mmap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Collect the text files making up a corpus: the file itself, or every
/// `.txt` file beneath a directory, in sorted order.
pub fn corpus_files(root: &Path) -> Result<Vec<PathBuf>> {
    let meta = std::fs::metadata(root)
        .with_context(|| format!("Failed to read metadata: {}", root.display()))?;
    if meta.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("Failed to read directory entry in {}", root.display()))?;
        let is_txt = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("txt"));
        if entry.file_type().is_file() && is_txt {
            files.push(entry.into_path());
        }
    }

    if files.is_empty() {
        warn!(corpus = %root.display(), "no .txt files found");
    }
    Ok(files)
}

/// Memory-map a file for read-only access.
///
/// # Safety
/// The mapping is read-only. Callers must not concurrently truncate or replace
/// the underlying file while the `Mmap` is live.
pub fn mmap_file(path: &Path) -> Result<Mmap> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    // SAFETY: We only read from this mapping; no concurrent modification of these files.
    unsafe {
        Mmap::map(&file)
            .with_context(|| format!("Failed to memory-map file: {}", path.display()))
    }
}

/// Load a text file as UTF-8, falling back to Latin-1 when it is not valid UTF-8.
pub fn load_text(path: &Path) -> Result<String> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to read metadata: {}", path.display()))?;
    // Mapping an empty file fails on some platforms.
    if metadata.len() == 0 {
        return Ok(String::new());
    }
    let raw = mmap_file(path)?;
    Ok(decode_text(&raw, path))
}

fn decode_text(raw: &[u8], path: &Path) -> String {
    match std::str::from_utf8(raw) {
        Ok(text) => text.to_owned(),
        Err(err) => {
            debug!(file = %path.display(), %err, "not UTF-8, decoding as Latin-1");
            // ISO-8859-1: every byte is the code point of the same value.
            raw.iter().map(|&b| b as char).collect()
        }
    }
}

/// BLAKE3 digest of the corpus bytes, hex encoded.
pub fn fingerprint(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ru.txt");
        std::fs::write(&path, "Алгоритм Рабина").unwrap();
        assert_eq!(load_text(&path).unwrap(), "Алгоритм Рабина");
    }

    #[test]
    fn test_load_latin1_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin.txt");
        std::fs::write(&path, b"caf\xE9").unwrap();
        assert_eq!(load_text(&path).unwrap(), "café");
    }

    #[test]
    fn test_latin1_keeps_c1_bytes_as_code_points() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c1.txt");
        std::fs::write(&path, b"\x80\x9f\xff").unwrap();
        let codes: Vec<u32> = load_text(&path).unwrap().chars().map(|c| c as u32).collect();
        assert_eq!(codes, [0x80, 0x9F, 0xFF]);
    }

    #[test]
    fn test_load_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, b"").unwrap();
        assert_eq!(load_text(&path).unwrap(), "");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_text(&dir.path().join("missing.txt")).is_err());
    }

    #[test]
    fn test_corpus_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::write(dir.path().join("notes.md"), "x").unwrap();
        std::fs::write(dir.path().join("nested/c.TXT"), "c").unwrap();

        let names: Vec<String> = corpus_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.txt", "b.txt", "c.TXT"]);
    }

    #[test]
    fn test_corpus_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.txt");
        std::fs::write(&path, "x").unwrap();
        assert_eq!(corpus_files(&path).unwrap(), vec![path]);
    }

    #[test]
    fn test_fingerprint_is_stable() {
        assert_eq!(fingerprint("abc"), fingerprint("abc"));
        assert_ne!(fingerprint("abc"), fingerprint("abd"));
        assert_eq!(fingerprint("abc").len(), 64);
    }
}
