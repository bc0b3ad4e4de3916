//! Scene files picked from a directory by file-name pattern.

use std::path::Path;

use walkdir::WalkDir;

use montage_common::error::{MontageError, MontageResult};

/// Pattern used when a directory is given without one.
pub const DEFAULT_PATTERN: &str = "*.mp4";

/// Files directly inside `dir` whose names match `pattern`, as absolute
/// paths sorted by file name.
///
/// The pattern knows `*` (any run of characters) and `?` (one character).
pub fn scene_files(dir: impl AsRef<Path>, pattern: &str) -> MontageResult<Vec<String>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(MontageError::not_found("directory", dir.display()));
    }
    let root = std::fs::canonicalize(dir)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(&root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| MontageError::Other(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if wildcard_match(pattern, &name) {
            files.push(entry.path().to_string_lossy().into_owned());
        }
    }

    if files.is_empty() {
        return Err(MontageError::invalid_argument(format!(
            "no files match {pattern:?} in {}",
            dir.display()
        )));
    }
    tracing::debug!(dir = %root.display(), pattern, count = files.len(), "Scene files found");
    Ok(files)
}

fn wildcard_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();
    let (mut p, mut n) = (0, 0);
    // Last `*` seen and the name position it is currently stretched to.
    let mut star: Option<(usize, usize)> = None;

    while n < name.len() {
        match pattern.get(p) {
            Some('*') => {
                star = Some((p, n));
                p += 1;
            }
            Some(&c) if c == '?' || c == name[n] => {
                p += 1;
                n += 1;
            }
            _ => match star {
                Some((sp, sn)) => {
                    p = sp + 1;
                    n = sn + 1;
                    star = Some((sp, sn + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcards() {
        assert!(wildcard_match("*.mp4", "scene01.mp4"));
        assert!(!wildcard_match("*.mp4", "scene01.mov"));
        assert!(wildcard_match("scene??.*", "scene07.mov"));
        assert!(!wildcard_match("scene??.*", "scene7.mov"));
        assert!(wildcard_match("*", ""));
        assert!(wildcard_match("a*b*c", "axxbyyc"));
        assert!(!wildcard_match("a*b*c", "axxbyy"));
    }

    #[test]
    fn test_scene_files_sorted_and_filtered() {
        let dir = std::env::temp_dir().join("montage_test_scan");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("nested.mp4")).unwrap();
        for name in ["scene02.mp4", "scene01.mp4", "notes.txt", "scene03.mov"] {
            std::fs::write(dir.join(name), b"").unwrap();
        }

        let files = scene_files(&dir, DEFAULT_PATTERN).unwrap();
        let names: Vec<&str> = files
            .iter()
            .map(|f| f.rsplit('/').next().unwrap())
            .collect();
        assert_eq!(names, vec!["scene01.mp4", "scene02.mp4"]);
        assert!(files.iter().all(|f| Path::new(f).is_absolute()));

        let err = scene_files(&dir, "*.mkv").unwrap_err();
        assert_eq!(err.kind(), montage_common::error::ErrorKind::InvalidArgument);
        let err = scene_files(dir.join("missing"), "*").unwrap_err();
        assert_eq!(err.kind(), montage_common::error::ErrorKind::NotFound);

        std::fs::remove_dir_all(&dir).ok();
    }
}
