//! Companion (sidecar) file discovery and rename pairing.
//!
//! Companions are files that must travel with their primary: Sony camera
//! metadata logs (`C8227.MP4` + `C8227M01.XML`), XMP sidecars next to RAW
//! frames, subtitle tracks next to videos. The pattern tables below encode
//! the conventions seen in real capture and post-processing workflows.
//! Discovery never touches the filesystem; callers supply the folder
//! listing.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

fn pattern(re: &str) -> Regex {
    RegexBuilder::new(re)
        .case_insensitive(true)
        .build()
        .expect("companion pattern must compile")
}

/// Companion basename patterns per primary extension. Each pattern
/// captures the candidate's stem; a candidate is a companion when the
/// captured stem equals the primary's stem.
static COMPANION_PATTERNS: LazyLock<HashMap<&'static str, Vec<Regex>>> = LazyLock::new(|| {
    let sony_xml = || vec![pattern(r"^(.+)M01\.XML$"), pattern(r"^(.+)M02\.XML$")];
    let subtitles = || {
        vec![
            pattern(r"^(.+)\.srt$"),
            pattern(r"^(.+)\.vtt$"),
            pattern(r"^(.+)\.ass$"),
            pattern(r"^(.+)\.ssa$"),
        ]
    };
    let xmp = || vec![pattern(r"^(.+)\.xmp$")];
    let jpeg_previews = || vec![pattern(r"^(.+)\.jpg$"), pattern(r"^(.+)\.jpeg$")];
    let raw_sidecars = || {
        let mut v = xmp();
        v.extend(jpeg_previews());
        v
    };
    let raw_companions = || {
        vec![
            pattern(r"^(.+)\.cr2$"),
            pattern(r"^(.+)\.crw$"),
            pattern(r"^(.+)\.nef$"),
            pattern(r"^(.+)\.nrw$"),
            pattern(r"^(.+)\.arw$"),
            pattern(r"^(.+)\.srf$"),
            pattern(r"^(.+)\.dng$"),
            pattern(r"^(.+)\.orf$"),
            pattern(r"^(.+)\.rw2$"),
            pattern(r"^(.+)\.pef$"),
        ]
    };

    let mut map: HashMap<&'static str, Vec<Regex>> = HashMap::new();

    // Video: Sony metadata logs plus subtitle tracks.
    let mut mp4 = sony_xml();
    mp4.extend(subtitles());
    map.insert("mp4", mp4.clone());
    map.insert("mov", mp4);
    map.insert("mts", sony_xml());
    map.insert("m2ts", sony_xml());
    map.insert("mkv", subtitles());
    map.insert("avi", subtitles());
    map.insert("wmv", subtitles());

    // RAW frames: XMP sidecars and JPEG previews; vendor recipe files
    // where the vendor has one.
    for ext in ["crw", "nrw", "arw", "srf", "dng", "orf", "rw2", "pef"] {
        map.insert(ext, raw_sidecars());
    }
    let mut cr2 = raw_sidecars();
    cr2.push(pattern(r"^(.+)\.vrd$"));
    map.insert("cr2", cr2);
    let mut nef = raw_sidecars();
    nef.push(pattern(r"^(.+)\.nxd$"));
    map.insert("nef", nef);

    // Standard images: XMP sidecars, plus the reverse RAW relationship
    // for JPEGs that act as previews.
    let mut jpg = xmp();
    jpg.extend(raw_companions());
    map.insert("jpg", jpg.clone());
    map.insert("jpeg", jpg);
    for ext in ["png", "tiff", "tif", "gif", "webp"] {
        map.insert(ext, xmp());
    }

    map
});

/// Extensions that commonly are companion files themselves. Used by the
/// reverse lookup to short-circuit candidates that cannot be sidecars.
static COMPANION_EXTENSIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "xmp", "xml", "vrd", "nxd", // metadata
        "srt", "vtt", "ass", "ssa", "sub", // subtitles
        "cube", "3dl", "lut", // color grading
        "idx",
    ]
    .into_iter()
    .collect()
});

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Find the companion files of `main_file` among `folder_files` (the
/// listing of the primary's folder, supplied by the caller).
pub fn find_companion_files(main_file: &Path, folder_files: &[PathBuf]) -> Vec<PathBuf> {
    let main_stem = stem_of(main_file);
    let main_ext = extension_of(main_file);

    let Some(patterns) = COMPANION_PATTERNS.get(main_ext.as_str()) else {
        return Vec::new();
    };

    let mut companions = Vec::new();
    for candidate in folder_files {
        if candidate == main_file {
            continue;
        }
        let Some(filename) = candidate.file_name().map(|n| n.to_string_lossy()) else {
            continue;
        };

        for pattern in patterns {
            if let Some(captures) = pattern.captures(&filename) {
                if captures.get(1).map(|m| m.as_str()) == Some(main_stem.as_str()) {
                    tracing::debug!(
                        "found companion {:?} for {:?}",
                        filename,
                        main_file.file_name()
                    );
                    companions.push(candidate.clone());
                    break;
                }
            }
        }
    }

    companions
}

/// Reverse lookup: the primary file that claims `companion`, if any.
pub fn main_file_for_companion(companion: &Path, folder_files: &[PathBuf]) -> Option<PathBuf> {
    let companion_name = companion.file_name()?.to_string_lossy().into_owned();
    let companion_ext = extension_of(companion);

    if !COMPANION_EXTENSIONS.contains(companion_ext.as_str()) {
        return None;
    }

    for candidate in folder_files {
        if candidate == companion {
            continue;
        }
        let candidate_ext = extension_of(candidate);
        let Some(patterns) = COMPANION_PATTERNS.get(candidate_ext.as_str()) else {
            continue;
        };

        for pattern in patterns {
            if let Some(captures) = pattern.captures(&companion_name) {
                if captures.get(1).map(|m| m.as_str()) == Some(stem_of(candidate).as_str()) {
                    return Some(candidate.clone());
                }
            }
        }
    }

    None
}

/// True when `path` is claimed as a companion by some file in its folder.
pub fn is_companion_file(path: &Path, folder_files: &[PathBuf]) -> bool {
    main_file_for_companion(path, folder_files).is_some()
}

/// Rename pairs for a primary's companions: the primary's old stem is
/// substituted with the new stem wherever it appears in each companion's
/// basename.
pub fn companion_rename_pairs(
    main_old_path: &Path,
    main_new_path: &Path,
    companions: &[PathBuf],
) -> Vec<(PathBuf, PathBuf)> {
    if companions.is_empty() {
        return Vec::new();
    }

    let old_stem = stem_of(main_old_path);
    let new_stem = stem_of(main_new_path);
    let new_dir = main_new_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    companions
        .iter()
        .filter_map(|companion| {
            let name = companion.file_name()?.to_string_lossy().into_owned();
            let new_name = name.replace(&old_stem, &new_stem);
            Some((companion.clone(), new_dir.join(new_name)))
        })
        .collect()
}

/// How a file participates in a companion group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanionGroupKind {
    /// Primary with at least one companion.
    Group,
    /// No companions found.
    Standalone,
}

/// A primary file and the companions that travel with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanionGroup {
    pub main: PathBuf,
    pub companions: Vec<PathBuf>,
    pub kind: CompanionGroupKind,
}

/// Partition `paths` into companion groups. Companion files are folded
/// into their primary's group; everything else becomes standalone.
pub fn group_files_with_companions(paths: &[PathBuf]) -> Vec<CompanionGroup> {
    let mut by_folder: HashMap<PathBuf, Vec<PathBuf>> = HashMap::new();
    for path in paths {
        let folder = path.parent().map(Path::to_path_buf).unwrap_or_default();
        by_folder.entry(folder).or_default().push(path.clone());
    }

    let mut groups = Vec::new();
    let mut processed: HashSet<PathBuf> = HashSet::new();

    for path in paths {
        if processed.contains(path) {
            continue;
        }
        let folder = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let folder_files = &by_folder[&folder];

        if main_file_for_companion(path, folder_files).is_some() {
            // Belongs to some primary's group; handled when the primary
            // comes up.
            processed.insert(path.clone());
            continue;
        }

        let companions = find_companion_files(path, folder_files);
        for companion in &companions {
            processed.insert(companion.clone());
        }
        processed.insert(path.clone());

        let kind = if companions.is_empty() {
            CompanionGroupKind::Standalone
        } else {
            CompanionGroupKind::Group
        };
        groups.push(CompanionGroup {
            main: path.clone(),
            companions,
            kind,
        });
    }

    tracing::debug!("grouped {} files into {} groups", paths.len(), groups.len());
    groups
}
