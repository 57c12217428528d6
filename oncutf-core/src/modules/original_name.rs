//! Original-filename fragments.

use crate::file_item::FileItem;
use crate::transform::transliterate_greek;

/// Produce the original basename without extension, optionally
/// transliterated Greek-to-Latin. Case and separator transforms belong to
/// the post-transform, not here. An empty transliteration result falls
/// back to the untransformed stem.
pub fn apply(greeklish: bool, file: &FileItem) -> String {
    let stem = file.stem();
    let mut base_name = stem.clone();

    if greeklish {
        base_name = transliterate_greek(&base_name);
    }

    if base_name.trim().is_empty() {
        tracing::warn!(
            "empty result, falling back to original filename: {}",
            file.filename
        );
        base_name = stem;
    }

    base_name
}
