use std::path::{Path, PathBuf};

use crate::shared::constants::IMAGE_EXTENSIONS;

/// Resolves a still-image input given either as a path or as a bare asset
/// name such as `iprofile`.
///
/// An existing file path wins. Otherwise the name is looked up in
/// `assets_dir`, as given and then with each known image extension.
pub fn locate_asset(name: &str, assets_dir: Option<&Path>) -> Option<PathBuf> {
    let direct = Path::new(name);
    if direct.is_file() {
        return Some(direct.to_path_buf());
    }

    let dir = assets_dir?;
    let exact = dir.join(name);
    if exact.is_file() {
        return Some(exact);
    }
    IMAGE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{name}.{ext}")))
        .find(|candidate| candidate.is_file())
}
