use crate::error::SkkError;
use std::path::PathBuf;

const XDG_PREFIX: &str = "skkcore";

/// Find a file in the freedesktop data dirs.
/// https://specifications.freedesktop.org/basedir-spec/basedir-spec-latest.html
///
/// filepath: path relative to the skkcore prefix like "rule/kana_form.toml"
pub(crate) fn filepath_from_xdg_data_dir(filepath: &str) -> Result<PathBuf, SkkError> {
    let base_directories = xdg::BaseDirectories::with_prefix(XDG_PREFIX)?;
    base_directories
        .find_data_file(filepath)
        .ok_or_else(|| SkkError::Error(format!("{} not found in data dirs", filepath)))
}

/// Same as [filepath_from_xdg_data_dir] for the config dirs.
pub(crate) fn filepath_from_xdg_config_dir(filepath: &str) -> Result<PathBuf, SkkError> {
    let base_directories = xdg::BaseDirectories::with_prefix(XDG_PREFIX)?;
    base_directories
        .find_config_file(filepath)
        .ok_or_else(|| SkkError::Error(format!("{} not found in config dirs", filepath)))
}
