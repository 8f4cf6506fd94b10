//! Anime4K shader asset lookup.
//!
//! Shaders are installed as `Anime4K_Mode<mode>.glsl` in a `shaders/` directory next to the
//! executable unless a directory is configured explicitly.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Shader file name prefix.
pub const SHADER_PREFIX: &str = "Anime4K_Mode";

/// Shader file extension.
pub const SHADER_EXTENSION: &str = "glsl";

/// Name of the shader directory relative to the install location.
pub const SHADER_DIR_NAME: &str = "shaders";

/// File name of the shader for a mode.
pub fn shader_file_name(mode: &str) -> String {
    format!("{}{}.{}", SHADER_PREFIX, mode, SHADER_EXTENSION)
}

/// Shader directory next to the running executable.
pub fn default_shader_dir() -> MediaResult<PathBuf> {
    let exe = std::env::current_exe()?;
    let install_dir = exe.parent().ok_or_else(|| {
        MediaError::invalid_configuration(format!(
            "cannot determine install directory of {}",
            exe.display()
        ))
    })?;
    Ok(install_dir.join(SHADER_DIR_NAME))
}

/// Resolve the shader file for `mode` inside `dir`.
///
/// The returned path is absolute. Fails with [`MediaError::ShaderNotFound`] when the file does
/// not exist and with [`MediaError::InvalidConfiguration`] when the mode cannot name a file.
pub fn resolve_shader(dir: impl AsRef<Path>, mode: &str) -> MediaResult<PathBuf> {
    validate_mode(mode)?;

    let path = std::path::absolute(dir.as_ref().join(shader_file_name(mode)))?;
    if !path.is_file() {
        return Err(MediaError::ShaderNotFound(path));
    }

    Ok(path)
}

fn validate_mode(mode: &str) -> MediaResult<()> {
    if mode.trim().is_empty() {
        return Err(MediaError::invalid_configuration("mode must not be empty"));
    }
    if mode.contains(['/', '\\']) || mode.contains("..") {
        return Err(MediaError::invalid_configuration(format!(
            "mode must not contain path components, got {:?}",
            mode
        )));
    }
    Ok(())
}

/// List the modes available in a shader directory, sorted.
pub async fn list_modes(dir: impl AsRef<Path>) -> MediaResult<Vec<String>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(MediaError::FileNotFound(dir.to_path_buf()));
    }

    let mut modes = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(mode) = mode_from_file_name(name) {
            modes.push(mode.to_string());
        }
    }

    modes.sort();
    Ok(modes)
}

fn mode_from_file_name(name: &str) -> Option<&str> {
    let mode = name
        .strip_prefix(SHADER_PREFIX)?
        .strip_suffix(SHADER_EXTENSION)?
        .strip_suffix('.')?;
    (!mode.is_empty()).then_some(mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_shader_file_name() {
        assert_eq!(shader_file_name("A"), "Anime4K_ModeA.glsl");
        assert_eq!(shader_file_name("B+B"), "Anime4K_ModeB+B.glsl");
    }

    #[test]
    fn test_resolve_existing_shader() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Anime4K_ModeA.glsl"), "// shader").unwrap();

        let path = resolve_shader(dir.path(), "A").unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("Anime4K_ModeA.glsl"));
    }

    #[test]
    fn test_missing_shader() {
        let dir = TempDir::new().unwrap();
        let err = resolve_shader(dir.path(), "C").unwrap_err();
        match err {
            MediaError::ShaderNotFound(path) => {
                assert!(path.is_absolute());
                assert!(path.ends_with("Anime4K_ModeC.glsl"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_directory_named_like_shader_is_not_a_shader() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("Anime4K_ModeA.glsl")).unwrap();
        assert!(matches!(
            resolve_shader(dir.path(), "A"),
            Err(MediaError::ShaderNotFound(_))
        ));
    }

    #[test]
    fn test_mode_with_path_components_rejected() {
        let dir = TempDir::new().unwrap();
        for mode in ["", "  ", "../A", "A/B", "..\\A"] {
            assert!(
                matches!(
                    resolve_shader(dir.path(), mode),
                    Err(MediaError::InvalidConfiguration(_))
                ),
                "mode {mode:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_mode_from_file_name() {
        assert_eq!(mode_from_file_name("Anime4K_ModeA.glsl"), Some("A"));
        assert_eq!(mode_from_file_name("Anime4K_ModeC+A.glsl"), Some("C+A"));
        assert_eq!(mode_from_file_name("Anime4K_Mode.glsl"), None);
        assert_eq!(mode_from_file_name("Anime4K_ModeA.txt"), None);
        assert_eq!(mode_from_file_name("Anime4K_Upscale_CNN_x2_M.glsl"), None);
    }

    #[tokio::test]
    async fn test_list_modes_sorted() {
        let dir = TempDir::new().unwrap();
        for name in ["Anime4K_ModeB.glsl", "Anime4K_ModeA.glsl", "README.md"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }

        let modes = list_modes(dir.path()).await.unwrap();
        assert_eq!(modes, vec!["A".to_string(), "B".to_string()]);
    }

    #[tokio::test]
    async fn test_list_modes_missing_dir() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            list_modes(&missing).await,
            Err(MediaError::FileNotFound(_))
        ));
    }
}
