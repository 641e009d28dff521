use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use macroquad::texture::Texture2D;
use queueboard_core::Role;
use tracing::{debug, warn};

const SUPPORTED_MANIFEST_VERSION: u32 = 1;

/// Optional manifest overriding the built-in icon paths.
const MANIFEST_FILE_NAME: &str = "icons.toml";

/// Role icons loaded from disk, keyed by role.
///
/// Roles without a usable image are simply absent; the canvas draws a colored
/// disc in their place.
#[derive(Debug)]
pub(crate) struct IconAtlas {
    textures: HashMap<Role, Texture2D>,
}

impl IconAtlas {
    /// Loads role icons from `directory`.
    ///
    /// When the directory holds an `icons.toml` manifest its entries replace
    /// the default paths. A malformed manifest is an error; unreadable images
    /// are logged and skipped.
    pub(crate) fn from_directory(directory: impl AsRef<Path>) -> Result<Self> {
        Self::from_directory_with_loader(directory, default_loader)
    }

    #[must_use]
    pub(crate) fn contains(&self, role: Role) -> bool {
        self.textures.contains_key(&role)
    }

    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.textures.len()
    }

    #[must_use]
    pub(crate) fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Retrieves the texture associated with the role, if one was loaded.
    #[must_use]
    pub(crate) fn texture(&self, role: Role) -> Option<Texture2D> {
        self.textures.get(&role).copied()
    }

    fn from_directory_with_loader(
        directory: impl AsRef<Path>,
        mut loader: impl FnMut(Role, &Path) -> Result<Texture2D>,
    ) -> Result<Self> {
        let directory = directory.as_ref();
        let manifest_path = directory.join(MANIFEST_FILE_NAME);
        let entries = if manifest_path.is_file() {
            let contents = fs::read_to_string(&manifest_path).with_context(|| {
                format!("failed to read icon manifest at {}", manifest_path.display())
            })?;
            parse_manifest(&contents, directory)?
        } else {
            default_entries(directory)
        };
        Ok(Self::from_entries(entries, &mut loader))
    }

    fn from_entries(
        entries: Vec<(Role, PathBuf)>,
        loader: &mut impl FnMut(Role, &Path) -> Result<Texture2D>,
    ) -> Self {
        let mut textures = HashMap::with_capacity(entries.len());
        for (role, path) in entries {
            match loader(role, &path) {
                Ok(texture) => {
                    debug!(%role, path = %path.display(), "loaded role icon");
                    let _ = textures.insert(role, texture);
                }
                Err(error) => {
                    warn!(%role, path = %path.display(), "role icon unavailable: {error:#}");
                }
            }
        }
        Self { textures }
    }
}

fn default_loader(_role: Role, path: &Path) -> Result<Texture2D> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read icon at {}", path.display()))?;
    Ok(Texture2D::from_file_with_format(&bytes, None))
}

fn default_entries(directory: &Path) -> Vec<(Role, PathBuf)> {
    Role::ALL
        .into_iter()
        .map(|role| (role, directory.join(role.style().icon_path)))
        .collect()
}

#[derive(Debug, serde::Deserialize)]
struct Manifest {
    version: u32,
    #[serde(default)]
    icons: HashMap<String, String>,
}

/// Resolves manifest entries in chart order. Roles the manifest leaves out
/// keep their default path.
fn parse_manifest(contents: &str, base_path: &Path) -> Result<Vec<(Role, PathBuf)>> {
    let manifest: Manifest =
        toml::from_str(contents).context("failed to parse icon manifest toml contents")?;
    if manifest.version != SUPPORTED_MANIFEST_VERSION {
        bail!(
            "unsupported icon manifest version {}; expected {}",
            manifest.version,
            SUPPORTED_MANIFEST_VERSION
        );
    }

    let mut overrides = HashMap::new();
    for (name, relative_path) in manifest.icons {
        let Some(role) = Role::from_id(&name) else {
            bail!("unknown role `{name}` in icon manifest");
        };
        if overrides.insert(role, base_path.join(relative_path)).is_some() {
            bail!("icon manifest contains duplicate entry for {role}");
        }
    }

    Ok(default_entries(base_path)
        .into_iter()
        .map(|(role, default_path)| (role, overrides.remove(&role).unwrap_or(default_path)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::cell::RefCell;

    #[test]
    fn manifest_overrides_keep_chart_order_and_defaults() {
        let manifest = r#"
            version = 1

            [icons]
            supporter = "custom/heal.png"
            attacker = "custom/dps.png"
        "#;

        let parsed = parse_manifest(manifest, Path::new("assets")).expect("manifest should parse");
        let roles: Vec<_> = parsed.iter().map(|(role, _)| *role).collect();
        assert_eq!(roles, Role::ALL.to_vec());
        assert_eq!(parsed[0].1, PathBuf::from("assets/custom/dps.png"));
        assert_eq!(parsed[1].1, PathBuf::from("assets/roles/all_rounder.png"));
        assert_eq!(parsed[4].1, PathBuf::from("assets/custom/heal.png"));
    }

    #[test]
    fn manifest_rejects_unknown_roles() {
        let manifest = r#"
            version = 1

            [icons]
            healer = "heal.png"
        "#;
        assert!(parse_manifest(manifest, Path::new("assets")).is_err());
    }

    #[test]
    fn manifest_rejects_other_versions() {
        let manifest = "version = 2\n";
        assert!(parse_manifest(manifest, Path::new("assets")).is_err());
    }

    #[test]
    fn manifest_accepts_role_id_spellings() {
        let manifest = r#"
            version = 1

            [icons]
            All-Rounder = "ar.png"
        "#;
        let parsed = parse_manifest(manifest, Path::new("x")).expect("manifest should parse");
        assert_eq!(parsed[Role::AllRounder.index()].1, PathBuf::from("x/ar.png"));
    }

    #[test]
    fn atlas_loads_each_role_once_in_chart_order() {
        let load_order = RefCell::new(Vec::new());
        let atlas = IconAtlas::from_entries(default_entries(Path::new("icons")), &mut |role, _| {
            load_order.borrow_mut().push(role);
            Ok(Texture2D::empty())
        });

        assert_eq!(load_order.into_inner(), Role::ALL.to_vec());
        assert_eq!(atlas.len(), Role::ALL.len());
        assert!(Role::ALL.into_iter().all(|role| atlas.texture(role).is_some()));
    }

    #[test]
    fn failed_icons_are_skipped() {
        let atlas = IconAtlas::from_entries(default_entries(Path::new("icons")), &mut |role, _| {
            if role == Role::Speedster {
                Err(anyhow!("corrupt image"))
            } else {
                Ok(Texture2D::empty())
            }
        });

        assert!(!atlas.contains(Role::Speedster));
        assert!(atlas.contains(Role::Defender));
        assert_eq!(atlas.len(), Role::ALL.len() - 1);
        assert!(!atlas.is_empty());
    }

    #[test]
    fn missing_directory_yields_an_empty_atlas() {
        let directory = std::env::temp_dir().join("queueboard-icons-missing");
        let atlas = IconAtlas::from_directory_with_loader(&directory, |_, path| {
            bail!("no file at {}", path.display())
        })
        .expect("absent manifest falls back to defaults");
        assert!(atlas.is_empty());
    }
}
