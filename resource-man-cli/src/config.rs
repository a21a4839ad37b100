// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Registration files.

A registration file is a TOML document declaring the resources an
application registers, so tooling can rebuild the application's registry
without running it.
*/

use {
    anyhow::{anyhow, Context, Result},
    log::debug,
    resource_man::{
        reader::SEARCH_PATH_ENV, AliasSpec, FilesystemResources, ResourceManager,
    },
    serde::Deserialize,
    std::{
        path::{Path, PathBuf},
        sync::Arc,
    },
};

/// How to derive an alias when none is given.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum DeriveAlias {
    FileStem,
    FileName,
    PackagePath,
}

impl From<DeriveAlias> for AliasSpec {
    fn from(v: DeriveAlias) -> Self {
        match v {
            DeriveAlias::FileStem => AliasSpec::FileStem,
            DeriveAlias::FileName => AliasSpec::FileName,
            DeriveAlias::PackagePath => AliasSpec::PackagePath,
        }
    }
}

/// A single `[[resource]]` registration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ResourceEntry {
    pub package: String,
    pub name: String,
    pub alias: Option<String>,
    pub derive_alias: Option<DeriveAlias>,
}

impl ResourceEntry {
    fn alias_spec(&self) -> Result<AliasSpec> {
        match (&self.alias, self.derive_alias) {
            (Some(_), Some(_)) => Err(anyhow!(
                "resource {} in {} cannot set both alias and derive_alias",
                self.name,
                self.package
            )),
            (Some(alias), None) => Ok(AliasSpec::Explicit(alias.clone())),
            (None, Some(derive)) => Ok(derive.into()),
            (None, None) => Ok(AliasSpec::default()),
        }
    }
}

/// A `[[directory]]` registration covering every matching file in a package.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DirectoryEntry {
    pub package: String,
    pub extensions: Option<Vec<String>>,
}

/// Registrations belonging to one manager.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ManagerEntry {
    #[serde(default)]
    pub prefix: String,
    #[serde(default, rename = "resource")]
    pub resources: Vec<ResourceEntry>,
    #[serde(default, rename = "directory")]
    pub directories: Vec<DirectoryEntry>,
}

impl ManagerEntry {
    fn apply(&self, manager: &ResourceManager) -> Result<()> {
        for entry in &self.resources {
            let resource = manager.register(&entry.package, &entry.name, entry.alias_spec()?);
            debug!("registered {} as {}", resource, resource.alias());
        }

        for entry in &self.directories {
            let extensions = entry
                .extensions
                .as_ref()
                .map(|exts| exts.iter().map(|s| s.as_str()).collect::<Vec<_>>());

            let registered = manager
                .register_directory(&entry.package, extensions.as_deref())
                .with_context(|| format!("registering directory of {}", entry.package))?;

            for resource in registered {
                debug!("registered {} as {}", resource, resource.alias());
            }
        }

        Ok(())
    }
}

/// A parsed registration file.
///
/// Top level registrations belong to the primary manager.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RegistrationFile {
    /// Roots packages are searched under, relative to the file.
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
    #[serde(default)]
    pub prefix: String,
    #[serde(default, rename = "resource")]
    pub resources: Vec<ResourceEntry>,
    #[serde(default, rename = "directory")]
    pub directories: Vec<DirectoryEntry>,
    /// Additional managers linked to the primary one.
    #[serde(default, rename = "manager")]
    pub managers: Vec<ManagerEntry>,
}

impl RegistrationFile {
    /// The registrations of the primary manager.
    pub fn primary(&self) -> ManagerEntry {
        ManagerEntry {
            prefix: self.prefix.clone(),
            resources: self.resources.clone(),
            directories: self.directories.clone(),
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing registration file")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;

        Self::parse(&data).with_context(|| format!("loading {}", path.display()))
    }

    /// Filesystem search roots, resolved against `base_dir`.
    ///
    /// With no configured roots, `base_dir` itself is searched. Roots from
    /// the environment are searched last.
    pub fn resolve_search_paths(&self, base_dir: &Path) -> Vec<PathBuf> {
        let mut paths = if self.search_paths.is_empty() {
            vec![base_dir.to_path_buf()]
        } else {
            self.search_paths
                .iter()
                .map(|p| base_dir.join(p))
                .collect::<Vec<_>>()
        };

        if let Some(value) = std::env::var_os(SEARCH_PATH_ENV) {
            paths.extend(std::env::split_paths(&value).filter(|p| !p.as_os_str().is_empty()));
        }

        paths
    }

    /// Build the registry described by this file.
    pub fn load_manager(&self, base_dir: &Path) -> Result<Arc<ResourceManager>> {
        let search_paths = self.resolve_search_paths(base_dir);
        debug!("package search paths: {:?}", search_paths);

        let reader = Arc::new(FilesystemResources::new(search_paths));

        let primary_entry = self.primary();
        let primary = Arc::new(ResourceManager::with_prefix(
            reader.clone(),
            &primary_entry.prefix,
        ));
        primary_entry.apply(&primary)?;

        for entry in &self.managers {
            let manager = Arc::new(ResourceManager::with_prefix(reader.clone(), &entry.prefix));
            entry.apply(&manager)?;
            primary.link(manager)?;
        }

        Ok(primary)
    }
}

/// Load a registration file and build its registry.
pub fn load_registrations(path: &Path) -> Result<Arc<ResourceManager>> {
    let file = RegistrationFile::from_path(path)?;

    let base_dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::env::current_dir()?,
    };

    file.load_manager(&base_dir)
}

#[cfg(test)]
mod tests {
    use {super::*, indoc::indoc};

    #[test]
    fn test_parse() -> Result<()> {
        let file = RegistrationFile::parse(indoc! {r#"
            search_paths = ["src"]
            prefix = "app"

            [[resource]]
            package = "acme.icons"
            name = "edit-cut.png"
            alias = "edit-cut"

            [[resource]]
            package = "acme"
            name = "rsc.txt"
            derive_alias = "file-name"

            [[directory]]
            package = "acme.themes"
            extensions = [".svg"]

            [[manager]]
            prefix = "rman2"

            [[manager.resource]]
            package = "acme"
            name = "rsc2.txt"
        "#})?;

        assert_eq!(file.search_paths, vec![PathBuf::from("src")]);
        assert_eq!(file.prefix, "app");
        assert_eq!(file.resources.len(), 2);
        assert_eq!(
            file.resources[0].alias_spec()?,
            AliasSpec::Explicit("edit-cut".to_string())
        );
        assert_eq!(file.resources[1].alias_spec()?, AliasSpec::FileName);
        assert_eq!(
            file.directories,
            vec![DirectoryEntry {
                package: "acme.themes".to_string(),
                extensions: Some(vec![".svg".to_string()]),
            }]
        );
        assert_eq!(file.managers.len(), 1);
        assert_eq!(file.managers[0].prefix, "rman2");
        assert_eq!(
            file.managers[0].resources[0].alias_spec()?,
            AliasSpec::FileStem
        );

        Ok(())
    }

    #[test]
    fn test_conflicting_alias() -> Result<()> {
        let file = RegistrationFile::parse(indoc! {r#"
            [[resource]]
            package = "acme"
            name = "rsc.txt"
            alias = "rsc"
            derive_alias = "file-stem"
        "#})?;

        assert!(file.resources[0].alias_spec().is_err());

        Ok(())
    }

    #[test]
    fn test_load_manager() -> Result<()> {
        let td = tempfile::Builder::new()
            .prefix("resource-man-cli-test")
            .tempdir()?;
        let icons = td.path().join("src").join("acme").join("icons");
        std::fs::create_dir_all(&icons)?;
        std::fs::write(icons.join("edit-cut.png"), "cut")?;
        std::fs::write(icons.join("edit-copy.png"), "copy")?;
        std::fs::write(icons.join("notes.txt"), "notes")?;

        let file = RegistrationFile::parse(indoc! {r#"
            search_paths = ["src"]

            [[directory]]
            package = "acme.icons"
            extensions = [".png"]

            [[manager]]
            prefix = "extra"

            [[manager.resource]]
            package = "acme.icons"
            name = "notes.txt"
        "#})?;

        let manager = file.load_manager(td.path())?;
        assert_eq!(manager.get_binary("edit-cut", &[])?, b"cut".to_vec());
        assert!(manager.has_resource("edit-copy"));
        assert_eq!(manager.get_text("notes", &[])?, "notes");
        assert!(manager.get_resources().get("notes").is_none());
        assert_eq!(manager.linked_managers()[0].prefix(), "extra");

        Ok(())
    }
}
