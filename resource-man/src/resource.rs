// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Defines the type representing a single registered resource. */

use {
    crate::{
        error::{ResourceManError, Result},
        reader::{package_to_path, DecodeErrors, ResourceReader, ScopedPath, DEFAULT_ENCODING},
    },
    std::{
        fmt::{Display, Formatter},
        hash::{Hash, Hasher},
        path::{Path, PathBuf},
        sync::Arc,
    },
};

/// How the alias of a resource is determined.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AliasSpec {
    /// Use this exact string.
    Explicit(String),
    /// Use the resource name verbatim, e.g. `edit-cut.png`.
    FileName,
    /// Use the resource name without its extension, e.g. `edit-cut`.
    FileStem,
    /// Use the package path joined with the name, e.g. `acme/icons/edit-cut.png`.
    PackagePath,
}

impl Default for AliasSpec {
    fn default() -> Self {
        Self::FileStem
    }
}

impl From<&str> for AliasSpec {
    fn from(s: &str) -> Self {
        Self::Explicit(s.to_string())
    }
}

impl From<String> for AliasSpec {
    fn from(s: String) -> Self {
        Self::Explicit(s)
    }
}

impl AliasSpec {
    /// Compute the alias for a resource in a package.
    pub fn resolve(&self, package: &str, name: &str) -> String {
        match self {
            Self::Explicit(alias) => alias.clone(),
            Self::FileName => name.to_string(),
            Self::FileStem => {
                let name = name.trim_end_matches(|c| c == '/' || c == '\\');

                match Path::new(name).extension() {
                    Some(ext) => name[0..name.len() - ext.len() - 1].to_string(),
                    None => name.to_string(),
                }
            }
            Self::PackagePath => format!("{}/{}", package_to_path(package), name),
        }
    }
}

/// A file inside a package, known under an alias.
///
/// Instances are immutable. Two instances are equal when they refer to the
/// same package and name, regardless of alias.
#[derive(Clone, Debug)]
pub struct Resource {
    package: String,
    name: String,
    alias: String,
    reader: Arc<dyn ResourceReader>,
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.package == other.package && self.name == other.name
    }
}

impl Eq for Resource {}

impl Hash for Resource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.package.hash(state);
        self.name.hash(state);
    }
}

impl Display for Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.package_path())
    }
}

impl Resource {
    pub fn new(
        reader: Arc<dyn ResourceReader>,
        package: impl ToString,
        name: impl ToString,
        alias: impl Into<AliasSpec>,
    ) -> Self {
        let package = package.to_string();
        let name = name.to_string();
        let alias = alias.into().resolve(&package, &name);

        Self {
            package,
            name,
            alias,
            reader,
        }
    }

    /// The dotted name of the package containing this resource.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// The name of this resource relative to its package.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// The reader this resource delegates to.
    pub fn reader(&self) -> &Arc<dyn ResourceReader> {
        &self.reader
    }

    /// The `a/b/name` form of this resource's location.
    pub fn package_path(&self) -> String {
        format!("{}/{}", package_to_path(&self.package), self.name)
    }

    /// Whether the backing file exists.
    pub fn exists(&self) -> bool {
        self.reader.is_resource(&self.package, &self.name)
    }

    fn not_available(&self, err: std::io::Error) -> ResourceManError {
        ResourceManError::ResourceNotAvailable(format!("unable to read {}: {}", self, err))
    }

    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        self.reader
            .read_bytes(&self.package, &self.name)
            .map_err(|e| self.not_available(e))
    }

    /// Read the resource as UTF-8 text.
    pub fn read_text(&self) -> Result<String> {
        self.read_text_with(DEFAULT_ENCODING, DecodeErrors::Strict)
    }

    pub fn read_text_with(&self, encoding: &str, errors: DecodeErrors) -> Result<String> {
        self.reader
            .read_text(&self.package, &self.name, encoding, errors)
            .map_err(|e| self.not_available(e))
    }

    /// Names of entries in this resource's package.
    pub fn contents(&self) -> Result<Vec<String>> {
        self.reader
            .contents(&self.package)
            .map_err(|e| self.not_available(e))
    }

    /// The filesystem path of this resource, if it has one.
    pub fn resource_path(&self) -> Option<PathBuf> {
        self.reader.resource_path(&self.package, &self.name)
    }

    /// Obtain a filesystem path for this resource.
    ///
    /// The path is only guaranteed to exist while the returned value lives.
    pub fn as_file(&self) -> Result<ScopedPath> {
        self.reader
            .as_file(&self.package, &self.name)
            .map_err(|e| self.not_available(e))
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::reader::MemoryResources};

    fn reader() -> Arc<dyn ResourceReader> {
        let mut reader = MemoryResources::default();
        reader
            .add_resource("acme.icons", "edit-cut.png", b"png".to_vec())
            .unwrap();
        reader
            .add_resource("acme", "latin.txt", b"caf\xe9".to_vec())
            .unwrap();

        Arc::new(reader)
    }

    #[test]
    fn test_alias_resolution() {
        assert_eq!(
            AliasSpec::from("cut").resolve("acme.icons", "edit-cut.png"),
            "cut"
        );
        assert_eq!(
            AliasSpec::FileName.resolve("acme.icons", "edit-cut.png"),
            "edit-cut.png"
        );
        assert_eq!(
            AliasSpec::FileStem.resolve("acme.icons", "edit-cut.png"),
            "edit-cut"
        );
        assert_eq!(
            AliasSpec::FileStem.resolve("acme", "archive.tar.gz"),
            "archive.tar"
        );
        assert_eq!(AliasSpec::FileStem.resolve("acme", "LICENSE"), "LICENSE");
        assert_eq!(AliasSpec::FileStem.resolve("acme", ".hidden"), ".hidden");
        assert_eq!(AliasSpec::FileStem.resolve("acme", "a.png/"), "a");
        assert_eq!(
            AliasSpec::FileStem.resolve("acme", "icons/edit-cut.png"),
            "icons/edit-cut"
        );
        assert_eq!(
            AliasSpec::PackagePath.resolve("acme.icons", "edit-cut.png"),
            "acme/icons/edit-cut.png"
        );
    }

    #[test]
    fn test_equality_ignores_alias() {
        let reader = reader();

        let a = Resource::new(reader.clone(), "acme.icons", "edit-cut.png", "a");
        let b = Resource::new(reader.clone(), "acme.icons", "edit-cut.png", "b");
        let c = Resource::new(reader, "acme", "edit-cut.png", "a");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "acme/icons/edit-cut.png");
    }

    #[test]
    fn test_read() -> Result<()> {
        let reader = reader();

        let res = Resource::new(reader.clone(), "acme.icons", "edit-cut.png", AliasSpec::default());
        assert_eq!(res.alias(), "edit-cut");
        assert!(res.exists());
        assert_eq!(res.read_bytes()?, b"png".to_vec());
        assert_eq!(res.read_text()?, "png");
        assert_eq!(res.contents()?, vec!["edit-cut.png".to_string()]);
        assert!(res.resource_path().is_none());

        let latin = Resource::new(reader.clone(), "acme", "latin.txt", AliasSpec::FileName);
        assert!(latin.read_text().unwrap_err().is_not_available());
        assert_eq!(
            latin.read_text_with("latin1", DecodeErrors::Strict)?,
            "café"
        );

        let missing = Resource::new(reader, "acme", "missing.txt", AliasSpec::FileName);
        assert!(!missing.exists());
        let err = missing.read_bytes().unwrap_err();
        assert!(err.is_not_available());
        assert!(err.to_string().contains("acme/missing.txt"));

        Ok(())
    }
}
