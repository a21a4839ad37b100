// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Primitives for reading resources out of packages.

A *package* is addressed by a dotted name (`foo.bar`). A *resource* is a
file that lives inside a package and is addressed by a name relative to it.
Directories are never resources.

The [ResourceReader] trait is the only thing the registry layer knows about
where bytes come from. [FilesystemResources] resolves packages to
directories under a list of search roots and [MemoryResources] holds
everything in memory.
*/

use {
    encoding_rs::Encoding,
    std::{
        collections::{BTreeMap, BTreeSet},
        ffi::OsString,
        fmt::Debug,
        io::{Error, ErrorKind, Write},
        ops::Deref,
        path::{Component, Path, PathBuf},
    },
};

/// Environment variable holding extra filesystem search roots.
///
/// The value uses the platform's path list syntax (`:` separated on UNIX,
/// `;` on Windows).
pub const SEARCH_PATH_ENV: &str = "RESOURCE_MAN_PATH";

/// Encoding used when none is specified.
pub const DEFAULT_ENCODING: &str = "utf-8";

/// How to handle malformed data when decoding text.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DecodeErrors {
    /// Malformed data is an error.
    Strict,
    /// Malformed sequences are replaced with U+FFFD.
    Replace,
}

impl Default for DecodeErrors {
    fn default() -> Self {
        Self::Strict
    }
}

/// Decode bytes to a string using an encoding label like `utf-8` or `latin1`.
pub fn decode_text(data: &[u8], encoding: &str, errors: DecodeErrors) -> std::io::Result<String> {
    let encoding = Encoding::for_label(encoding.as_bytes()).ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidInput,
            format!("unknown encoding: {}", encoding),
        )
    })?;

    match errors {
        DecodeErrors::Strict => encoding
            .decode_without_bom_handling_and_without_replacement(data)
            .map(|s| s.into_owned())
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::InvalidData,
                    format!("data is not valid {}", encoding.name()),
                )
            }),
        DecodeErrors::Replace => {
            let (s, _) = encoding.decode_without_bom_handling(data);
            Ok(s.into_owned())
        }
    }
}

/// A filesystem path to a resource that is valid while this value lives.
///
/// Resources that already exist on the filesystem are referenced directly.
/// Otherwise the content is written to a temporary file that is deleted
/// when this value is dropped.
#[derive(Debug)]
pub enum ScopedPath {
    Existing(PathBuf),
    Temporary(tempfile::TempPath),
}

impl ScopedPath {
    /// Materialize data into a temporary file whose name ends with `name`.
    pub fn temporary(name: &str, data: &[u8]) -> std::io::Result<Self> {
        let basename = Path::new(name)
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut file = tempfile::Builder::new()
            .prefix("resource-man-")
            .suffix(&format!("-{}", basename))
            .tempfile()?;
        file.write_all(data)?;
        file.flush()?;

        Ok(Self::Temporary(file.into_temp_path()))
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Existing(p) => p,
            Self::Temporary(p) => p,
        }
    }

    /// Whether the path will be deleted when this instance is dropped.
    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }
}

impl Deref for ScopedPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        self.path()
    }
}

impl AsRef<Path> for ScopedPath {
    fn as_ref(&self) -> &Path {
        self.path()
    }
}

/// Interface for reading resources out of packages.
///
/// Implementations report failures as [std::io::Error]. A missing package or
/// resource should be [ErrorKind::NotFound].
pub trait ResourceReader: Debug + Send + Sync {
    /// Read the raw content of a resource.
    fn read_bytes(&self, package: &str, name: &str) -> std::io::Result<Vec<u8>>;

    /// Obtain names of entries directly inside a package.
    ///
    /// Not every returned name is a resource. Directories are included.
    fn contents(&self, package: &str) -> std::io::Result<Vec<String>>;

    /// Whether `name` is a resource inside `package`.
    ///
    /// Never errors: anything that can't be resolved is not a resource.
    fn is_resource(&self, package: &str, name: &str) -> bool;

    /// The filesystem path of a resource, if it has one.
    fn resource_path(&self, package: &str, name: &str) -> Option<PathBuf>;

    /// Read a resource and decode it to text.
    fn read_text(
        &self,
        package: &str,
        name: &str,
        encoding: &str,
        errors: DecodeErrors,
    ) -> std::io::Result<String> {
        let data = self.read_bytes(package, name)?;

        decode_text(&data, encoding, errors)
    }

    /// Obtain a filesystem path to a resource for the lifetime of the returned value.
    fn as_file(&self, package: &str, name: &str) -> std::io::Result<ScopedPath> {
        if let Some(path) = self.resource_path(package, name) {
            Ok(ScopedPath::Existing(path))
        } else {
            let data = self.read_bytes(package, name)?;

            ScopedPath::temporary(name, &data)
        }
    }
}

/// Split a dotted package name into its components.
pub fn package_components(package: &str) -> std::io::Result<Vec<&str>> {
    let parts = package.split('.').collect::<Vec<_>>();

    if parts
        .iter()
        .any(|p| p.is_empty() || p.contains('/') || p.contains('\\'))
    {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            format!("invalid package name: {}", package),
        ));
    }

    Ok(parts)
}

/// Convert a dotted package name to a relative `a/b/c` path string.
pub fn package_to_path(package: &str) -> String {
    package.replace('.', "/")
}

/// Ensure a resource name is a relative path without parent references.
fn validate_name(name: &str) -> std::io::Result<()> {
    let path = Path::new(name);

    if name.is_empty()
        || name.ends_with('/')
        || name.ends_with('\\')
        || !path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            format!("invalid resource name: {}", name),
        ));
    }

    Ok(())
}

/// Where [FilesystemResources] should look for packages.
#[derive(Clone, Debug)]
pub struct ReaderConfig {
    /// Explicit search roots. Consulted first, in order.
    pub search_paths: Vec<PathBuf>,
    /// Whether to search the current working directory.
    pub current_dir: bool,
    /// Whether to search the directory containing the running executable.
    pub executable_dir: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            search_paths: vec![],
            current_dir: true,
            executable_dir: true,
        }
    }
}

impl ReaderConfig {
    /// Construct an instance with search roots from [SEARCH_PATH_ENV].
    pub fn from_env() -> Self {
        let search_paths = std::env::var_os(SEARCH_PATH_ENV)
            .map(|value| Self::parse_search_paths(&value))
            .unwrap_or_default();

        Self {
            search_paths,
            ..Default::default()
        }
    }

    fn parse_search_paths(value: &OsString) -> Vec<PathBuf> {
        std::env::split_paths(value)
            .filter(|p| !p.as_os_str().is_empty())
            .collect()
    }

    /// Resolve the ordered list of search roots.
    pub fn resolve_search_paths(&self) -> Vec<PathBuf> {
        let mut paths = self.search_paths.clone();

        if self.current_dir {
            if let Ok(cwd) = std::env::current_dir() {
                paths.push(cwd);
            }
        }

        if self.executable_dir {
            if let Some(dir) = std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
            {
                paths.push(dir);
            }
        }

        let mut seen = BTreeSet::new();
        paths.retain(|p| seen.insert(p.clone()));

        paths
    }
}

/// Reads resources from package directories on the filesystem.
///
/// Package `foo.bar` is the directory `foo/bar` under the first search root
/// where that directory exists.
#[derive(Clone, Debug, Default)]
pub struct FilesystemResources {
    search_paths: Vec<PathBuf>,
}

impl FilesystemResources {
    pub fn new<P: Into<PathBuf>>(search_paths: impl IntoIterator<Item = P>) -> Self {
        Self {
            search_paths: search_paths.into_iter().map(|p| p.into()).collect(),
        }
    }

    pub fn from_config(config: &ReaderConfig) -> Self {
        Self::new(config.resolve_search_paths())
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Append a search root.
    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        self.search_paths.push(path.into());
    }

    /// Resolve the directory backing a package.
    pub fn package_directory(&self, package: &str) -> std::io::Result<PathBuf> {
        let components = package_components(package)?;

        for root in &self.search_paths {
            let mut candidate = root.clone();
            for c in &components {
                candidate.push(c);
            }

            if candidate.is_dir() {
                return Ok(candidate);
            }
        }

        Err(Error::new(
            ErrorKind::NotFound,
            format!("package not found: {}", package),
        ))
    }

    fn resolve(&self, package: &str, name: &str) -> std::io::Result<PathBuf> {
        validate_name(name)?;

        Ok(self.package_directory(package)?.join(name))
    }
}

impl ResourceReader for FilesystemResources {
    fn read_bytes(&self, package: &str, name: &str) -> std::io::Result<Vec<u8>> {
        let path = self.resolve(package, name)?;

        if path.is_dir() {
            return Err(Error::new(
                ErrorKind::Other,
                format!("{} is a directory", path.display()),
            ));
        }

        std::fs::read(&path)
    }

    fn contents(&self, package: &str) -> std::io::Result<Vec<String>> {
        let dir = self.package_directory(package)?;

        let mut names = vec![];
        for entry in std::fs::read_dir(&dir)? {
            if let Ok(name) = entry?.file_name().into_string() {
                names.push(name);
            }
        }
        names.sort();

        Ok(names)
    }

    fn is_resource(&self, package: &str, name: &str) -> bool {
        self.resolve(package, name)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }

    fn resource_path(&self, package: &str, name: &str) -> Option<PathBuf> {
        self.resolve(package, name).ok().filter(|p| p.is_file())
    }
}

/// Holds resource data in memory.
///
/// Names may contain `/` to model nested directories. Listing a package
/// reports the first component of such names, which is not a resource.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryResources {
    packages: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
}

impl MemoryResources {
    /// Define a package, even if it has no resources.
    pub fn add_package(&mut self, package: impl ToString) {
        self.packages.entry(package.to_string()).or_default();
    }

    /// Add a resource. Existing data for the same name is replaced.
    pub fn add_resource(
        &mut self,
        package: impl ToString,
        name: impl ToString,
        data: impl Into<Vec<u8>>,
    ) -> std::io::Result<()> {
        let package = package.to_string();
        let name = name.to_string();

        package_components(&package)?;
        validate_name(&name)?;

        self.packages
            .entry(package)
            .or_default()
            .insert(name, data.into());

        Ok(())
    }

    fn package(&self, package: &str) -> std::io::Result<&BTreeMap<String, Vec<u8>>> {
        self.packages.get(package).ok_or_else(|| {
            Error::new(
                ErrorKind::NotFound,
                format!("package not found: {}", package),
            )
        })
    }
}

impl ResourceReader for MemoryResources {
    fn read_bytes(&self, package: &str, name: &str) -> std::io::Result<Vec<u8>> {
        self.package(package)?.get(name).cloned().ok_or_else(|| {
            Error::new(
                ErrorKind::NotFound,
                format!("resource not found: {}/{}", package_to_path(package), name),
            )
        })
    }

    fn contents(&self, package: &str) -> std::io::Result<Vec<String>> {
        let names = self
            .package(package)?
            .keys()
            .map(|k| k.split('/').next().unwrap_or(k).to_string())
            .collect::<BTreeSet<_>>();

        Ok(names.into_iter().collect())
    }

    fn is_resource(&self, package: &str, name: &str) -> bool {
        self.packages
            .get(package)
            .map(|p| p.contains_key(name))
            .unwrap_or(false)
    }

    fn resource_path(&self, _package: &str, _name: &str) -> Option<PathBuf> {
        None
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::fs::{create_dir_all, write},
    };

    #[test]
    fn test_filesystem_resolution() -> std::io::Result<()> {
        let td = tempfile::Builder::new()
            .prefix("resource-man-test")
            .tempdir()?;
        let root_a = td.path().join("a");
        let root_b = td.path().join("b");

        create_dir_all(root_a.join("acme"))?;
        create_dir_all(root_b.join("acme").join("sub").join("nested"))?;
        write(root_b.join("acme").join("sub").join("rsc.txt"), "rsc")?;

        let reader = FilesystemResources::new(vec![root_a.clone(), root_b.clone()]);

        assert_eq!(reader.package_directory("acme")?, root_a.join("acme"));
        assert_eq!(
            reader.package_directory("acme.sub")?,
            root_b.join("acme").join("sub")
        );
        assert_eq!(reader.read_bytes("acme.sub", "rsc.txt")?, b"rsc".to_vec());
        assert!(reader.is_resource("acme.sub", "rsc.txt"));
        assert!(!reader.is_resource("acme.sub", "nested"));
        assert!(!reader.is_resource("acme", "rsc.txt"));
        assert_eq!(
            reader.contents("acme.sub")?,
            vec!["nested".to_string(), "rsc.txt".to_string()]
        );
        assert_eq!(
            reader.read_bytes("missing", "rsc.txt").unwrap_err().kind(),
            ErrorKind::NotFound
        );

        Ok(())
    }

    #[test]
    fn test_invalid_names() {
        let reader = FilesystemResources::new(vec![PathBuf::from(".")]);

        assert_eq!(
            reader.read_bytes("acme", "../x").unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            reader.read_bytes("acme..sub", "x").unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            reader.read_bytes("acme", "").unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            reader.read_bytes("acme", "rsc.txt/").unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
    }

    #[test]
    fn test_memory_contents() -> std::io::Result<()> {
        let mut reader = MemoryResources::default();
        reader.add_resource("acme", "b.txt", b"b".to_vec())?;
        reader.add_resource("acme", "a.txt", b"a".to_vec())?;
        reader.add_resource("acme", "icons/x.png", b"x".to_vec())?;
        reader.add_package("empty");

        assert_eq!(
            reader.contents("acme")?,
            vec!["a.txt".to_string(), "b.txt".to_string(), "icons".to_string()]
        );
        assert!(!reader.is_resource("acme", "icons"));
        assert!(reader.is_resource("acme", "icons/x.png"));
        assert!(reader.contents("empty")?.is_empty());
        assert!(reader.contents("missing").is_err());

        Ok(())
    }

    #[test]
    fn test_decode_text() -> std::io::Result<()> {
        assert_eq!(
            decode_text(b"caf\xc3\xa9", "utf-8", DecodeErrors::Strict)?,
            "café"
        );
        assert_eq!(
            decode_text(b"caf\xe9", "latin1", DecodeErrors::Strict)?,
            "café"
        );
        assert_eq!(
            decode_text(b"caf\xe9", "utf-8", DecodeErrors::Strict)
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidData
        );
        assert_eq!(
            decode_text(b"caf\xe9", "utf-8", DecodeErrors::Replace)?,
            "caf\u{fffd}"
        );
        assert_eq!(
            decode_text(b"x", "no-such-encoding", DecodeErrors::Strict)
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidInput
        );

        Ok(())
    }

    #[test]
    fn test_scoped_path() -> std::io::Result<()> {
        let td = tempfile::Builder::new()
            .prefix("resource-man-test")
            .tempdir()?;
        create_dir_all(td.path().join("acme"))?;
        write(td.path().join("acme").join("rsc.txt"), "fs")?;

        let fs_reader = FilesystemResources::new(vec![td.path().to_path_buf()]);
        let scoped = fs_reader.as_file("acme", "rsc.txt")?;
        assert!(!scoped.is_temporary());
        assert_eq!(scoped.path(), td.path().join("acme").join("rsc.txt"));

        let mut mem_reader = MemoryResources::default();
        mem_reader.add_resource("acme", "edit-cut.png", b"png".to_vec())?;

        let temp_path = {
            let scoped = mem_reader.as_file("acme", "edit-cut.png")?;
            assert!(scoped.is_temporary());
            assert!(scoped.to_string_lossy().ends_with("edit-cut.png"));
            assert_eq!(std::fs::read(&*scoped)?, b"png".to_vec());
            scoped.to_path_buf()
        };
        assert!(!temp_path.exists());

        Ok(())
    }

    #[test]
    fn test_config_search_paths() {
        let config = ReaderConfig {
            search_paths: vec![PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/a")],
            current_dir: false,
            executable_dir: false,
        };

        assert_eq!(
            config.resolve_search_paths(),
            vec![PathBuf::from("/a"), PathBuf::from("/b")]
        );

        let value = std::env::join_paths(vec!["/x", "/y"]).unwrap();
        assert_eq!(
            ReaderConfig::parse_search_paths(&value),
            vec![PathBuf::from("/x"), PathBuf::from("/y")]
        );
    }
}
