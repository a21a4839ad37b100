// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Helpers for tools that freeze applications into executables.

Freezing tools need to know which data files to copy next to the frozen
executable and where to put them so package lookups keep working. A
[DataFile] is one such `(source, destination)` pair, where the destination
is a directory relative to the bundle root.
*/

use {
    crate::{
        error::{ResourceManError, Result},
        reader::{package_to_path, FilesystemResources},
        registry::ResourceManager,
    },
    std::{
        io::ErrorKind,
        path::{Path, PathBuf},
        sync::Arc,
    },
};

/// File suffixes that are code rather than data.
pub const DEFAULT_EXCLUDED_SUFFIXES: &[&str] = &[".py", ".pyw", ".pyc", ".pyd"];

/// Directory names never descended into.
pub const SKIPPED_DIRECTORIES: &[&str] = &["__pycache__"];

/// Separator between source and destination in `--add-data` values.
#[cfg(windows)]
pub const DATA_SEPARATOR: char = ';';
#[cfg(not(windows))]
pub const DATA_SEPARATOR: char = ':';

/// A data file to bundle.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct DataFile {
    /// Absolute path of the file to copy.
    pub source: PathBuf,
    /// Directory, relative to the bundle root, to copy it into.
    pub destination: PathBuf,
}

impl DataFile {
    /// The value of an `--add-data` argument for this file.
    pub fn to_add_data_value(&self) -> String {
        format!(
            "{}{}{}",
            self.source.display(),
            DATA_SEPARATOR,
            self.destination.display()
        )
    }
}

/// Format data files as repeated `--add-data <value>` arguments.
pub fn add_data_args(datas: &[DataFile]) -> Vec<String> {
    datas
        .iter()
        .flat_map(|d| vec!["--add-data".to_string(), d.to_add_data_value()])
        .collect()
}

fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Resolve data files for everything registered in a manager and its links.
///
/// Only registrations whose file exists on the filesystem are included.
/// Each file is destined for the directory of its package.
pub fn registered_datas(manager: &Arc<ResourceManager>) -> Vec<DataFile> {
    let mut datas: Vec<DataFile> = vec![];

    for m in manager.manager_tree() {
        for resource in m.sorted_resources() {
            let source = match resource.resource_path() {
                Some(p) => absolute(&p),
                None => continue,
            };

            let mut destination = PathBuf::from(package_to_path(resource.package()));
            if let Some(parent) = Path::new(resource.name()).parent() {
                if !parent.as_os_str().is_empty() {
                    destination.push(parent);
                }
            }

            let data = DataFile {
                source,
                destination,
            };

            if !datas.contains(&data) {
                datas.push(data);
            }
        }
    }

    datas
}

/// Find every data file in a package tree on the filesystem.
///
/// Subdirectories are searched recursively, except those named in
/// [SKIPPED_DIRECTORIES]. Files whose name ends with one of `exclude`
/// (default [DEFAULT_EXCLUDED_SUFFIXES]) are skipped. Results are ordered
/// by path.
pub fn find_datas(
    reader: &FilesystemResources,
    package: &str,
    exclude: Option<&[&str]>,
) -> Result<Vec<DataFile>> {
    let exclude = exclude.unwrap_or(DEFAULT_EXCLUDED_SUFFIXES);

    let root = reader.package_directory(package).map_err(|e| match e.kind() {
        ErrorKind::NotFound | ErrorKind::InvalidInput => ResourceManError::ResourceNotAvailable(
            format!("unable to locate package {}: {}", package, e),
        ),
        _ => ResourceManError::Io(e),
    })?;
    let package_dir = PathBuf::from(package_to_path(package));

    let walk = walkdir::WalkDir::new(&root)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        .into_iter()
        .filter_entry(|entry| {
            !(entry.file_type().is_dir()
                && SKIPPED_DIRECTORIES
                    .iter()
                    .any(|d| entry.file_name() == std::ffi::OsStr::new(d)))
        });

    let mut datas: Vec<DataFile> = vec![];

    for entry in walk {
        let entry = entry.map_err(std::io::Error::from)?;

        if entry.file_type().is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if exclude.iter().any(|suffix| name.ends_with(suffix)) {
            continue;
        }

        let rel = entry
            .path()
            .strip_prefix(&root)
            .map_err(|e| ResourceManError::InvalidPath(e.to_string()))?;

        let mut destination = package_dir.clone();
        if let Some(parent) = rel.parent() {
            if !parent.as_os_str().is_empty() {
                destination.push(parent);
            }
        }

        let data = DataFile {
            source: absolute(entry.path()),
            destination,
        };

        if !datas.contains(&data) {
            datas.push(data);
        }
    }

    Ok(datas)
}
