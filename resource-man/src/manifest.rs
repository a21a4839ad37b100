// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Emitting the state of a registry for external tooling.

[ResourceManager::registered_entries] flattens a manager's current view into
a list sorted by alias. Sorting makes output independent of registration
order, so a manifest regenerated from the same registrations is byte
identical and anything compiled from it is reproducible.

[QrcDocument] turns that list into a Qt resource collection (`.qrc`) file,
which Qt's `rcc` compiles into a loadable binary blob.
*/

use {
    crate::{
        error::{ResourceManError, Result},
        registry::ResourceManager,
        resource::Resource,
    },
    std::{
        io::Write,
        path::{Path, PathBuf},
        sync::Arc,
    },
    xml::{
        common::XmlVersion,
        writer::{EmitterConfig, EventWriter, XmlEvent},
    },
};

/// A registration as seen by manifest consumers.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct RegisteredEntry {
    pub alias: String,
    pub package: String,
    pub name: String,
}

impl From<&Resource> for RegisteredEntry {
    fn from(r: &Resource) -> Self {
        Self {
            alias: r.alias().to_string(),
            package: r.package().to_string(),
            name: r.name().to_string(),
        }
    }
}

impl ResourceManager {
    /// Current resources of this manager, sorted by alias.
    pub(crate) fn sorted_resources(&self) -> Vec<Resource> {
        let mut resources = self.get_resources().into_iter().collect::<Vec<_>>();
        resources.sort_by(|(a, _), (b, _)| a.cmp(b));

        resources.into_iter().map(|(_, r)| r).collect()
    }

    /// The current registration of every alias in this manager, sorted by alias.
    ///
    /// Shadowed registrations and linked managers are not included.
    pub fn registered_entries(&self) -> Vec<RegisteredEntry> {
        self.sorted_resources()
            .iter()
            .map(RegisteredEntry::from)
            .collect()
    }

    /// This manager followed by every manager reachable through links.
    ///
    /// Order is depth first in link order. Each manager appears once.
    pub fn manager_tree(self: &Arc<Self>) -> Vec<Arc<ResourceManager>> {
        let mut managers: Vec<Arc<ResourceManager>> = vec![];
        let mut stack = vec![self.clone()];

        while let Some(manager) = stack.pop() {
            if managers.iter().any(|m| Arc::ptr_eq(m, &manager)) {
                continue;
            }

            for linked in manager.linked_managers().into_iter().rev() {
                stack.push(linked);
            }

            managers.push(manager);
        }

        managers
    }
}

/// A `<file>` entry in a Qt resource collection.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QrcFile {
    pub alias: String,
    /// Path to the file, relative to the `.qrc` file when possible.
    pub source: String,
}

/// A `<qresource>` block in a Qt resource collection.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QrcResource {
    /// Prefix without leading or trailing slashes. Empty means the root.
    pub prefix: String,
    pub files: Vec<QrcFile>,
}

/// A Qt resource collection file.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct QrcDocument {
    pub resources: Vec<QrcResource>,
}

fn normalize_path(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Express `path` relative to `base` if it lives under it.
fn manifest_source(path: &Path, base: &Path) -> String {
    let path = normalize_path(path);
    let base = normalize_path(base);

    let s = match path.strip_prefix(&base) {
        Ok(rel) => rel.to_string_lossy().to_string(),
        Err(_) => path.to_string_lossy().to_string(),
    };

    s.replace('\\', "/")
}

impl QrcDocument {
    /// Build a document from a manager and every manager linked to it.
    ///
    /// `relative_to` is the directory the `.qrc` file will be written to.
    /// Every registered resource must exist on the filesystem.
    pub fn from_manager(manager: &Arc<ResourceManager>, relative_to: &Path) -> Result<Self> {
        let mut resources = vec![];

        for m in manager.manager_tree() {
            let mut files = vec![];

            for resource in m.sorted_resources() {
                let path = resource.resource_path().ok_or_else(|| {
                    ResourceManError::ResourceNotAvailable(format!(
                        "{} (alias \"{}\") does not exist on the filesystem",
                        resource,
                        resource.alias()
                    ))
                })?;

                files.push(QrcFile {
                    alias: resource.alias().to_string(),
                    source: manifest_source(&path, relative_to),
                });
            }

            if !files.is_empty() {
                resources.push(QrcResource {
                    prefix: m.prefix().to_string(),
                    files,
                });
            }
        }

        Ok(Self { resources })
    }

    /// Convert the instance to pretty-printed XML.
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let config = EmitterConfig::new().perform_indent(true);

        let mut emitter = config.create_writer(std::io::BufWriter::new(vec![]));
        self.write_xml(&mut emitter)?;

        emitter
            .into_inner()
            .into_inner()
            .map_err(|e| ResourceManError::Io(e.into_error()))
    }

    pub fn write_xml<W: Write>(&self, writer: &mut EventWriter<W>) -> Result<()> {
        writer.write(XmlEvent::StartDocument {
            version: XmlVersion::Version10,
            encoding: Some("utf-8"),
            standalone: None,
        })?;

        writer.write(XmlEvent::start_element("RCC").attr("version", "1.0"))?;

        for resource in &self.resources {
            let prefix = format!("/{}", resource.prefix);
            writer.write(XmlEvent::start_element("qresource").attr("prefix", &prefix))?;

            for file in &resource.files {
                writer.write(XmlEvent::start_element("file").attr("alias", &file.alias))?;
                writer.write(XmlEvent::characters(&file.source))?;
                writer.write(XmlEvent::end_element().name("file"))?;
            }

            writer.write(XmlEvent::end_element().name("qresource"))?;
        }

        writer.write(XmlEvent::end_element().name("RCC"))?;

        Ok(())
    }

    /// Write the document to a file, creating parent directories.
    pub fn write_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, self.to_xml()?)?;

        Ok(())
    }
}
