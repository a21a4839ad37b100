// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Registry mapping aliases to resources.

A [ResourceManager] keeps, for every alias, the ordered list of resources
registered under it. The most recent registration *shadows* earlier ones:
lookups always see the last entry while the full chain stays available
for diagnostics.

Managers can be linked to other managers. Lookups consult the manager's
own entries first, then each linked manager in the order they were linked.
*/

use {
    crate::{
        error::{ResourceManError, Result},
        reader::{FilesystemResources, ReaderConfig, ResourceReader},
        resource::{AliasSpec, Resource},
    },
    linked_hash_map::LinkedHashMap,
    once_cell::sync::Lazy,
    std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// Serializes changes to the link graph across all managers.
///
/// Held across the cycle check and the insert so concurrent links can't
/// each pass the check and together form a cycle.
static LINK_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

#[derive(Debug, Default)]
struct RegistryState {
    entries: LinkedHashMap<String, Vec<Resource>>,
    links: Vec<Arc<ResourceManager>>,
}

/// An alias to resource registry.
///
/// Mutations take an exclusive lock. Lookups take a shared lock and never
/// hold it while consulting linked managers.
#[derive(Debug)]
pub struct ResourceManager {
    reader: Arc<dyn ResourceReader>,
    prefix: String,
    state: RwLock<RegistryState>,
}

impl ResourceManager {
    /// Construct an empty manager reading resources through `reader`.
    pub fn new(reader: Arc<dyn ResourceReader>) -> Self {
        Self::with_prefix(reader, "")
    }

    /// Construct an empty manager with a Qt resource prefix.
    ///
    /// The prefix is only used when emitting resource manifests.
    pub fn with_prefix(reader: Arc<dyn ResourceReader>, prefix: impl ToString) -> Self {
        Self {
            reader,
            prefix: prefix.to_string().trim_matches('/').to_string(),
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Construct a manager backed by the filesystem, configured from the environment.
    pub fn from_env() -> Self {
        Self::new(Arc::new(FilesystemResources::from_config(
            &ReaderConfig::from_env(),
        )))
    }

    pub fn reader(&self) -> &Arc<dyn ResourceReader> {
        &self.reader
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn read_state(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a resource under an alias.
    ///
    /// Earlier registrations of the same alias are kept but shadowed. The
    /// returned [Resource] can be used directly without going through alias
    /// lookup.
    pub fn register(
        &self,
        package: impl ToString,
        name: impl ToString,
        alias: impl Into<AliasSpec>,
    ) -> Resource {
        self.add_resource(Resource::new(self.reader.clone(), package, name, alias))
    }

    /// Register an already constructed [Resource] under its alias.
    pub fn add_resource(&self, resource: Resource) -> Resource {
        let mut state = self.write_state();

        state
            .entries
            .entry(resource.alias().to_string())
            .or_insert_with(Vec::new)
            .push(resource.clone());

        resource
    }

    /// Register every resource directly inside a package.
    ///
    /// When `extensions` is given, only names ending with one of them
    /// (compared case-insensitively) are registered. Aliases are derived
    /// from file names without their extension. Entries that aren't
    /// resources, such as directories, are skipped.
    pub fn register_directory(
        &self,
        package: &str,
        extensions: Option<&[&str]>,
    ) -> Result<Vec<Resource>> {
        let names = self.reader.contents(package).map_err(|e| {
            ResourceManError::ResourceNotAvailable(format!(
                "unable to list package {}: {}",
                package, e
            ))
        })?;

        let extensions = extensions.map(|exts| {
            exts.iter()
                .map(|ext| ext.to_lowercase())
                .collect::<Vec<_>>()
        });

        let mut registered = vec![];

        for name in names {
            if !self.reader.is_resource(package, &name) {
                continue;
            }

            if let Some(extensions) = &extensions {
                let lower = name.to_lowercase();

                if !extensions.iter().any(|ext| lower.ends_with(ext.as_str())) {
                    continue;
                }
            }

            registered.push(self.register(package, name, AliasSpec::FileStem));
        }

        Ok(registered)
    }

    /// Remove registrations under an alias.
    ///
    /// When `package` and/or `name` are given, only entries matching them are
    /// removed. Otherwise every entry under the alias is removed. Removing
    /// something that isn't registered is not an error.
    ///
    /// Returns the number of removed entries.
    pub fn unregister(&self, alias: &str, package: Option<&str>, name: Option<&str>) -> usize {
        let mut state = self.write_state();

        let removed = if let Some(resources) = state.entries.get_mut(alias) {
            let before = resources.len();
            resources.retain(|r| {
                !(package.map_or(true, |p| r.package() == p)
                    && name.map_or(true, |n| r.name() == n))
            });

            before - resources.len()
        } else {
            0
        };

        if state.entries.get(alias).map_or(false, |r| r.is_empty()) {
            state.entries.remove(alias);
        }

        removed
    }

    /// Remove one exact registration of a resource.
    ///
    /// Only the most recent matching entry under the resource's alias is
    /// removed. Returns whether an entry was removed.
    pub fn unregister_resource(&self, resource: &Resource) -> bool {
        let mut state = self.write_state();

        let (removed, now_empty) = match state.entries.get_mut(resource.alias()) {
            Some(resources) => match resources.iter().rposition(|r| r == resource) {
                Some(index) => {
                    resources.remove(index);
                    (true, resources.is_empty())
                }
                None => (false, false),
            },
            None => (false, false),
        };

        if now_empty {
            state.entries.remove(resource.alias());
        }

        removed
    }

    /// Remove every registration from this manager.
    ///
    /// Linked managers are neither cleared nor unlinked.
    pub fn clear(&self) {
        self.write_state().entries.clear();
    }

    /// Whether an alias resolves in this manager or a linked one.
    pub fn has_resource(&self, alias: &str) -> bool {
        self.lookup(alias).is_some()
    }

    /// Number of aliases registered directly in this manager.
    pub fn len(&self) -> usize {
        self.read_state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_state().entries.is_empty()
    }

    /// The current resource of every alias registered in this manager.
    ///
    /// Aliases are in first-registration order. Each maps to its most
    /// recently registered resource.
    pub fn get_resources(&self) -> LinkedHashMap<String, Resource> {
        self.read_state()
            .entries
            .iter()
            .filter_map(|(alias, resources)| {
                resources.last().map(|r| (alias.clone(), r.clone()))
            })
            .collect()
    }

    /// Every registration in this manager, including shadowed ones.
    ///
    /// Each alias maps to its resources in registration order.
    pub fn get_resources_raw(&self) -> LinkedHashMap<String, Vec<Resource>> {
        self.read_state().entries.clone()
    }

    /// The registrations of a single alias in this manager, oldest first.
    pub fn shadow_chain(&self, alias: &str) -> Vec<Resource> {
        self.read_state()
            .entries
            .get(alias)
            .cloned()
            .unwrap_or_default()
    }

    /// Resolve an alias to its current resource.
    pub fn lookup(&self, alias: &str) -> Option<Resource> {
        let links = {
            let state = self.read_state();

            if let Some(resource) = state.entries.get(alias).and_then(|r| r.last()) {
                return Some(resource.clone());
            }

            state.links.clone()
        };

        links.iter().find_map(|m| m.lookup(alias))
    }

    /// Whether this manager can reach `target` through its links.
    fn reaches(&self, target: *const ResourceManager) -> bool {
        if std::ptr::eq(self, target) {
            return true;
        }

        let links = self.read_state().links.clone();

        links.iter().any(|m| m.reaches(target))
    }

    /// Link another manager so lookups fall through to it.
    ///
    /// Linking a manager that is already linked does nothing.
    pub fn link(&self, other: Arc<ResourceManager>) -> Result<()> {
        let _guard = LINK_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

        if other.reaches(self) {
            return Err(ResourceManError::LinkCycle);
        }

        let mut state = self.write_state();

        if !state.links.iter().any(|m| Arc::ptr_eq(m, &other)) {
            state.links.push(other);
        }

        Ok(())
    }

    /// Remove a linked manager. Returns whether it was linked.
    pub fn unlink(&self, other: &Arc<ResourceManager>) -> bool {
        let _guard = LINK_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let mut state = self.write_state();
        let before = state.links.len();

        state.links.retain(|m| !Arc::ptr_eq(m, other));

        state.links.len() != before
    }

    /// Managers linked to this one, in link order.
    pub fn linked_managers(&self) -> Vec<Arc<ResourceManager>> {
        self.read_state().links.clone()
    }
}
