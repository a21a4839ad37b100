// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! The process-wide default [ResourceManager].

The default manager reads from the filesystem using search roots from
[crate::reader::ReaderConfig::from_env]. It is created on first use and can
be replaced with [set_global_manager] or, for the duration of a scope, with
[temp_manager].

The free functions in this module operate on whatever manager is current.
Code that wants isolation should hold its own [ResourceManager] instead.
*/

use {
    crate::{
        error::Result,
        registry::ResourceManager,
        resolver::Resolved,
        resource::{AliasSpec, Resource},
    },
    linked_hash_map::LinkedHashMap,
    once_cell::sync::Lazy,
    std::{
        ops::Deref,
        sync::{Arc, PoisonError, RwLock},
    },
};

static GLOBAL_MANAGER: Lazy<RwLock<Arc<ResourceManager>>> =
    Lazy::new(|| RwLock::new(Arc::new(ResourceManager::from_env())));

/// Obtain the current global manager.
pub fn global_manager() -> Arc<ResourceManager> {
    GLOBAL_MANAGER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replace the global manager, returning the previous one.
pub fn set_global_manager(manager: Arc<ResourceManager>) -> Arc<ResourceManager> {
    let mut current = GLOBAL_MANAGER
        .write()
        .unwrap_or_else(PoisonError::into_inner);

    std::mem::replace(&mut *current, manager)
}

/// A global manager installed for a limited scope.
///
/// The previous global manager is restored when this is dropped.
#[derive(Debug)]
pub struct TempManager {
    manager: Arc<ResourceManager>,
    previous: Option<Arc<ResourceManager>>,
}

impl TempManager {
    pub fn manager(&self) -> &Arc<ResourceManager> {
        &self.manager
    }
}

impl Deref for TempManager {
    type Target = ResourceManager;

    fn deref(&self) -> &Self::Target {
        &self.manager
    }
}

impl Drop for TempManager {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            set_global_manager(previous);
        }
    }
}

/// Install `manager` as the global manager until the returned guard is dropped.
pub fn temp_manager(manager: Arc<ResourceManager>) -> TempManager {
    let previous = set_global_manager(manager.clone());

    TempManager {
        manager,
        previous: Some(previous),
    }
}

/// Link a manager to the global manager so global lookups fall through to it.
pub fn add_manager(manager: Arc<ResourceManager>) -> Result<()> {
    global_manager().link(manager)
}

/// Unlink a manager from the global manager.
pub fn remove_manager(manager: &Arc<ResourceManager>) -> bool {
    global_manager().unlink(manager)
}

pub fn register(package: impl ToString, name: impl ToString, alias: impl Into<AliasSpec>) -> Resource {
    global_manager().register(package, name, alias)
}

pub fn register_directory(package: &str, extensions: Option<&[&str]>) -> Result<Vec<Resource>> {
    global_manager().register_directory(package, extensions)
}

pub fn unregister(alias: &str, package: Option<&str>, name: Option<&str>) -> usize {
    global_manager().unregister(alias, package, name)
}

pub fn clear() {
    global_manager().clear()
}

pub fn has_resource(alias: &str) -> bool {
    global_manager().has_resource(alias)
}

pub fn get_resources() -> LinkedHashMap<String, Resource> {
    global_manager().get_resources()
}

pub fn get_resource(alias: &str, fallbacks: &[&str]) -> Result<Resource> {
    global_manager().get_resource(alias, fallbacks)
}

pub fn get_resource_or<T>(alias: &str, fallbacks: &[&str], default: T) -> Resolved<T> {
    global_manager().get_resource_or(alias, fallbacks, default)
}

pub fn get_binary(alias: &str, fallbacks: &[&str]) -> Result<Vec<u8>> {
    global_manager().get_binary(alias, fallbacks)
}

pub fn get_binary_or(alias: &str, fallbacks: &[&str], default: impl Into<Vec<u8>>) -> Vec<u8> {
    global_manager().get_binary_or(alias, fallbacks, default)
}

pub fn get_text(alias: &str, fallbacks: &[&str]) -> Result<String> {
    global_manager().get_text(alias, fallbacks)
}

pub fn get_text_or(alias: &str, fallbacks: &[&str], default: impl Into<String>) -> String {
    global_manager().get_text_or(alias, fallbacks, default)
}

pub fn is_resource(package: &str, name: &str) -> bool {
    global_manager().is_resource(package, name)
}

pub fn contents(package: &str) -> Result<Vec<String>> {
    global_manager().contents(package)
}

#[cfg(test)]
mod tests {
    use {super::*, crate::testutil::icon_reader};

    // Everything touching the global manager lives in this one test so
    // parallel test threads can't observe each other's state.
    #[test]
    fn test_global_manager() -> Result<()> {
        let outer = global_manager();

        {
            let temp = temp_manager(Arc::new(ResourceManager::new(icon_reader())));
            assert!(Arc::ptr_eq(&global_manager(), temp.manager()));

            let res = register("acme.icons", "edit-cut.png", AliasSpec::FileStem);
            assert_eq!(res.alias(), "edit-cut");
            assert!(has_resource("edit-cut"));
            assert_eq!(get_binary("edit-cut", &[])?, b"\x89PNGcut".to_vec());
            assert_eq!(get_text("missing", &["rsc"]).ok(), None);
            assert_eq!(get_text_or("missing", &[], "fallback"), "fallback");
            assert!(is_resource("acme", "rsc.txt"));
            assert!(contents("acme.icons")?.contains(&"edit-copy.png".to_string()));

            let linked = Arc::new(ResourceManager::with_prefix(icon_reader(), "rman2"));
            linked.register("acme", "rsc.txt", AliasSpec::FileName);
            add_manager(linked.clone())?;
            assert_eq!(get_text("rsc.txt", &[])?, "rsc.txt\n");
            assert!(get_resources().get("rsc.txt").is_none());
            assert!(remove_manager(&linked));
            assert!(!has_resource("rsc.txt"));

            assert_eq!(register_directory("acme.icons", Some(&[".svg"]))?.len(), 1);
            assert!(get_resource("document-save-as", &[])?.exists());
            assert_eq!(unregister("document-save-as", None, None), 1);

            clear();
            assert!(!has_resource("edit-cut"));
            assert!(get_resource_or("edit-cut", &[], 0).is_default());
        }

        assert!(Arc::ptr_eq(&global_manager(), &outer));

        Ok(())
    }
}
