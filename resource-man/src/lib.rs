// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Aliases for package resources.

This crate lets application code register a friendly alias for a file that
ships inside a package and later read that file's bytes or text through
the alias alone.

```no_run
use resource_man::{register, get_binary, AliasSpec};

register("acme.icons", "edit-cut.png", AliasSpec::FileStem);

let png = get_binary("theme-edit-cut", &["edit-cut"]).unwrap_or_default();
```

Registrations live in a [ResourceManager]. A process-wide default manager
backs the free functions in [global]. Each manager reads files through a
[ResourceReader], so resources can come from directories on disk
([FilesystemResources]) or from memory ([MemoryResources]).

For packaging, [manifest] emits Qt resource collection files from a
registry, [compiler] runs a Qt resource compiler on them, and [packaging]
produces the data file arguments freezing tools need.
*/

pub mod compiler;
pub mod error;
pub mod global;
pub mod manifest;
pub mod packaging;
pub mod reader;
pub mod registry;
pub mod resolver;
pub mod resource;

#[cfg(test)]
mod testutil;

pub use crate::{
    error::{ResourceManError, Result},
    global::{
        add_manager, clear, contents, get_binary, get_binary_or, get_resource, get_resource_or,
        get_resources, get_text, get_text_or, global_manager, has_resource, is_resource,
        register, register_directory, remove_manager, set_global_manager, temp_manager,
        unregister, TempManager,
    },
    manifest::{QrcDocument, RegisteredEntry},
    reader::{
        DecodeErrors, FilesystemResources, MemoryResources, ReaderConfig, ResourceReader,
        ScopedPath,
    },
    registry::ResourceManager,
    resolver::Resolved,
    resource::{AliasSpec, Resource},
};
