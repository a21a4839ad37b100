// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::reader::{MemoryResources, ResourceReader},
    std::{
        fs::{create_dir_all, write},
        path::Path,
        sync::Arc,
    },
};

/// An in-memory reader with a small icon theme.
pub fn icon_reader() -> Arc<dyn ResourceReader> {
    let mut reader = MemoryResources::default();

    for (package, name, data) in [
        ("acme", "rsc.txt", b"rsc.txt\n".to_vec()),
        ("acme.icons", "edit-cut.png", b"\x89PNGcut".to_vec()),
        ("acme.icons", "edit-copy.png", b"\x89PNGcopy".to_vec()),
        ("acme.icons", "EDIT-PASTE.PNG", b"\x89PNGpaste".to_vec()),
        ("acme.icons", "document-save-as.svg", b"<svg/>".to_vec()),
    ] {
        reader
            .add_resource(package, name, data)
            .expect("adding test resource");
    }
    reader.add_package("acme.empty");

    Arc::new(reader)
}

/// Write a package tree with resources and source files under `root`.
pub fn write_package_tree(root: &Path) -> std::io::Result<()> {
    let acme = root.join("acme");
    let sub = acme.join("sub");
    let cache = acme.join("__pycache__");

    create_dir_all(&sub)?;
    create_dir_all(&cache)?;

    write(acme.join("__init__.py"), "")?;
    write(acme.join("rsc.txt"), "rsc.txt\n")?;
    write(sub.join("__init__.py"), "")?;
    write(sub.join("rsc2.txt"), "rsc2.txt\n")?;
    write(sub.join("edit-cut.png"), b"\x89PNGcut")?;
    write(cache.join("__init__.cpython-39.pyc"), b"bc")?;

    Ok(())
}
