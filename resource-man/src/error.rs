// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Error types. */

#[derive(Debug, thiserror::Error)]
pub enum ResourceManError {
    /// An alias could not be resolved or the resource behind it could not be read.
    ///
    /// Callers are expected to treat both causes identically. The message
    /// says which one occurred.
    #[error("resource not available: {0}")]
    ResourceNotAvailable(String),

    #[error("linking manager would create a cycle")]
    LinkCycle,

    #[error("invalid resource path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML write error: {0}")]
    XmlWrite(#[from] xml::writer::Error),

    #[error("resource compiler failed: {0}")]
    Compiler(String),
}

impl ResourceManError {
    /// Whether this error means a resource could not be found or read.
    pub fn is_not_available(&self) -> bool {
        matches!(self, Self::ResourceNotAvailable(_))
    }
}

pub type Result<T> = std::result::Result<T, ResourceManError>;
