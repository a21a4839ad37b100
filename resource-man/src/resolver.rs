// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Resolving aliases with fallbacks and defaults.

Registrations typically happen as a side effect of initializing many
independent modules, so a caller can't always know which aliases exist.
Every lookup therefore accepts a list of fallback aliases tried in order.
The `*_or` variants also accept a default that is returned instead of an
error.
*/

use {
    crate::{
        error::{ResourceManError, Result},
        reader::{DecodeErrors, DEFAULT_ENCODING},
        registry::ResourceManager,
        resource::Resource,
    },
    std::io::ErrorKind,
};

/// The outcome of a lookup that was given a default value.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolved<T> {
    /// An alias resolved to this resource.
    Resource(Resource),
    /// Nothing resolved and the default was returned.
    Default(T),
}

impl<T> Resolved<T> {
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default(_))
    }

    pub fn resource(&self) -> Option<&Resource> {
        match self {
            Self::Resource(r) => Some(r),
            Self::Default(_) => None,
        }
    }

    pub fn into_resource(self) -> Option<Resource> {
        match self {
            Self::Resource(r) => Some(r),
            Self::Default(_) => None,
        }
    }
}

fn format_attempted(alias: &str, fallbacks: &[&str]) -> String {
    std::iter::once(alias)
        .chain(fallbacks.iter().copied())
        .map(|a| format!("\"{}\"", a))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ResourceManager {
    /// Resolve the first of `alias` and `fallbacks` that is registered.
    pub fn get_resource(&self, alias: &str, fallbacks: &[&str]) -> Result<Resource> {
        std::iter::once(alias)
            .chain(fallbacks.iter().copied())
            .find_map(|a| self.lookup(a))
            .ok_or_else(|| {
                ResourceManError::ResourceNotAvailable(format!(
                    "no resource registered for {}",
                    format_attempted(alias, fallbacks)
                ))
            })
    }

    /// Like [Self::get_resource] but returns `default` when nothing resolves.
    pub fn get_resource_or<T>(&self, alias: &str, fallbacks: &[&str], default: T) -> Resolved<T> {
        match self.get_resource(alias, fallbacks) {
            Ok(resource) => Resolved::Resource(resource),
            Err(_) => Resolved::Default(default),
        }
    }

    /// Resolve an alias and read its content.
    pub fn get_binary(&self, alias: &str, fallbacks: &[&str]) -> Result<Vec<u8>> {
        self.get_resource(alias, fallbacks)?.read_bytes()
    }

    /// Resolve an alias and read its content, returning `default` on any failure.
    pub fn get_binary_or(
        &self,
        alias: &str,
        fallbacks: &[&str],
        default: impl Into<Vec<u8>>,
    ) -> Vec<u8> {
        self.get_binary(alias, fallbacks)
            .unwrap_or_else(|_| default.into())
    }

    /// Resolve an alias and read its content as UTF-8 text.
    pub fn get_text(&self, alias: &str, fallbacks: &[&str]) -> Result<String> {
        self.get_text_with(alias, fallbacks, DEFAULT_ENCODING, DecodeErrors::Strict)
    }

    /// Resolve an alias and decode its content with the named encoding.
    pub fn get_text_with(
        &self,
        alias: &str,
        fallbacks: &[&str],
        encoding: &str,
        errors: DecodeErrors,
    ) -> Result<String> {
        self.get_resource(alias, fallbacks)?
            .read_text_with(encoding, errors)
    }

    /// Resolve an alias and read its UTF-8 text, returning `default` on any failure.
    pub fn get_text_or(
        &self,
        alias: &str,
        fallbacks: &[&str],
        default: impl Into<String>,
    ) -> String {
        self.get_text(alias, fallbacks)
            .unwrap_or_else(|_| default.into())
    }

    /// Whether `name` is a resource in `package`, bypassing the registry.
    pub fn is_resource(&self, package: &str, name: &str) -> bool {
        self.reader().is_resource(package, name)
    }

    /// Names of entries in `package`, bypassing the registry.
    pub fn contents(&self, package: &str) -> Result<Vec<String>> {
        self.reader().contents(package).map_err(|e| match e.kind() {
            ErrorKind::NotFound | ErrorKind::InvalidInput => {
                ResourceManError::ResourceNotAvailable(format!(
                    "unable to list package {}: {}",
                    package, e
                ))
            }
            _ => ResourceManError::Io(e),
        })
    }
}
