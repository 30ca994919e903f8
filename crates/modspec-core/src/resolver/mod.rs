//! Module specifier resolution.
//!
//! Computes which URLs to try, in which order, and which errors are fatal for
//! a specifier imported from a parent URL. Package descriptors are requested
//! from the caller mid-traversal; the resolver never checks whether a
//! candidate exists.

mod builtins;
pub mod conditions;
mod coroutine;
mod drive;
pub mod engines;
mod exports;
mod files;
pub mod options;
pub mod package_json;
pub mod pattern;
pub mod reader;
mod resolve;
pub mod scope;
pub mod specifier;
pub mod target;

pub use conditions::Conditions;
pub use coroutine::{Resolution, Resume, Status, Step};
pub use drive::{resolve, resolve_async, AsyncResolutions, Resolutions};
pub use engines::{satisfies, validate_engines};
pub use options::{ResolveOptions, DEFAULT_BUILTIN_PROTOCOL};
pub use package_json::{read_package_json, PackageJson};
pub use pattern::pattern_key_compare;
pub use reader::{AsyncPackageReader, FsPackageReader, PackageJsonStamp, PackageReader};
pub use scope::lookup_package_scope;
pub use specifier::{PackageSpecifier, SpecifierKind};
pub use target::{ExportsField, Target, TargetMap};
