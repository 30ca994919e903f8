#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

pub mod config;
pub mod error;
pub mod resolver;
pub mod version;

pub use config::Config;
pub use error::{Error, ResolveError};
pub use resolver::{
    resolve, resolve_async, PackageJson, Resolution, ResolveOptions, Resolutions, Resume, Status,
    Step, Target, TargetMap,
};
pub use version::VERSION;
