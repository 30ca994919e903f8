//! `modspec resolve` command implementation.
//!
//! Builds resolve options from flags and an optional JSON options file, reads
//! `package.json` descriptors from disk and prints the candidate sequence.

use miette::{IntoDiagnostic, Result};
use modspec_core::resolver::specifier::starts_with_windows_drive_letter;
use modspec_core::resolver::{
    resolve, resolve_async, FsPackageReader, PackageJson, ResolveOptions, Status, Target,
};
use modspec_core::{Config, ResolveError};
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;
use url::Url;

/// Exit code for resolution errors and unresolved `--first` lookups.
const EXIT_ERROR: i32 = 1;

/// Flags for one `modspec resolve` invocation.
#[derive(Debug, Clone, Default)]
pub struct ResolveArgs {
    pub specifier: String,
    pub parent: Option<String>,
    pub conditions: Vec<String>,
    pub extensions: Vec<String>,
    pub builtins: Vec<String>,
    pub engines: Vec<(String, String)>,
    pub builtin_protocol: Option<String>,
    pub options: Option<PathBuf>,
    pub first: bool,
    pub use_async: bool,
}

/// Result for JSON output.
#[derive(Serialize)]
struct ResolveReport {
    ok: bool,
    specifier: String,
    parent: String,
    candidates: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved: Option<String>,
    conditions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ReportError>,
}

/// Error info for JSON output.
#[derive(Serialize)]
struct ReportError {
    code: String,
    message: String,
}

/// What draining one resolution produced.
#[derive(Debug, Default)]
struct Drained {
    candidates: Vec<Url>,
    resolved: Option<Url>,
    conditions: Vec<String>,
    status: Option<Status>,
    error: Option<ResolveError>,
}

/// Run the resolve command.
pub fn run(config: &Config, args: &ResolveArgs, json: bool) -> Result<()> {
    let options = build_options(config, args)?;
    let parent = parent_url(config, args.parent.as_deref())?;

    let span = tracing::info_span!("resolve", specifier = %args.specifier, parent = %parent);
    let _guard = span.enter();

    let drained = if args.use_async {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .into_diagnostic()?;
        runtime.block_on(drain_async(&args.specifier, &parent, &options, args.first))
    } else {
        drain(&args.specifier, &parent, &options, args.first)
    };

    debug!(
        candidates = drained.candidates.len(),
        status = ?drained.status,
        "resolution finished"
    );

    report(args, &parent, drained, json)
}

/// Layer flags over the options file (or defaults). List flags append,
/// scalar flags replace. Condition flags append to every condition set.
fn build_options(config: &Config, args: &ResolveArgs) -> Result<ResolveOptions> {
    let mut options = match &args.options {
        Some(path) => ResolveOptions::from_path(&config.path(path)).into_diagnostic()?,
        None => ResolveOptions::new(),
    };

    options.conditions.extend(args.conditions.iter().cloned());
    options.extensions.extend(args.extensions.iter().cloned());
    options
        .builtins
        .extend(args.builtins.iter().map(|builtin| Target::leaf(builtin.as_str())));
    for (name, version) in &args.engines {
        options.engines.insert(name.clone(), version.clone());
    }
    if let Some(protocol) = &args.builtin_protocol {
        options.builtin_protocol.clone_from(protocol);
    }

    Ok(options)
}

/// Interpret `--parent` as a URL, or as a path relative to the working directory.
///
/// Without `--parent` the working directory itself is the parent.
fn parent_url(config: &Config, parent: Option<&str>) -> Result<Url> {
    let Some(parent) = parent else {
        return config.cwd_url().ok_or_else(|| {
            miette::miette!("Working directory {} is not absolute", config.cwd.display())
        });
    };

    if !starts_with_windows_drive_letter(parent) {
        if let Ok(url) = Url::parse(parent) {
            return Ok(url);
        }
    }

    let path = config.path(parent);
    let url = if parent.ends_with(['/', '\\']) || path.is_dir() {
        Url::from_directory_path(&path)
    } else {
        Url::from_file_path(&path)
    };
    url.map_err(|()| miette::miette!("Parent {} is not an absolute path", path.display()))
}

/// Whether a candidate exists. Only `file:` candidates are checked; other
/// schemes are supplied by the host and taken as present.
fn exists(candidate: &Url) -> bool {
    if candidate.scheme() != "file" {
        return true;
    }
    candidate
        .to_file_path()
        .map(|path| path.is_file())
        .unwrap_or(false)
}

async fn exists_async(candidate: &Url) -> bool {
    if candidate.scheme() != "file" {
        return true;
    }
    let Ok(path) = candidate.to_file_path() else {
        return false;
    };
    tokio::fs::metadata(&path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

fn drain(specifier: &str, parent: &Url, options: &ResolveOptions, first: bool) -> Drained {
    let fs = FsPackageReader::cached();
    let reader = |url: &Url| -> Option<PackageJson> {
        let pkg = fs.read(url);
        debug!(url = %url, found = pkg.is_some(), "package.json");
        pkg
    };

    let mut drained = Drained::default();
    let mut results = resolve(specifier, parent, options, reader);

    while let Some(candidate) = results.next() {
        match candidate {
            Ok(url) => {
                debug!(url = %url, "candidate");
                if first && exists(&url) {
                    results.confirm();
                    drained.resolved = Some(url.clone());
                }
                drained.candidates.push(url);
            }
            Err(err) => drained.error = Some(err),
        }
    }

    drained.conditions = results.matched_conditions();
    drained.status = results.status();
    drained
}

async fn drain_async(
    specifier: &str,
    parent: &Url,
    options: &ResolveOptions,
    first: bool,
) -> Drained {
    let mut drained = Drained::default();
    let mut results = resolve_async(specifier, parent, options, read_descriptor);

    while let Some(candidate) = results.next_candidate().await {
        match candidate {
            Ok(url) => {
                debug!(url = %url, "candidate");
                if first && exists_async(&url).await {
                    results.confirm();
                    drained.resolved = Some(url.clone());
                }
                drained.candidates.push(url);
            }
            Err(err) => drained.error = Some(err),
        }
    }

    drained.conditions = results.matched_conditions();
    drained.status = results.status();
    drained
}

/// Read a descriptor through `tokio::fs`. Missing or malformed files read as
/// absent.
async fn read_descriptor(url: Url) -> Option<PackageJson> {
    let pkg = match url.to_file_path() {
        Ok(path) => match tokio::fs::read_to_string(&path).await {
            Ok(text) => PackageJson::parse(&text).ok(),
            Err(_) => None,
        },
        Err(()) => None,
    };
    debug!(url = %url, found = pkg.is_some(), "package.json");
    pkg
}

fn status_str(status: Status) -> &'static str {
    match status {
        Status::Unresolved => "unresolved",
        Status::Yielded => "yielded",
        Status::Resolved => "resolved",
    }
}

fn report(args: &ResolveArgs, parent: &Url, drained: Drained, json: bool) -> Result<()> {
    let unresolved = args.first && drained.resolved.is_none();

    if json {
        let error = match &drained.error {
            Some(err) => Some(ReportError {
                code: err.code().to_string(),
                message: err.to_string(),
            }),
            None if unresolved => Some(ReportError {
                code: "NOT_FOUND".to_string(),
                message: format!("No candidate for '{}' exists", args.specifier),
            }),
            None => None,
        };
        let failed = error.is_some();

        let result = ResolveReport {
            ok: !failed,
            specifier: args.specifier.clone(),
            parent: parent.to_string(),
            candidates: drained.candidates.iter().map(Url::to_string).collect(),
            resolved: drained.resolved.as_ref().map(Url::to_string),
            conditions: drained.conditions,
            status: drained.status.map(status_str),
            error,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&result).into_diagnostic()?
        );

        if failed {
            std::process::exit(EXIT_ERROR);
        }
        return Ok(());
    }

    if let Some(err) = drained.error {
        for candidate in &drained.candidates {
            println!("{candidate}");
        }
        return Err(miette::miette!("{}: {}", err.code(), err));
    }

    if args.first {
        return match drained.resolved {
            Some(url) => {
                println!("{url}");
                Ok(())
            }
            None => Err(miette::miette!(
                "No candidate for '{}' exists",
                args.specifier
            )),
        };
    }

    for candidate in &drained.candidates {
        println!("{candidate}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_parent_url_defaults_to_cwd() {
        let dir = tempdir().unwrap();
        let url = parent_url(&Config::new(dir.path().to_path_buf()), None).unwrap();
        assert!(url.as_str().ends_with('/'));
        assert_eq!(url.to_file_path().unwrap(), dir.path());
    }

    #[test]
    fn test_parent_url_accepts_urls() {
        let dir = tempdir().unwrap();
        let url = parent_url(&Config::new(dir.path().to_path_buf()), Some("file:///a/b/c")).unwrap();
        assert_eq!(url.as_str(), "file:///a/b/c");
    }

    #[test]
    fn test_parent_url_relative_path() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();

        let file = parent_url(&Config::new(dir.path().to_path_buf()), Some("src/main.js")).unwrap();
        assert!(file.as_str().ends_with("/src/main.js"));

        let directory = parent_url(&Config::new(dir.path().to_path_buf()), Some("src")).unwrap();
        assert!(directory.as_str().ends_with("/src/"));
    }

    #[test]
    fn test_build_options_layers_flags() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("options.json"),
            r#"{"conditions": ["import"], "extensions": [".js"], "builtinProtocol": "node:"}"#,
        )
        .unwrap();

        let args = ResolveArgs {
            specifier: "d".to_string(),
            conditions: vec!["browser".to_string()],
            extensions: vec![".json".to_string()],
            builtins: vec!["fs@1.0.0".to_string()],
            engines: vec![("node".to_string(), "20.1.0".to_string())],
            options: Some(PathBuf::from("options.json")),
            ..ResolveArgs::default()
        };
        let options = build_options(&Config::new(dir.path().to_path_buf()), &args).unwrap();

        assert_eq!(options.conditions.as_sets(), [vec!["import", "browser"]]);
        assert_eq!(options.extensions, vec![".js", ".json"]);
        assert_eq!(options.builtins, vec![Target::leaf("fs@1.0.0")]);
        assert_eq!(options.engines.get("node").map(String::as_str), Some("20.1.0"));
        assert_eq!(options.builtin_protocol, "node:");
    }

    #[test]
    fn test_condition_flags_extend_every_set() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("options.json"),
            r#"{"conditions": [["import"], ["require"]]}"#,
        )
        .unwrap();

        let args = ResolveArgs {
            specifier: "d".to_string(),
            conditions: vec!["node".to_string()],
            options: Some(PathBuf::from("options.json")),
            ..ResolveArgs::default()
        };
        let options = build_options(&Config::new(dir.path().to_path_buf()), &args).unwrap();
        assert_eq!(
            options.conditions.as_sets(),
            [vec!["import", "node"], vec!["require", "node"]]
        );
    }

    #[test]
    fn test_builtin_protocol_flag_overrides_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("o.json"), r#"{"builtinProtocol": "node:"}"#).unwrap();

        let args = ResolveArgs {
            specifier: "fs".to_string(),
            builtin_protocol: Some("host:".to_string()),
            options: Some(PathBuf::from("o.json")),
            ..ResolveArgs::default()
        };
        let options = build_options(&Config::new(dir.path().to_path_buf()), &args).unwrap();
        assert_eq!(options.builtin_protocol, "host:");
    }

    #[test]
    fn test_exists_checks_files_only() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("d.js");
        fs::write(&file, "").unwrap();

        assert!(exists(&Url::from_file_path(&file).unwrap()));
        assert!(!exists(&Url::from_file_path(dir.path().join("e.js")).unwrap()));
        assert!(!exists(&Url::from_directory_path(dir.path()).unwrap()));
        assert!(exists(&Url::parse("builtin:fs").unwrap()));
    }
}
