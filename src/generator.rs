//! The generation run.
//!
//! One [`Generator::run`] is a single pass over an input directory:
//!
//! 1. discover `*.h` files, skipping ignored stems, in sorted order
//! 2. parse every header
//! 3. reject duplicate class names
//! 4. plan and emit each class, writing its wrapper as soon as it exists
//! 5. write the module-wide files
//!
//! Every header is parsed before anything is emitted: the marshaller needs
//! the full set of declared types, and mixin sources may live in any header.
//! A parse error therefore stops the run before the first write.

use std::fs;
use std::path::{Path, PathBuf};

use polybind_codegen::{Artifact, ClassModelFilter, ModuleAssembler, SkipReason};
use polybind_core::{HeaderUnit, ModelError};
use polybind_parser::{HeaderParser, HeaderSource};
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::config::BindingConfig;
use crate::error::{GenerateError, Result};
use crate::sink::OutputSink;

/// Positional arguments of one run.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    /// Directory holding the headers.
    pub input: PathBuf,
    pub prefix: String,
    pub main_include: String,
    pub lib_small_name: String,
    pub lib_name: String,
    pub api_path: PathBuf,
    pub api_class_path: PathBuf,
    pub include_path: PathBuf,
    pub source_path: PathBuf,
    /// Manifest file, or comma-separated manifest files.
    pub manifest: Option<String>,
}

/// A class left out of the module, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedClass {
    pub name: String,
    pub header: String,
    pub reason: SkipReason,
}

/// What a run did.
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    /// Headers parsed, in processing order.
    pub headers: Vec<String>,
    /// Classes bound, in processing order.
    pub bound: Vec<String>,
    pub skipped: Vec<SkippedClass>,
    /// Registration symbols, in table order.
    pub symbols: Vec<String>,
    /// Every artifact path written, in write order.
    pub written: Vec<PathBuf>,
}

/// Read the class names listed in `manifest`.
///
/// `manifest` is one path or several separated by commas. Each file lists a
/// class per line; a path-prefixed entry keeps only its last segment and
/// blank lines are ignored.
pub fn read_manifest(manifest: &str) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for path in manifest.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let text = fs::read_to_string(path)
            .map_err(|e| GenerateError::io("cannot read manifest", path, e))?;
        names.extend(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .filter_map(|line| line.rsplit('/').next())
                .map(str::to_string),
        );
    }
    Ok(names)
}

/// Headers of `dir` whose stem is not in `ignore`, sorted by file name.
pub fn discover_headers(dir: &Path, ignore: &[String]) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).map_err(|e| GenerateError::io("cannot read directory", dir, e))?;

    let mut headers = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| GenerateError::io("cannot read directory", dir, e))?
            .path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != "h") {
            continue;
        }
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if ignore.iter().any(|i| *i == stem) {
            debug!(header = %path.display(), "ignoring header");
            continue;
        }
        headers.push(path);
    }
    headers.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(headers)
}

/// Fail on the first class name declared by two headers.
pub fn check_duplicates(units: &[HeaderUnit]) -> std::result::Result<(), ModelError> {
    let mut seen: FxHashMap<&str, &str> = FxHashMap::default();
    for unit in units {
        for class in &unit.classes {
            if let Some(first) = seen.insert(&class.name, &unit.file_name) {
                return Err(ModelError::DuplicateClass {
                    name: class.name.clone(),
                    first: first.to_string(),
                    second: unit.file_name.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Runs generation with a configuration and a header front end.
pub struct Generator<H = HeaderParser> {
    config: BindingConfig,
    headers: H,
}

impl Generator<HeaderParser> {
    /// Generator using the built-in header scanner.
    pub fn new(config: BindingConfig) -> Self {
        let headers = HeaderParser::new().with_ignored_macros(config.ignored_macros.iter().cloned());
        Self { config, headers }
    }

    /// Generator configured from the TOML file at `path`.
    pub fn from_config_file(path: &Path) -> Result<Self> {
        Ok(Self::new(BindingConfig::load(path)?))
    }
}

impl<H: HeaderSource> Generator<H> {
    pub fn with_source(config: BindingConfig, headers: H) -> Self {
        Self { config, headers }
    }

    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    /// Read, parse and generate everything `invocation` names.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run<S: OutputSink>(&self, invocation: &Invocation, sink: S) -> Result<GenerationReport> {
        let manifest = match &invocation.manifest {
            Some(manifest) => read_manifest(manifest)?,
            None => Vec::new(),
        };

        let paths = discover_headers(&invocation.input, &self.config.ignore_files)?;
        let mut units = Vec::with_capacity(paths.len());
        for path in &paths {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let source = fs::read_to_string(path)
                .map_err(|e| GenerateError::io("cannot read header", path, e))?;
            debug!(header = %file_name, "parsing");
            units.push(self.headers.parse_header(&file_name, &source)?);
        }
        info!(input = %invocation.input.display(), headers = units.len(), "parsed headers");

        self.generate(invocation, &manifest, &units, sink)
    }

    /// Generate from already parsed headers.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn generate<S: OutputSink>(
        &self,
        invocation: &Invocation,
        manifest: &[String],
        units: &[HeaderUnit],
        mut sink: S,
    ) -> Result<GenerationReport> {
        check_duplicates(units)?;

        let declared = units.iter().flat_map(|u| {
            u.declared_types
                .iter()
                .cloned()
                .chain(u.classes.iter().map(|c| c.name.clone()))
        });
        let marshaller = self.config.marshaller(declared);
        let policy = self.config.filter_policy(&invocation.prefix, manifest);
        let mut filter = ClassModelFilter::new(&policy, &marshaller)
            .with_classes(units.iter().flat_map(|u| u.classes.iter()));
        let mut assembler =
            ModuleAssembler::new(self.config.module_settings(invocation), &marshaller);

        let mut report = GenerationReport::default();
        for unit in units {
            assembler.add_header(unit.file_name.clone());
            report.headers.push(unit.file_name.clone());
        }

        for unit in units {
            for class in &unit.classes {
                if let Some(reason) = filter.class_skip_reason(class) {
                    debug!(class = %class.name, header = %unit.file_name, %reason, "skipping class");
                    report.skipped.push(SkippedClass {
                        name: class.name.clone(),
                        header: unit.file_name.clone(),
                        reason,
                    });
                    continue;
                }
                let Some(plan) = filter.plan(class) else {
                    continue;
                };
                debug!(
                    class = %plan.name,
                    methods = plan.methods.len(),
                    properties = plan.properties.len(),
                    "binding class"
                );
                let wrapper = assembler.add_class(&plan);
                write(&mut sink, &wrapper, &mut report)?;
                report.bound.push(plan.name);
            }
        }

        let module = assembler.finish();
        for artifact in &module.artifacts {
            write(&mut sink, artifact, &mut report)?;
        }
        report.symbols = module.symbols;

        info!(
            prefix = %invocation.prefix,
            bound = report.bound.len(),
            skipped = report.skipped.len(),
            symbols = report.symbols.len(),
            "generation finished"
        );
        Ok(report)
    }
}

fn write<S: OutputSink>(sink: &mut S, artifact: &Artifact, report: &mut GenerationReport) -> Result<()> {
    sink.write(artifact)
        .map_err(|e| GenerateError::io("cannot write", &artifact.path, e))?;
    report.written.push(artifact.path.clone());
    Ok(())
}
