//! Configuration primitives and loader for the latex-review toolkit.
//!
//! Settings are resolved with the precedence stack
//! override flag → working directory → git root → built-in defaults.
//! Every value remembers the layer it came from so validation failures can
//! point at the file that introduced them.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use globset::Glob;
use serde::Deserialize;
use thiserror::Error;

const CONFIG_FILE_NAME: &str = ".latex-review.toml";

const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_WORKERS: usize = 2;
const DEFAULT_MAX_ATTEMPTS: usize = 3;
const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20240620";
const DEFAULT_MAX_TOKENS: u32 = 2000;
const DEFAULT_MAX_RETRIES: u32 = 5;
const DEFAULT_GENAI_TIMEOUT_SECS: u64 = 200;
const DEFAULT_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Complete configuration resolved from defaults and on-disk overrides.
#[derive(Clone, Debug)]
pub struct Config {
    pub project: ProjectSettings,
    pub compile: CompileSettings,
    pub guard: GuardSettings,
    pub genai: GenAiSettings,
    pub sources: ConfigSources,
}

/// Where the document lives and which files travel with it.
#[derive(Clone, Debug)]
pub struct ProjectSettings {
    pub root: PathBuf,
    /// Main `.tex` file relative to the document directory, when fixed.
    pub main_file: Option<PathBuf>,
    /// Supporting files matching any of these globs are not loaded.
    pub exclude: PatternList,
}

/// Build steps run by the compile gateway.
#[derive(Clone, Debug)]
pub struct CompileSettings {
    pub steps: Vec<CompileStep>,
    /// Per-step wall clock limit.
    pub timeout: Option<Duration>,
    pub workers: usize,
}

/// One command of the build, e.g. `pdflatex -interaction=nonstopmode {main}`.
///
/// `{main}` expands to the main file name and `{stem}` to the same name
/// without its extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileStep {
    pub command: Vec<String>,
    /// A failing step with this flag set does not stop the build.
    pub allow_failure: bool,
}

impl CompileStep {
    pub fn new<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into_iter().map(Into::into).collect(),
            allow_failure: false,
        }
    }

    pub fn allowing_failure(mut self) -> Self {
        self.allow_failure = true;
        self
    }
}

#[derive(Clone, Debug)]
pub struct GuardSettings {
    /// Compile attempts per fragment, the first one included.
    pub max_attempts: usize,
}

/// Settings for the text-generation client.
#[derive(Clone, Debug)]
pub struct GenAiSettings {
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub max_retries: u32,
    pub timeout: Duration,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Every prompt and reply is written here when set.
    pub log_dir: Option<PathBuf>,
}

/// Pattern plus compiled matcher helper.
#[derive(Clone, Debug)]
pub struct Pattern {
    original: String,
    glob: Glob,
}

impl Pattern {
    fn new(source: ConfigSource, value: String) -> Result<Self, ConfigValidationError> {
        match Glob::new(&value) {
            Ok(glob) => Ok(Pattern {
                original: value,
                glob,
            }),
            Err(err) => Err(ConfigValidationError::new(
                Some(source),
                format!("invalid glob pattern '{value}': {err}"),
            )),
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn glob(&self) -> &Glob {
        &self.glob
    }
}

/// Ordered list of glob patterns.
#[derive(Clone, Debug, Default)]
pub struct PatternList {
    patterns: Vec<Pattern>,
}

impl PatternList {
    fn new(patterns: Vec<Pattern>) -> Self {
        PatternList { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// Specific layer of configuration (default/git/local/override).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
    pub base_dir: PathBuf,
}

impl ConfigSource {
    fn default(base_dir: PathBuf) -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
            base_dir,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        ConfigSource {
            kind,
            path: Some(path),
            base_dir,
        }
    }

    fn describe(&self) -> String {
        match (&self.kind, &self.path) {
            (ConfigSourceKind::Default, _) => "built-in defaults".to_owned(),
            (kind, Some(path)) => format!("{} at {}", kind, path.display()),
            (kind, None) => kind.to_string(),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    GitRoot,
    Local,
    Override,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::GitRoot => "git-root config",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve working directory {attempted}: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override config {path} not found")]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("configuration validation failed:\n{0}")]
    Validation(ConfigValidationErrors),
}

impl Config {
    /// Loads configuration using the precedence rules and returns typed settings.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = resolve_working_dir(options.working_dir)?;
        let override_path = options
            .override_path
            .map(|path| make_absolute(&path, &working_dir));

        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let default_source = ConfigSource::default(working_dir.clone());
        let mut merged = PartialConfig::default();
        merged.merge(defaults_layer(default_source.clone()));

        let mut source_layers = vec![default_source];

        let git_root = find_git_root(&working_dir);
        let git_config_path = git_root.as_ref().map(|root| root.join(CONFIG_FILE_NAME));
        let local_config_path = working_dir.join(CONFIG_FILE_NAME);

        if let Some(path) = git_config_path.as_ref() {
            if path.exists() && Some(path) != override_path.as_ref() && path != &local_config_path {
                let source = ConfigSource::for_file(ConfigSourceKind::GitRoot, path.clone());
                merged.merge(load_layer(path, source.clone())?);
                source_layers.push(source);
            }
        }

        if local_config_path.exists() && Some(&local_config_path) != override_path.as_ref() {
            let source = ConfigSource::for_file(ConfigSourceKind::Local, local_config_path.clone());
            merged.merge(load_layer(&local_config_path, source.clone())?);
            source_layers.push(source);
        }

        if let Some(path) = override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, source.clone())?);
            source_layers.push(source);
        }

        let config = merged.finalize().map_err(ConfigError::Validation)?;
        Ok(Config {
            project: config.project,
            compile: config.compile,
            guard: config.guard,
            genai: config.genai,
            sources: ConfigSources {
                working_directory: working_dir,
                layers: source_layers,
            },
        })
    }

    /// Parse a single TOML document on top of the built-in defaults, with
    /// relative paths resolved against `base_dir`.
    pub fn from_toml_str(contents: &str, base_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let base_dir = base_dir.into();
        let default_source = ConfigSource::default(base_dir.clone());
        let source = ConfigSource {
            kind: ConfigSourceKind::Override,
            path: None,
            base_dir: base_dir.clone(),
        };

        let mut merged = PartialConfig::default();
        merged.merge(defaults_layer(default_source.clone()));
        let layer = parse_layer(contents, source.clone()).map_err(|source| ConfigError::Parse {
            path: base_dir.join(CONFIG_FILE_NAME),
            source,
        })?;
        merged.merge(layer);

        let config = merged.finalize().map_err(ConfigError::Validation)?;
        Ok(Config {
            project: config.project,
            compile: config.compile,
            guard: config.guard,
            genai: config.genai,
            sources: ConfigSources {
                working_directory: base_dir,
                layers: vec![default_source, source],
            },
        })
    }
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::WorkingDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn load_layer(path: &Path, source: ConfigSource) -> Result<PartialConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.into(),
        source,
    })?;
    parse_layer(&contents, source).map_err(|source| ConfigError::Parse {
        path: path.into(),
        source,
    })
}

fn parse_layer(contents: &str, source: ConfigSource) -> Result<PartialConfig, toml::de::Error> {
    let raw: RawConfig = toml::from_str(contents)?;
    Ok(raw.into_partial(source))
}

fn default_steps() -> Vec<CompileStep> {
    vec![
        CompileStep::new(["pdflatex", "-interaction=nonstopmode", "{main}"]),
        CompileStep::new(["bibtex", "{stem}"]).allowing_failure(),
        CompileStep::new(["pdflatex", "-interaction=nonstopmode", "{main}"]),
        CompileStep::new(["pdflatex", "-interaction=nonstopmode", "{main}"]),
    ]
}

fn defaults_layer(source: ConfigSource) -> PartialConfig {
    PartialConfig {
        project: Some(ProjectPartial {
            root: Some(Located::new(PathBuf::from("."), source.clone())),
            main_file: None,
            exclude: Some(Located::new(
                vec!["**/*.pdf".into(), "**/.git/**".into()],
                source.clone(),
            )),
        }),
        compile: Some(CompilePartial {
            steps: Some(Located::new(default_steps(), source.clone())),
            timeout_secs: Some(Located::new(DEFAULT_TIMEOUT_SECS, source.clone())),
            workers: Some(Located::new(DEFAULT_WORKERS, source.clone())),
        }),
        guard: Some(GuardPartial {
            max_attempts: Some(Located::new(DEFAULT_MAX_ATTEMPTS, source.clone())),
        }),
        genai: Some(GenAiPartial {
            endpoint: Some(Located::new(DEFAULT_ENDPOINT.into(), source.clone())),
            model: Some(Located::new(DEFAULT_MODEL.into(), source.clone())),
            max_tokens: Some(Located::new(DEFAULT_MAX_TOKENS, source.clone())),
            max_retries: Some(Located::new(DEFAULT_MAX_RETRIES, source.clone())),
            timeout_secs: Some(Located::new(DEFAULT_GENAI_TIMEOUT_SECS, source.clone())),
            api_key_env: Some(Located::new(DEFAULT_API_KEY_ENV.into(), source.clone())),
            log_dir: None,
        }),
    }
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

#[derive(Clone, Debug, Default)]
struct PartialConfig {
    project: Option<ProjectPartial>,
    compile: Option<CompilePartial>,
    guard: Option<GuardPartial>,
    genai: Option<GenAiPartial>,
}

fn merge_section<T>(target: &mut Option<T>, other: Option<T>, merge: impl FnOnce(&mut T, T)) {
    if let Some(other) = other {
        match target {
            Some(existing) => merge(existing, other),
            None => *target = Some(other),
        }
    }
}

impl PartialConfig {
    fn merge(&mut self, other: PartialConfig) {
        merge_section(&mut self.project, other.project, ProjectPartial::merge);
        merge_section(&mut self.compile, other.compile, CompilePartial::merge);
        merge_section(&mut self.guard, other.guard, GuardPartial::merge);
        merge_section(&mut self.genai, other.genai, GenAiPartial::merge);
    }

    fn finalize(self) -> Result<ResolvedConfig, ConfigValidationErrors> {
        let mut errors = Vec::new();
        let fallback = || ConfigSource::default(PathBuf::from("."));

        let project_partial = self.project.unwrap_or_default();
        let project_root_loc = project_partial
            .root
            .unwrap_or_else(|| Located::new(PathBuf::from("."), fallback()));
        let project_root = resolve_path(&project_root_loc);
        let exclude_patterns = compile_patterns(
            project_partial.exclude.unwrap_or_default(),
            "project.exclude",
            &mut errors,
        );

        let main_file = project_partial.main_file.map(|located| {
            if located.value.as_os_str().is_empty() || located.value.is_absolute() {
                errors.push(
                    ConfigValidationError::new(
                        Some(located.source.clone()),
                        format!(
                            "main_file must be a relative path (received '{}')",
                            located.value.display()
                        ),
                    )
                    .with_context("project.main_file"),
                );
            }
            located.value
        });

        let compile_partial = self.compile.unwrap_or_default();
        let steps = compile_partial
            .steps
            .unwrap_or_else(|| Located::new(default_steps(), fallback()));
        validate_steps(&steps, &mut errors);

        let timeout = compile_partial
            .timeout_secs
            .map(|located| positive_secs(located, "compile.timeout_secs", &mut errors));

        let workers = compile_partial
            .workers
            .unwrap_or_else(|| Located::new(DEFAULT_WORKERS, fallback()));
        if workers.value == 0 {
            errors.push(
                ConfigValidationError::new(
                    Some(workers.source.clone()),
                    "workers must be at least 1".into(),
                )
                .with_context("compile.workers"),
            );
        }

        let guard_partial = self.guard.unwrap_or_default();
        let max_attempts = guard_partial
            .max_attempts
            .unwrap_or_else(|| Located::new(DEFAULT_MAX_ATTEMPTS, fallback()));
        if max_attempts.value == 0 {
            errors.push(
                ConfigValidationError::new(
                    Some(max_attempts.source.clone()),
                    "max_attempts must be at least 1".into(),
                )
                .with_context("guard.max_attempts"),
            );
        }

        let genai = finalize_genai(self.genai.unwrap_or_default(), &mut errors);

        if !errors.is_empty() {
            return Err(ConfigValidationErrors(errors));
        }

        Ok(ResolvedConfig {
            project: ProjectSettings {
                root: project_root,
                main_file,
                exclude: PatternList::new(exclude_patterns),
            },
            compile: CompileSettings {
                steps: steps.value,
                timeout,
                workers: workers.value,
            },
            guard: GuardSettings {
                max_attempts: max_attempts.value,
            },
            genai,
        })
    }
}

fn validate_steps(steps: &Located<Vec<CompileStep>>, errors: &mut Vec<ConfigValidationError>) {
    if steps.value.is_empty() {
        errors.push(
            ConfigValidationError::new(
                Some(steps.source.clone()),
                "at least one compile step is required".into(),
            )
            .with_context("compile.steps"),
        );
    }

    for (idx, step) in steps.value.iter().enumerate() {
        let program_missing = step
            .command
            .first()
            .map_or(true, |program| program.trim().is_empty());
        if program_missing {
            errors.push(
                ConfigValidationError::new(
                    Some(steps.source.clone()),
                    format!("step {} has an empty command", idx + 1),
                )
                .with_context("compile.steps"),
            );
        }
    }
}

fn positive_secs(
    located: Located<u64>,
    context: &str,
    errors: &mut Vec<ConfigValidationError>,
) -> Duration {
    if located.value == 0 {
        errors.push(
            ConfigValidationError::new(
                Some(located.source.clone()),
                "timeout must be greater than 0".into(),
            )
            .with_context(context),
        );
    }
    Duration::from_secs(located.value)
}

fn finalize_genai(partial: GenAiPartial, errors: &mut Vec<ConfigValidationError>) -> GenAiSettings {
    let fallback = || ConfigSource::default(PathBuf::from("."));

    let endpoint = partial
        .endpoint
        .unwrap_or_else(|| Located::new(DEFAULT_ENDPOINT.into(), fallback()));
    if !(endpoint.value.starts_with("http://") || endpoint.value.starts_with("https://")) {
        errors.push(
            ConfigValidationError::new(
                Some(endpoint.source.clone()),
                format!("endpoint must be an http(s) URL (received '{}')", endpoint.value),
            )
            .with_context("genai.endpoint"),
        );
    }

    let model = partial
        .model
        .unwrap_or_else(|| Located::new(DEFAULT_MODEL.into(), fallback()));
    if model.value.trim().is_empty() {
        errors.push(
            ConfigValidationError::new(Some(model.source.clone()), "model cannot be empty".into())
                .with_context("genai.model"),
        );
    }

    let max_tokens = partial
        .max_tokens
        .unwrap_or_else(|| Located::new(DEFAULT_MAX_TOKENS, fallback()));
    if max_tokens.value == 0 {
        errors.push(
            ConfigValidationError::new(
                Some(max_tokens.source.clone()),
                "max_tokens must be at least 1".into(),
            )
            .with_context("genai.max_tokens"),
        );
    }

    let timeout = positive_secs(
        partial
            .timeout_secs
            .unwrap_or_else(|| Located::new(DEFAULT_GENAI_TIMEOUT_SECS, fallback())),
        "genai.timeout_secs",
        errors,
    );

    let api_key_env = partial
        .api_key_env
        .unwrap_or_else(|| Located::new(DEFAULT_API_KEY_ENV.into(), fallback()));
    if api_key_env.value.trim().is_empty() {
        errors.push(
            ConfigValidationError::new(
                Some(api_key_env.source.clone()),
                "api_key_env cannot be empty".into(),
            )
            .with_context("genai.api_key_env"),
        );
    }

    GenAiSettings {
        endpoint: endpoint.value,
        model: model.value,
        max_tokens: max_tokens.value,
        max_retries: partial
            .max_retries
            .map_or(DEFAULT_MAX_RETRIES, |located| located.value),
        timeout,
        api_key_env: api_key_env.value,
        log_dir: partial.log_dir.as_ref().map(resolve_path),
    }
}

#[derive(Clone, Debug, Default)]
struct ProjectPartial {
    root: Option<Located<PathBuf>>,
    main_file: Option<Located<PathBuf>>,
    exclude: Option<Located<Vec<String>>>,
}

impl ProjectPartial {
    fn merge(&mut self, other: ProjectPartial) {
        if other.root.is_some() {
            self.root = other.root;
        }
        if other.main_file.is_some() {
            self.main_file = other.main_file;
        }
        if other.exclude.is_some() {
            self.exclude = other.exclude;
        }
    }
}

#[derive(Clone, Debug, Default)]
struct CompilePartial {
    steps: Option<Located<Vec<CompileStep>>>,
    timeout_secs: Option<Located<u64>>,
    workers: Option<Located<usize>>,
}

impl CompilePartial {
    fn merge(&mut self, other: CompilePartial) {
        if other.steps.is_some() {
            self.steps = other.steps;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.workers.is_some() {
            self.workers = other.workers;
        }
    }
}

#[derive(Clone, Debug, Default)]
struct GuardPartial {
    max_attempts: Option<Located<usize>>,
}

impl GuardPartial {
    fn merge(&mut self, other: GuardPartial) {
        if other.max_attempts.is_some() {
            self.max_attempts = other.max_attempts;
        }
    }
}

#[derive(Clone, Debug, Default)]
struct GenAiPartial {
    endpoint: Option<Located<String>>,
    model: Option<Located<String>>,
    max_tokens: Option<Located<u32>>,
    max_retries: Option<Located<u32>>,
    timeout_secs: Option<Located<u64>>,
    api_key_env: Option<Located<String>>,
    log_dir: Option<Located<PathBuf>>,
}

impl GenAiPartial {
    fn merge(&mut self, other: GenAiPartial) {
        if other.endpoint.is_some() {
            self.endpoint = other.endpoint;
        }
        if other.model.is_some() {
            self.model = other.model;
        }
        if other.max_tokens.is_some() {
            self.max_tokens = other.max_tokens;
        }
        if other.max_retries.is_some() {
            self.max_retries = other.max_retries;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.api_key_env.is_some() {
            self.api_key_env = other.api_key_env;
        }
        if other.log_dir.is_some() {
            self.log_dir = other.log_dir;
        }
    }
}

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: ConfigSource,
}

impl<T> Located<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Located { value, source }
    }
}

impl Default for Located<Vec<String>> {
    fn default() -> Self {
        Located::new(Vec::new(), ConfigSource::default(PathBuf::from(".")))
    }
}

fn resolve_path(located: &Located<PathBuf>) -> PathBuf {
    let path = &located.value;
    if path.is_absolute() {
        path.clone()
    } else {
        located.source.base_dir.join(path)
    }
}

fn compile_patterns(
    located: Located<Vec<String>>,
    context: &str,
    errors: &mut Vec<ConfigValidationError>,
) -> Vec<Pattern> {
    let mut patterns = Vec::new();
    for pattern in located.value {
        match Pattern::new(located.source.clone(), pattern) {
            Ok(compiled) => patterns.push(compiled),
            Err(err) => errors.push(err.with_context(context)),
        }
    }
    patterns
}

#[derive(Clone, Debug)]
struct ResolvedConfig {
    project: ProjectSettings,
    compile: CompileSettings,
    guard: GuardSettings,
    genai: GenAiSettings,
}

/// Container for validation failures, formatted as a bullet list.
#[derive(Debug)]
pub struct ConfigValidationErrors(pub Vec<ConfigValidationError>);

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "- {err}")?;
        }
        Ok(())
    }
}

impl ConfigValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValidationError> {
        self.0.iter()
    }
}

/// Validation failure with optional provenance.
#[derive(Clone, Debug)]
pub struct ConfigValidationError {
    pub source: Option<ConfigSource>,
    pub message: String,
    pub context: Option<String>,
}

impl ConfigValidationError {
    fn new(source: Option<ConfigSource>, message: String) -> Self {
        ConfigValidationError {
            source,
            message,
            context: None,
        }
    }

    fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(f, "{}: {}", context, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(source) = &self.source {
            write!(f, " ({})", source.describe())?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    project: Option<RawProject>,
    #[serde(default)]
    compile: Option<RawCompile>,
    #[serde(default)]
    guard: Option<RawGuard>,
    #[serde(default)]
    genai: Option<RawGenAi>,
}

impl RawConfig {
    fn into_partial(self, source: ConfigSource) -> PartialConfig {
        PartialConfig {
            project: self
                .project
                .map(|project| project.into_partial(source.clone())),
            compile: self
                .compile
                .map(|compile| compile.into_partial(source.clone())),
            guard: self.guard.map(|guard| GuardPartial {
                max_attempts: guard
                    .max_attempts
                    .map(|value| Located::new(value, source.clone())),
            }),
            genai: self.genai.map(|genai| genai.into_partial(source)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawProject {
    #[serde(default)]
    root: Option<PathBuf>,
    #[serde(default)]
    main_file: Option<PathBuf>,
    #[serde(default)]
    exclude: Option<Vec<String>>,
}

impl RawProject {
    fn into_partial(self, source: ConfigSource) -> ProjectPartial {
        ProjectPartial {
            root: self.root.map(|value| Located::new(value, source.clone())),
            main_file: self
                .main_file
                .map(|value| Located::new(value, source.clone())),
            exclude: self.exclude.map(|value| Located::new(value, source)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawCompile {
    #[serde(default)]
    steps: Option<Vec<RawCompileStep>>,
    #[serde(default)]
    timeout_secs: Option<u64>,
    #[serde(default)]
    workers: Option<usize>,
}

impl RawCompile {
    fn into_partial(self, source: ConfigSource) -> CompilePartial {
        let steps = self.steps.map(|steps| {
            steps
                .into_iter()
                .map(|step| CompileStep {
                    command: step.command,
                    allow_failure: step.allow_failure,
                })
                .collect()
        });

        CompilePartial {
            steps: steps.map(|value| Located::new(value, source.clone())),
            timeout_secs: self
                .timeout_secs
                .map(|value| Located::new(value, source.clone())),
            workers: self.workers.map(|value| Located::new(value, source)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawCompileStep {
    command: Vec<String>,
    #[serde(default)]
    allow_failure: bool,
}

#[derive(Debug, Deserialize)]
struct RawGuard {
    #[serde(default)]
    max_attempts: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawGenAi {
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    max_tokens: Option<u32>,
    #[serde(default)]
    max_retries: Option<u32>,
    #[serde(default)]
    timeout_secs: Option<u64>,
    #[serde(default)]
    api_key_env: Option<String>,
    #[serde(default)]
    log_dir: Option<PathBuf>,
}

impl RawGenAi {
    fn into_partial(self, source: ConfigSource) -> GenAiPartial {
        GenAiPartial {
            endpoint: self.endpoint.map(|value| Located::new(value, source.clone())),
            model: self.model.map(|value| Located::new(value, source.clone())),
            max_tokens: self.max_tokens.map(|value| Located::new(value, source.clone())),
            max_retries: self.max_retries.map(|value| Located::new(value, source.clone())),
            timeout_secs: self
                .timeout_secs
                .map(|value| Located::new(value, source.clone())),
            api_key_env: self
                .api_key_env
                .map(|value| Located::new(value, source.clone())),
            log_dir: self.log_dir.map(|value| Located::new(value, source)),
        }
    }
}
