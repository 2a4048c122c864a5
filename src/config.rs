//! Rule and filter configuration.
//!
//! The configuration document maps category names to extension lists and can
//! optionally carry filtering rules for entries that should never be moved.
//! Both JSON and TOML are accepted; the format is picked from the file
//! extension. Category order in the document is preserved and decides which
//! category wins when an extension is listed twice.
//!
//! # Configuration File Format
//!
//! ```toml
//! [destinations]
//! Documents = [".pdf", ".docx", ".txt"]
//! Images = [".jpg", ".png"]
//!
//! [filters]
//! exclude_hidden = false
//!
//! [filters.exclude]
//! filenames = ["desktop.ini"]
//! patterns = ["*.crdownload", "*.part"]
//! extensions = ["tmp"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```
//!
//! The JSON form uses the same keys:
//! `{"destinations": {"Documents": [".pdf"]}, "filters": {...}}`.
//! When `destinations` is missing, the built-in table is used.

use crate::error::ConfigError;
use crate::rules::{Rule, RuleSet};
use glob::Pattern;
use regex::Regex;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// File names looked up inside the source directory, in order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["organizer_config.json", "organizer_config.toml"];

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrganizerConfig {
    /// Category → extensions, in document order.
    #[serde(default)]
    pub destinations: Option<Destinations>,

    /// Rules for leaving entries where they are.
    #[serde(default)]
    pub filters: FilterRules,
}

/// Ordered category table as written in the configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Destinations(pub Vec<(String, Vec<String>)>);

impl<'de> Deserialize<'de> for Destinations {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = Destinations;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of category names to extension lists")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((category, extensions)) =
                    map.next_entry::<String, Vec<String>>()?
                {
                    entries.push((category, extensions));
                }
                Ok(Destinations(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

/// Filtering rules applied before classification.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterRules {
    /// Leave hidden files (names starting with ".") in place. Defaults to false.
    #[serde(default)]
    pub exclude_hidden: bool,

    /// Rules for excluding files.
    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Rules for including files (whitelist, overrides exclude rules).
    #[serde(default)]
    pub include: IncludeRules,
}

/// Rules for excluding files from organization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExcludeRules {
    /// Exact file names to exclude (e.g., "desktop.ini", "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the file name (e.g., "*.part").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Extensions to exclude, with or without the leading dot.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Rules for including files, overriding exclude rules.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncludeRules {
    /// Glob patterns that override exclude rules and the hidden-file filter.
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// Everything a run needs from configuration, validated and compiled.
#[derive(Debug)]
pub struct LoadedConfig {
    pub rules: RuleSet,
    pub filter: EntryFilter,
    /// The document the configuration came from, if any.
    pub config_file: Option<PathBuf>,
}

impl OrganizerConfig {
    /// Locates, parses and compiles the configuration for `source_dir`.
    ///
    /// Lookup order:
    /// 1. `explicit`, if provided (a missing file is an error)
    /// 2. `organizer_config.json` in `source_dir`
    /// 3. `organizer_config.toml` in `source_dir`
    /// 4. built-in defaults
    ///
    /// A configuration document that lives inside `source_dir` is added to
    /// the exclusion list so it never gets filed away.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`]; callers should abort before touching files.
    pub fn load_for(source_dir: &Path, explicit: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
        let config_file = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Some(path.to_path_buf())
            }
            None => CONFIG_FILE_NAMES
                .iter()
                .map(|name| source_dir.join(name))
                .find(|candidate| candidate.is_file()),
        };

        let config = match &config_file {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };

        let rules = config.rule_set()?;
        let mut filter = config.filters.compile()?;

        if let Some(path) = &config_file
            && lives_in(path, source_dir)
            && let Some(name) = path.file_name()
        {
            filter.exclude_name(name.to_string_lossy().to_string());
        }

        Ok(LoadedConfig {
            rules,
            filter,
            config_file,
        })
    }

    /// Parses a configuration document, choosing JSON or TOML by extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, or
    /// `InvalidJson`/`InvalidToml` if it cannot be parsed.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&content).map_err(|source| ConfigError::InvalidJson {
                path: path.to_path_buf(),
                source,
            })
        } else {
            Self::from_toml_str(&content).map_err(|source| ConfigError::InvalidToml {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Builds the rule set, falling back to the built-in table when the
    /// document has no `destinations` section.
    pub fn rule_set(&self) -> Result<RuleSet, ConfigError> {
        match &self.destinations {
            Some(Destinations(entries)) => RuleSet::from_rules(
                entries
                    .iter()
                    .map(|(category, extensions)| Rule {
                        category: category.clone(),
                        matchers: extensions.clone(),
                    })
                    .collect(),
            ),
            None => Ok(RuleSet::default()),
        }
    }
}

fn lives_in(path: &Path, dir: &Path) -> bool {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    match (fs::canonicalize(&parent), fs::canonicalize(dir)) {
        (Ok(a), Ok(b)) => a == b,
        _ => parent == dir,
    }
}

impl FilterRules {
    /// Compile rules into an [`EntryFilter`].
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile(&self) -> Result<EntryFilter, ConfigError> {
        EntryFilter::new(self)
    }
}

/// Compiled filter applied to each candidate file before classification.
///
/// The default filter lets every file through.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    exclude_hidden: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl EntryFilter {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = compile_globs(&rules.exclude.patterns)?;
        let include_patterns = compile_globs(&rules.include.patterns)?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            exclude_hidden: rules.exclude_hidden,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
            include_patterns,
        })
    }

    /// Adds an exact file name to the exclusion list.
    pub fn exclude_name(&mut self, name: impl Into<String>) {
        self.exclude_filenames.insert(name.into());
    }

    /// Check if a file should be considered for organization.
    ///
    /// Checks are performed in this order, with early termination:
    /// 1. Include patterns (whitelist) - if matched, always include
    /// 2. Hidden file filter - if hidden and excluded by config, exclude
    /// 3. Exact filename match - if matched, exclude
    /// 4. File extension match - if matched, exclude
    /// 5. Glob pattern match - if matched, exclude
    /// 6. Regex pattern match - if matched, exclude
    /// 7. Default: include
    pub fn should_include(&self, file_name: &str) -> bool {
        if self.include_patterns.iter().any(|p| p.matches(file_name)) {
            return true;
        }

        if self.exclude_hidden && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name) {
            return false;
        }

        if let Some(ext) = Path::new(file_name).extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self.exclude_patterns.iter().any(|p| p.matches(file_name)) {
            return false;
        }

        !self.exclude_regexes.iter().any(|r| r.is_match(file_name))
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}
