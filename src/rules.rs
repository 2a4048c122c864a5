//! Extension-based category rules.
//!
//! A [`RuleSet`] is an ordered list of [`Rule`]s, each mapping a category name
//! (which doubles as the destination directory name) to a set of extension
//! tokens. Lookups go through an index built once at construction time, and
//! when the same extension is registered under several categories the first
//! registration wins.
//!
//! # Examples
//!
//! ```
//! use downsort::rules::RuleSet;
//!
//! let rules = RuleSet::default();
//! assert_eq!(rules.classify(".pdf"), Some("Documents"));
//! assert_eq!(rules.classify(".PNG"), Some("Images"));
//! assert_eq!(rules.classify(".xyz"), None);
//! ```
use crate::error::ConfigError;
use std::collections::HashMap;
use std::path::{Component, Path};

/// Built-in category table used when no configuration document provides one.
const DEFAULT_DESTINATIONS: &[(&str, &[&str])] = &[
    (
        "Documents",
        &[".pdf", ".doc", ".docx", ".txt", ".xlsx", ".csv"],
    ),
    ("Images", &[".jpg", ".jpeg", ".png", ".gif", ".webp"]),
    ("Archives", &[".zip", ".rar", ".7z", ".tar", ".gz"]),
    ("Music", &[".mp3", ".wav", ".aac"]),
    ("Videos", &[".mp4", ".mkv", ".mov", ".avi"]),
    ("Installers", &[".exe", ".msi", ".apk", ".deb"]),
    ("Scripts", &[".py", ".js", ".sh", ".ps1"]),
    ("ISOs", &[".iso", ".img"]),
    ("MailAttachments", &[".eml", ".msg"]),
];

/// A single category and the extension tokens that route files into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Category name, also used as the destination directory name.
    pub category: String,
    /// Lower-cased extension tokens, each starting with `.`.
    pub matchers: Vec<String>,
}

impl Rule {
    /// Creates a rule from a category name and raw extension tokens.
    ///
    /// Tokens are not validated here; see [`RuleSet::from_rules`].
    pub fn new<S: Into<String>>(category: S, matchers: &[&str]) -> Self {
        Self {
            category: category.into(),
            matchers: matchers.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// Ordered, immutable set of classification rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
    index: HashMap<String, usize>,
}

impl RuleSet {
    /// Builds a rule set, normalizing and validating every rule.
    ///
    /// Extension tokens are lower-cased and given a leading dot if they lack
    /// one. Category names must be a single plain path component so that a
    /// destination can never escape the source directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCategory`] or
    /// [`ConfigError::InvalidExtension`] for rules that cannot be used.
    pub fn from_rules(rules: Vec<Rule>) -> Result<Self, ConfigError> {
        let mut normalized = Vec::with_capacity(rules.len());
        let mut index = HashMap::new();

        for rule in rules {
            validate_category(&rule.category)?;

            let mut matchers: Vec<String> = Vec::with_capacity(rule.matchers.len());
            for token in &rule.matchers {
                let token = normalize_extension(&rule.category, token)?;
                if !matchers.contains(&token) {
                    matchers.push(token);
                }
            }

            let position = normalized.len();
            for token in &matchers {
                // First registration wins.
                index.entry(token.clone()).or_insert(position);
            }

            normalized.push(Rule {
                category: rule.category,
                matchers,
            });
        }

        Ok(Self {
            rules: normalized,
            index,
        })
    }

    /// Returns the category registered first for `extension`, if any.
    ///
    /// The lookup is case-insensitive; `extension` should include the leading
    /// dot, as produced by [`crate::classifier::FileEntry`].
    pub fn classify(&self, extension: &str) -> Option<&str> {
        if extension.is_empty() {
            return None;
        }
        self.index
            .get(&extension.to_lowercase())
            .map(|&i| self.rules[i].category.as_str())
    }

    /// The rules in registration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Category names in registration order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.category.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        let mut rules = Vec::with_capacity(DEFAULT_DESTINATIONS.len());
        let mut index = HashMap::new();
        for (position, (category, extensions)) in DEFAULT_DESTINATIONS.iter().enumerate() {
            for ext in extensions.iter() {
                index.entry(ext.to_string()).or_insert(position);
            }
            rules.push(Rule::new(*category, extensions));
        }
        Self { rules, index }
    }
}

fn validate_category(name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::InvalidCategory {
            name: name.to_string(),
            reason: "category name is empty",
        });
    }
    if name.contains('/') || name.contains('\\') {
        return Err(ConfigError::InvalidCategory {
            name: name.to_string(),
            reason: "category name must not contain path separators",
        });
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(ConfigError::InvalidCategory {
            name: name.to_string(),
            reason: "category name must be a plain directory name",
        }),
    }
}

fn normalize_extension(category: &str, token: &str) -> Result<String, ConfigError> {
    let trimmed = token.trim().to_lowercase();
    let bare = trimmed.strip_prefix('.').unwrap_or(&trimmed);
    if bare.is_empty() || bare.contains('/') || bare.contains('\\') {
        return Err(ConfigError::InvalidExtension {
            category: category.to_string(),
            token: token.to_string(),
        });
    }
    Ok(format!(".{}", bare))
}
