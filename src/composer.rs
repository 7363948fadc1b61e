/// Composer PSR-4 lookup.
///
/// The source index uses this to find the file declaring a class it has
/// not seen yet.  Mappings come from the `autoload` and `autoload-dev`
/// sections of `composer.json`:
///
/// ```text
/// "psr-4": { "App\\": "src/", "App\\Tests\\": ["tests/", "spec/"] }
/// ```
///
/// `App\Model\User` then resolves to `<root>/src/Model/User.php`.
use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;

/// One namespace prefix bound to one base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Psr4Mapping {
    /// Namespace prefix ending in `\`, or empty for the fallback entry.
    pub prefix: String,
    /// Directory relative to the project root, ending in `/` unless empty.
    pub base_path: String,
}

/// The PSR-4 table of one project, longest prefix first.
#[derive(Debug, Clone, Default)]
pub struct Psr4Map {
    root: PathBuf,
    mappings: Vec<Psr4Mapping>,
}

impl Psr4Map {
    /// Read `<root>/composer.json`.
    ///
    /// A missing or unreadable manifest yields an empty map, since a
    /// project without composer simply has nothing to autoload.
    pub fn load(root: &Path) -> Self {
        let manifest = root.join("composer.json");
        let mappings = match std::fs::read_to_string(&manifest) {
            Ok(content) => match serde_json::from_str::<JsonValue>(&content) {
                Ok(json) => mappings_from_manifest(&json),
                Err(e) => {
                    tracing::warn!("ignoring malformed {}: {}", manifest.display(), e);
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };

        Psr4Map {
            root: root.to_path_buf(),
            mappings,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mappings(&self) -> &[Psr4Mapping] {
        &self.mappings
    }

    /// The first existing file that would declare `class_name`.
    pub fn resolve(&self, class_name: &str) -> Option<PathBuf> {
        let name = class_name.trim_start_matches('\\');

        self.mappings.iter().find_map(|mapping| {
            let relative = if mapping.prefix.is_empty() {
                name
            } else {
                strip_prefix_ignore_case(name, &mapping.prefix)?
            };
            let candidate = self
                .root
                .join(&mapping.base_path)
                .join(format!("{}.php", relative.replace('\\', "/")));
            candidate.is_file().then_some(candidate)
        })
    }
}

fn strip_prefix_ignore_case<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let head = name.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &name[prefix.len()..])
}

fn mappings_from_manifest(json: &JsonValue) -> Vec<Psr4Mapping> {
    let mut mappings = Vec::new();

    for section in ["autoload", "autoload-dev"] {
        let Some(psr4) = json
            .get(section)
            .and_then(|s| s.get("psr-4"))
            .and_then(JsonValue::as_object)
        else {
            continue;
        };

        for (prefix, dirs) in psr4 {
            let prefix = normalise_prefix(prefix);
            let dirs: Vec<&str> = match dirs {
                JsonValue::String(dir) => vec![dir.as_str()],
                JsonValue::Array(list) => list.iter().filter_map(JsonValue::as_str).collect(),
                _ => Vec::new(),
            };
            mappings.extend(dirs.into_iter().map(|dir| Psr4Mapping {
                prefix: prefix.clone(),
                base_path: normalise_dir(dir),
            }));
        }
    }

    // Stable sort keeps manifest order among equal-length prefixes.
    mappings.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
    mappings
}

fn normalise_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('\\') {
        prefix.to_string()
    } else {
        format!("{}\\", prefix)
    }
}

fn normalise_dir(dir: &str) -> String {
    let dir = dir.replace('\\', "/");
    if dir.is_empty() || dir.ends_with('/') {
        dir
    } else {
        format!("{}/", dir)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
