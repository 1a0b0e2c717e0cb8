use crate::paths::is_retained;
use crate::{IndexerError, Result};
use ccg_graph::{CallGraph, GraphAssembler, ParserRegistry};
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Options for the repository walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Honour `.gitignore` and skip hidden files. Off by default: every
    /// regular file is considered.
    pub respect_ignore: bool,
}

/// Counters for one scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Files handed to a parser
    pub files_parsed: usize,

    /// Files that could not be read, decoded or parsed
    pub skipped: usize,

    pub precise_files: usize,
    pub heuristic_files: usize,
}

#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub graph: CallGraph,
    pub stats: ScanStats,
}

/// Walks a repository and folds every file into one call graph
pub struct SourceScanner {
    root: PathBuf,
    options: ScanOptions,
}

impl SourceScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            options: ScanOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every file except the reserved output names, in file-name order.
    pub fn files(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(IndexerError::NotFound(format!(
                "Scan root not found: {}",
                self.root.display()
            )));
        }

        let mut builder = WalkBuilder::new(&self.root);
        builder
            .standard_filters(self.options.respect_ignore)
            .sort_by_file_name(|a, b| a.cmp(b));
        if self.options.respect_ignore {
            builder.require_git(false);
        }

        let mut files = Vec::new();
        for result in builder.build() {
            match result {
                Ok(entry) => {
                    let Some(file_type) = entry.file_type() else {
                        continue;
                    };
                    if !file_type.is_file() {
                        continue;
                    }

                    let path = entry.path();
                    let reserved = path
                        .file_name()
                        .and_then(|name| name.to_str())
                        .is_some_and(is_retained);
                    if reserved {
                        log::debug!("Skipping reserved output {}", path.display());
                        continue;
                    }

                    files.push(path.to_path_buf());
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }
        Ok(files)
    }

    /// Parse every file and assemble the graph.
    ///
    /// A file that cannot be read, is not UTF-8, or fails to parse is counted
    /// in [`ScanStats::skipped`] and never aborts the scan.
    pub fn scan(&self) -> Result<ScanOutcome> {
        let files = self.files()?;
        let mut registry = ParserRegistry::with_defaults()?;
        let mut assembler = GraphAssembler::new();
        let mut stats = ScanStats::default();

        for path in &files {
            let Some(module) = module_path(&self.root, path) else {
                stats.skipped += 1;
                continue;
            };

            let source = match std::fs::read(path) {
                Ok(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(_) => {
                        log::debug!("Skipping {module}: not valid UTF-8");
                        stats.skipped += 1;
                        continue;
                    }
                },
                Err(e) => {
                    log::debug!("Skipping {module}: {e}");
                    stats.skipped += 1;
                    continue;
                }
            };

            let parser = registry.parser_for(path);
            let precise = parser.is_precise();
            match parser.parse(&module, &source) {
                Ok(parsed) => {
                    assembler.add_file(parsed);
                    stats.files_parsed += 1;
                    if precise {
                        stats.precise_files += 1;
                    } else {
                        stats.heuristic_files += 1;
                    }
                }
                Err(e) => {
                    log::debug!("Skipping {module}: {e}");
                    stats.skipped += 1;
                }
            }
        }

        log::info!(
            "Scanned {} files under {} ({} parsed, {} skipped)",
            files.len(),
            self.root.display(),
            stats.files_parsed,
            stats.skipped
        );

        Ok(ScanOutcome {
            graph: assembler.finish(),
            stats,
        })
    }
}

/// Repository-relative path with `/` separators, used as the node module.
fn module_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn skips_reserved_outputs_at_any_depth() {
        let temp = tempdir().unwrap();
        let nested = temp.path().join("nested");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp.path().join("docs.md"), "def documented(): pass").unwrap();
        fs::write(nested.join("ccg.json"), "{}").unwrap();
        fs::write(temp.path().join("cached_docs.json"), "{}").unwrap();
        fs::write(temp.path().join("main.py"), "def main():\n    pass\n").unwrap();

        let files = SourceScanner::new(temp.path()).files().unwrap();
        assert_eq!(files, vec![temp.path().join("main.py")]);
    }

    #[test]
    fn walks_hidden_and_extensionless_files_by_default() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join(".tools")).unwrap();
        fs::write(temp.path().join(".tools").join("run.py"), "def run():\n    go()\n").unwrap();
        fs::write(temp.path().join("Makefile"), "function build\n").unwrap();
        fs::write(temp.path().join(".gitignore"), ".tools\n").unwrap();

        let outcome = SourceScanner::new(temp.path()).scan().unwrap();
        let ids: Vec<&str> = outcome.graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec![".tools/run.py:run", "Makefile:build"]);
        assert_eq!(outcome.stats.precise_files, 1);
        assert_eq!(outcome.stats.heuristic_files, 2);
    }

    #[test]
    fn respect_ignore_applies_gitignore_rules() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("generated")).unwrap();
        fs::write(temp.path().join("generated").join("gen.py"), "def gen(): pass\n").unwrap();
        fs::write(temp.path().join("app.py"), "def app(): pass\n").unwrap();
        fs::write(temp.path().join(".gitignore"), "generated/\n").unwrap();

        let files = SourceScanner::new(temp.path())
            .with_options(ScanOptions {
                respect_ignore: true,
            })
            .files()
            .unwrap();
        assert_eq!(files, vec![temp.path().join("app.py")]);
    }

    #[test]
    fn missing_root_is_not_found() {
        let temp = tempdir().unwrap();
        let err = SourceScanner::new(temp.path().join("absent"))
            .scan()
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn module_paths_use_forward_slashes() {
        let root = Path::new("/repo");
        assert_eq!(
            module_path(root, &root.join("pkg").join("mod.py")).as_deref(),
            Some("pkg/mod.py")
        );
        assert_eq!(module_path(root, root), None);
    }
}
