use std::path::{Path, PathBuf};

/// Replace the extension of `file_name` with `extension` (given with its dot).
///
/// A name without a dot gets `extension` appended; a name whose only dot is
/// the leading one is replaced by `extension` entirely.
pub fn change_extension(file_name: &str, extension: &str) -> String {
    match file_name.rfind('.') {
        None => format!("{file_name}{extension}"),
        Some(0) => extension.to_string(),
        Some(index) => format!("{}{extension}", &file_name[..index]),
    }
}

/// Where the document compiled from `source` is written.
///
/// The path of `source` below `input_root` is mirrored under `output_root`
/// and the extension becomes `.json`.
pub fn output_path(input_root: &Path, output_root: &Path, source: &Path) -> PathBuf {
    let relative = source.strip_prefix(input_root).unwrap_or(source);
    let file_name = relative
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();

    let mut target = output_root.to_path_buf();
    if let Some(parent) = relative.parent() {
        target.push(parent);
    }
    target.push(change_extension(&file_name, ".json"));
    target
}

/// Output directories registered with the host build.
///
/// Registering a directory that is already listed does nothing.
#[derive(Debug, Clone, Default)]
pub struct ResourceRoots {
    roots: Vec<PathBuf>,
}

impl ResourceRoots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `root`, returning `true` if it was not listed yet.
    pub fn register(&mut self, root: impl Into<PathBuf>) -> bool {
        let root = root.into();
        if self.roots.contains(&root) {
            return false;
        }
        self.roots.push(root);
        true
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_extension() {
        assert_eq!(change_extension("web.stack.rb", ".json"), "web.stack.json");
        assert_eq!(change_extension("Makefile", ".json"), "Makefile.json");
        assert_eq!(change_extension(".rb", ".json"), ".json");
    }

    #[test]
    fn test_output_path_mirrors_tree() {
        let target = output_path(
            Path::new("templates"),
            Path::new("out"),
            Path::new("templates/app/web.stack.rb"),
        );
        assert_eq!(target, PathBuf::from("out/app/web.stack.json"));
    }

    #[test]
    fn test_output_path_top_level() {
        let target = output_path(
            Path::new("templates"),
            Path::new("out"),
            Path::new("templates/db.stack.json"),
        );
        assert_eq!(target, PathBuf::from("out/db.stack.json"));
    }

    #[test]
    fn test_register_once() {
        let mut roots = ResourceRoots::new();
        assert!(roots.register("out"));
        assert!(!roots.register("out"));
        assert_eq!(roots.roots(), &[PathBuf::from("out")]);
    }
}
