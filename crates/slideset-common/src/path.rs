use std::path::{Path, PathBuf};

/// Resolves file references stored in cells against a table's working
/// directory.
///
/// Cells do not point back at their table; adapters that touch the
/// filesystem receive one of these alongside the cell instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathContext {
    working_dir: Option<PathBuf>,
}

impl PathContext {
    pub fn new(working_dir: Option<PathBuf>) -> Self {
        Self { working_dir }
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    /// Absolute paths are returned unchanged; relative ones are joined to the
    /// working directory when one is set.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        match &self.working_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_join_working_dir() {
        let ctx = PathContext::new(Some(PathBuf::from("/data/run1")));
        assert_eq!(
            ctx.resolve("images/a.tif"),
            PathBuf::from("/data/run1/images/a.tif")
        );
    }

    #[test]
    fn absolute_paths_are_untouched() {
        let ctx = PathContext::new(Some(PathBuf::from("/data/run1")));
        let abs = std::env::temp_dir().join("x.txt");
        assert_eq!(ctx.resolve(&abs), abs);
    }

    #[test]
    fn no_working_dir_leaves_relative_paths() {
        let ctx = PathContext::default();
        assert_eq!(ctx.resolve("a/b"), PathBuf::from("a/b"));
    }
}
