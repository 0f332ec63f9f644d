//! The text-fetch primitive the build reads posts through. [`Source`] is a
//! trait so that the build doesn't care where raw markdown comes from; the
//! [`Directory`] implementation reads from the blog directory on disk.

use crate::manifest;
use std::io;
use std::path::PathBuf;

/// Fetches the raw markdown text for a manifest entry.
pub trait Source {
    fn fetch(&self, section: &str, file_name: &str) -> io::Result<String>;
}

/// A [`Source`] that reads posts from a blog directory, resolving entries
/// with [`manifest::resolve`].
pub struct Directory {
    root: PathBuf,
}

impl Directory {
    pub fn new<P: Into<PathBuf>>(root: P) -> Directory {
        Directory { root: root.into() }
    }
}

impl Source for Directory {
    fn fetch(&self, section: &str, file_name: &str) -> io::Result<String> {
        std::fs::read_to_string(manifest::resolve(&self.root, section, file_name))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::manifest::ROOT_SECTION;
    use std::fs;

    #[test]
    fn test_fetch() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::create_dir_all(dir.path().join("books"))?;
        fs::write(dir.path().join("books/a.md"), "# A\n")?;
        fs::write(dir.path().join("top.md"), "# Top\n")?;

        let source = Directory::new(dir.path());
        assert_eq!("# A\n", source.fetch("books", "a.md")?);
        assert_eq!("# Top\n", source.fetch(ROOT_SECTION, "top.md")?);
        Ok(())
    }

    #[test]
    fn test_fetch_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = Directory::new(dir.path())
            .fetch("books", "missing.md")
            .unwrap_err();
        assert_eq!(io::ErrorKind::NotFound, err.kind());
    }
}
