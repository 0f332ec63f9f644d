//! Defines the [`Manifest`] type: a precomputed listing of the blog
//! directory that maps each section (a subdirectory of the blog directory) to
//! the sorted names of the markdown files it contains. The build reads posts
//! through the manifest rather than scanning the directory itself, so a
//! manifest can also be generated once and checked in.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf, StripPrefixError};
use tracing::{debug, info};
use walkdir::WalkDir;

/// The section name for markdown files that live directly in the blog
/// directory rather than in a subdirectory.
pub const ROOT_SECTION: &str = "root";

/// The file name the manifest is written to in the output directory.
pub const MANIFEST_FILE_NAME: &str = "blog-manifest.json";

const MARKDOWN_EXTENSION: &str = ".md";

/// Maps section names to the markdown file names in that section. Sections
/// iterate in name order. Serializes as a JSON object of arrays.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(BTreeMap<String, Vec<String>>);

impl Manifest {
    /// Walks `blog_directory` recursively and collects every `.md` file into
    /// its section. A file's section is its parent directory relative to
    /// `blog_directory`, joined with `/` (e.g., `daily/2024`), or
    /// [`ROOT_SECTION`] for files at the top level. File names within each
    /// section are sorted. A subdirectory named [`ROOT_SECTION`] directly
    /// under `blog_directory` is an error, since its posts would be listed
    /// under the same name as the top-level files.
    pub fn generate(blog_directory: &Path) -> Result<Manifest> {
        let mut sections: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for result in WalkDir::new(blog_directory) {
            let entry = result?;
            if !entry.file_type().is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy();
            if !file_name.ends_with(MARKDOWN_EXTENSION) {
                continue;
            }
            let section = section_name(blog_directory, entry.path())?;
            if section == ROOT_SECTION && entry.depth() > 1 {
                return Err(Error::ReservedSection(blog_directory.join(ROOT_SECTION)));
            }
            debug!(%section, file = %file_name, "found post");
            sections
                .entry(section)
                .or_default()
                .push(file_name.into_owned());
        }

        for files in sections.values_mut() {
            files.sort();
        }

        let manifest = Manifest(sections);
        info!(
            directory = %blog_directory.display(),
            sections = manifest.section_count(),
            files = manifest.file_count(),
            "generated manifest"
        );
        Ok(manifest)
    }

    /// Reads a manifest from JSON. The order of the file names in each
    /// section is kept as given.
    pub fn from_reader<R: Read>(r: R) -> Result<Manifest> {
        Ok(serde_json::from_reader(r)?)
    }

    /// Loads a manifest from a JSON file on disk.
    pub fn load(path: &Path) -> Result<Manifest> {
        let file = File::open(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        Manifest::from_reader(file)
    }

    /// Writes the manifest as pretty-printed JSON followed by a newline.
    pub fn write_to<W: Write>(&self, mut w: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut w, self)?;
        w.write_all(b"\n")?;
        Ok(())
    }

    /// Iterates over the sections in name order along with their files.
    pub fn sections(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(section, files)| (section.as_str(), files.as_slice()))
    }

    /// Iterates over every `(section, file_name)` pair in manifest order.
    /// This is the order in which the build reads posts.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sections().flat_map(|(section, files)| {
            files.iter().map(move |file| (section, file.as_str()))
        })
    }

    /// Returns the files listed for `section`, if the section exists.
    pub fn files(&self, section: &str) -> Option<&[String]> {
        self.0.get(section).map(Vec::as_slice)
    }

    pub fn section_count(&self) -> usize {
        self.0.len()
    }

    pub fn file_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

impl From<BTreeMap<String, Vec<String>>> for Manifest {
    fn from(sections: BTreeMap<String, Vec<String>>) -> Manifest {
        Manifest(sections)
    }
}

/// Resolves a manifest entry to its source path: `{blog_directory}/{section}/
/// {file_name}`, except that [`ROOT_SECTION`] resolves to `blog_directory`
/// itself.
pub fn resolve(blog_directory: &Path, section: &str, file_name: &str) -> PathBuf {
    let mut path = blog_directory.to_owned();
    if section != ROOT_SECTION {
        path.extend(section.split('/'));
    }
    path.join(file_name)
}

fn section_name(blog_directory: &Path, file_path: &Path) -> Result<String> {
    let parent = file_path.parent().unwrap_or(file_path);
    let relative = parent.strip_prefix(blog_directory)?;
    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(match segments.is_empty() {
        true => ROOT_SECTION.to_owned(),
        false => segments.join("/"),
    })
}

/// The result of a fallible manifest operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error generating, loading, or writing a [`Manifest`].
#[derive(Debug)]
pub enum Error {
    /// Returned when the manifest file can't be opened.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned for errors walking the blog directory.
    WalkDir(walkdir::Error),

    /// Returned when a walked file isn't under the blog directory.
    StripPrefix(StripPrefixError),

    /// Returned when the blog directory has a subdirectory whose section
    /// name would collide with [`ROOT_SECTION`].
    ReservedSection(PathBuf),

    /// Returned when the manifest isn't valid JSON of the expected shape.
    Json(serde_json::Error),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Open { path, err } => {
                write!(f, "Opening manifest '{}': {}", path.display(), err)
            }
            Error::WalkDir(err) => err.fmt(f),
            Error::StripPrefix(err) => err.fmt(f),
            Error::ReservedSection(path) => write!(
                f,
                "Directory '{}' uses the reserved section name '{}'",
                path.display(),
                ROOT_SECTION
            ),
            Error::Json(err) => write!(f, "Malformed manifest: {}", err),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Open { path: _, err } => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::StripPrefix(err) => Some(err),
            Error::ReservedSection(_) => None,
            Error::Json(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator while walking the blog directory.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<StripPrefixError> for Error {
    fn from(err: StripPrefixError) -> Error {
        Error::StripPrefix(err)
    }
}

impl From<serde_json::Error> for Error {
    /// Converts a [`serde_json::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for JSON (de)serialization.
    fn from(err: serde_json::Error) -> Error {
        Error::Json(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
