//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: loading or generating the
//! manifest ([`crate::manifest`]), reading and converting each post in
//! manifest order ([`crate::source`], [`crate::markdown`]), writing the post
//! and index pages ([`crate::write`]), and copying the static source directory
//! into the static output directory.

use crate::config::Config;
use crate::index;
use crate::manifest::{self, Manifest, MANIFEST_FILE_NAME};
use crate::markdown;
use crate::post::Parser as PostParser;
use crate::source::{Directory, Source};
use crate::write::{Error as WriteError, Writer};
use gtmpl::Template;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const DEFAULT_INDEX_TEMPLATE: &str = include_str!("../theme/index.html");
const DEFAULT_POST_TEMPLATE: &str = include_str!("../theme/post.html");

/// What a build produced.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// Posts converted and listed on the index page.
    pub posts: usize,

    /// Manifest entries whose source couldn't be read. Each still gets a page
    /// carrying an inline error, but is left off the index.
    pub unreadable: usize,
}

/// Builds the site from a [`Config`] object, reading posts from the blog
/// directory.
pub fn build_site(config: &Config) -> Result<Summary> {
    build_site_from(config, &Directory::new(&config.blog_directory))
}

/// Builds the site from a [`Config`] object, reading posts through `source`.
/// Posts are fetched one at a time in manifest order.
pub fn build_site_from<S: Source>(config: &Config, source: &S) -> Result<Summary> {
    let manifest = match &config.manifest_file {
        Some(path) => {
            info!(path = %path.display(), "loading manifest");
            Manifest::load(path)?
        }
        None => Manifest::generate(&config.blog_directory)?,
    };

    let index_template = parse_template(config.index_template.as_deref(), DEFAULT_INDEX_TEMPLATE)?;
    let post_template = parse_template(config.post_template.as_deref(), DEFAULT_POST_TEMPLATE)?;

    // Only the directories we own are cleaned; the root output directory may
    // hold other files.
    rmdir(&config.posts_output_directory)?;
    rmdir(&config.static_output_directory)?;
    std::fs::create_dir_all(&config.root_output_directory)?;

    manifest.write_to(File::create(
        config.root_output_directory.join(MANIFEST_FILE_NAME),
    )?)?;

    let writer = Writer {
        index_template: &index_template,
        post_template: &post_template,
        root_output_directory: &config.root_output_directory,
        site_title: &config.title,
        home_page: &config.home_page,
        static_url: &config.static_url,
        theme: config.theme,
    };
    let mut parser = PostParser::new(&config.posts_url, &config.posts_output_directory);

    let mut summary = Summary::default();
    let mut posts = Vec::with_capacity(manifest.file_count());
    for (section, file_name) in manifest.entries() {
        match source.fetch(section, file_name) {
            Ok(markdown) => {
                let post = parser.parse(section, file_name, &markdown)?;
                writer.write_post(&post, markdown::convert(&markdown))?;
                posts.push(post);
                summary.posts += 1;
            }
            Err(err) => {
                warn!(%section, file = %file_name, error = %err, "could not read post");
                let (_, file_path) = parser.locate(section, file_name)?;
                writer.write_unreadable_post(section, &file_path, &err)?;
                summary.unreadable += 1;
            }
        }
    }

    writer.write_index(&index::group_by_section(posts))?;

    if config.static_source_directory.is_dir() {
        copy_dir(
            &config.static_source_directory,
            &config.static_output_directory,
        )?;
    }

    info!(
        posts = summary.posts,
        unreadable = summary.unreadable,
        output = %config.root_output_directory.display(),
        "built site"
    );
    Ok(summary)
}

fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &dst.join(entry.file_name()))?;
        } else {
            std::fs::copy(entry.path(), dst.join(entry.file_name()))?;
        }
    }

    Ok(())
}

// Loads the template file if one is configured and parses it, falling back to
// the built-in template otherwise.
fn parse_template(path: Option<&Path>, default: &str) -> Result<Template> {
    let contents = match path {
        Some(path) => std::fs::read_to_string(path).map_err(|e| Error::OpenTemplateFile {
            path: path.to_owned(),
            err: e,
        })?,
        None => default.to_owned(),
    };

    let mut template = Template::default();
    template.parse(&contents).map_err(Error::ParseTemplate)?;
    Ok(template)
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during manifest
/// loading, writing, cleaning output directories, parsing template files, and
/// other I/O. An unreadable post is not an error.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors generating or loading the manifest.
    Manifest(manifest::Error),

    /// Returned for errors writing pages to disk.
    Write(WriteError),

    /// Returned when a post URL can't be built from the site root.
    UrlParse(url::ParseError),

    /// Returned for I/O problems while cleaning output directories.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate(String),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Manifest(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate(err) => write!(f, "Parsing template: {}", err),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Manifest(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::UrlParse(err) => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate(_) => None,
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<manifest::Error> for Error {
    /// Converts [`manifest::Error`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: manifest::Error) -> Error {
        Error::Manifest(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}
