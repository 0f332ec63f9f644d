//! Loads the project configuration from a `quire.yaml` file.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file [`Config::from_directory`] searches for.
pub const PROJECT_FILE_NAME: &str = "quire.yaml";

/// The color scheme the pages are rendered with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

impl Default for Theme {
    fn default() -> Self {
        Theme::Dark
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        })
    }
}

fn default_blog_directory() -> PathBuf {
    PathBuf::from("blog")
}

#[derive(Deserialize)]
struct Project {
    title: String,
    site_root: Url,

    #[serde(default = "default_blog_directory")]
    blog_directory: PathBuf,

    #[serde(default)]
    manifest: Option<PathBuf>,

    #[serde(default)]
    theme: Theme,

    #[serde(default)]
    index_template: Option<PathBuf>,

    #[serde(default)]
    post_template: Option<PathBuf>,
}

/// The resolved configuration for a build. Relative paths in the project
/// file are resolved against the project file's directory.
#[derive(Debug)]
pub struct Config {
    pub title: String,
    pub theme: Theme,

    /// The URL of the index page.
    pub home_page: Url,

    /// The base URL for post pages (`{site_root}/posts/`).
    pub posts_url: Url,

    /// The base URL for static assets (`{site_root}/static/`).
    pub static_url: Url,

    pub blog_directory: PathBuf,

    /// A pre-generated manifest. When unset, the manifest is generated from
    /// `blog_directory` at build time.
    pub manifest_file: Option<PathBuf>,

    pub index_template: Option<PathBuf>,
    pub post_template: Option<PathBuf>,

    /// Copied verbatim to `static_output_directory` if it exists.
    pub static_source_directory: PathBuf,

    pub root_output_directory: PathBuf,
    pub posts_output_directory: PathBuf,
    pub static_output_directory: PathBuf,
}

impl Config {
    /// Searches `dir` and then each of its ancestors for a `quire.yaml` and
    /// loads the first one found.
    pub fn from_directory(dir: &Path, output_directory: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE_NAME);
        if path.exists() {
            return Config::from_project_file(&path, output_directory)
                .with_context(|| format!("Loading configuration from `{}`", path.display()));
        }
        match dir.parent() {
            Some(parent) => Config::from_directory(parent, output_directory),
            None => Err(anyhow!(
                "Could not find `{}` in any parent directory",
                PROJECT_FILE_NAME
            )),
        }
    }

    pub fn from_project_file(path: &Path, output_directory: &Path) -> Result<Config> {
        let file = File::open(path)
            .with_context(|| format!("Opening project file `{}`", path.display()))?;
        let project: Project = serde_yaml::from_reader(file)?;
        let project_root = path.parent().ok_or_else(|| {
            anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )
        })?;
        Config::from_project(project, project_root, output_directory)
    }

    fn from_project(
        project: Project,
        project_root: &Path,
        output_directory: &Path,
    ) -> Result<Config> {
        // `Url::join` treats the last path segment as a file name unless it
        // ends in a slash.
        let mut site_root = project.site_root;
        if !site_root.path().ends_with('/') {
            let path = format!("{}/", site_root.path());
            site_root.set_path(&path);
        }

        Ok(Config {
            title: project.title,
            theme: project.theme,
            home_page: site_root.join("index.html")?,
            posts_url: site_root.join("posts/")?,
            static_url: site_root.join("static/")?,
            blog_directory: project_root.join(project.blog_directory),
            manifest_file: project.manifest.map(|p| project_root.join(p)),
            index_template: project.index_template.map(|p| project_root.join(p)),
            post_template: project.post_template.map(|p| project_root.join(p)),
            static_source_directory: project_root.join("static"),
            root_output_directory: output_directory.to_owned(),
            posts_output_directory: output_directory.join("posts"),
            static_output_directory: output_directory.join("static"),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_from_directory_searches_parents() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join(PROJECT_FILE_NAME),
            "title: Apram Reads\nsite_root: https://example.org/blog\ntheme: light\n",
        )?;
        let nested = dir.path().join("blog").join("books");
        fs::create_dir_all(&nested)?;

        let config = Config::from_directory(&nested, Path::new("out"))?;
        assert_eq!("Apram Reads", config.title);
        assert_eq!(Theme::Light, config.theme);
        assert_eq!("https://example.org/blog/index.html", config.home_page.as_str());
        assert_eq!("https://example.org/blog/posts/", config.posts_url.as_str());
        assert_eq!("https://example.org/blog/static/", config.static_url.as_str());
        assert_eq!(dir.path().join("blog"), config.blog_directory);
        assert_eq!(None, config.manifest_file);
        assert_eq!(Path::new("out").join("posts"), config.posts_output_directory);
        Ok(())
    }

    #[test]
    fn test_optional_fields() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(PROJECT_FILE_NAME);
        fs::write(
            &path,
            "title: T\nsite_root: https://example.org/\nblog_directory: content\n\
             manifest: blog-manifest.json\npost_template: theme/post.html\n",
        )?;

        let config = Config::from_project_file(&path, Path::new("out"))?;
        assert_eq!(Theme::Dark, config.theme);
        assert_eq!(dir.path().join("content"), config.blog_directory);
        assert_eq!(
            Some(dir.path().join("blog-manifest.json")),
            config.manifest_file
        );
        assert_eq!(None, config.index_template);
        assert_eq!(
            Some(dir.path().join("theme/post.html")),
            config.post_template
        );
        Ok(())
    }

    #[test]
    fn test_missing_title_is_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(PROJECT_FILE_NAME);
        fs::write(&path, "site_root: https://example.org/\n")?;
        assert!(Config::from_project_file(&path, Path::new("out")).is_err());
        Ok(())
    }
}
