use crate::config::Theme;
use crate::index::{self, Section};
use crate::post::Post;
use gtmpl::{Context, Template, Value};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// The file name of the index page in the root output directory.
pub const INDEX_FILE_NAME: &str = "index.html";

/// Responsible for templating and writing HTML pages to disk.
pub struct Writer<'a> {
    /// The template for the index page.
    pub index_template: &'a Template,

    /// The template for post pages.
    pub post_template: &'a Template,

    /// The directory the index page is written to.
    pub root_output_directory: &'a Path,

    /// The site title. Post pages are titled `{post title} - {site_title}`.
    pub site_title: &'a str,

    /// The URL for the site's home page. This is made available to both post
    /// and index templates, typically as the destination for the site-header
    /// link.
    pub home_page: &'a Url,

    /// The URL for the static assets, typically for the theme's stylesheet.
    pub static_url: &'a Url,

    pub theme: Theme,
}

impl Writer<'_> {
    /// Writes the index page listing `sections`.
    pub fn write_index(&self, sections: &[Section]) -> Result<()> {
        self.write_page(&Page {
            title: self.site_title.to_owned(),
            content: index::render(sections),
            breadcrumb: None,
            file_path: self.root_output_directory.join(INDEX_FILE_NAME),
            template: self.index_template,
        })
    }

    /// Writes the page for `post` with its converted `body`.
    pub fn write_post(&self, post: &Post, body: String) -> Result<()> {
        self.write_page(&Page {
            title: format!("{} - {}", post.title, self.site_title),
            content: body,
            breadcrumb: Some(self.breadcrumb(&post.section)),
            file_path: post.file_path.clone(),
            template: self.post_template,
        })
    }

    /// Writes a post page that carries an inline error in place of the post,
    /// for a manifest entry whose source couldn't be read.
    pub fn write_unreadable_post(
        &self,
        section: &str,
        file_path: &Path,
        err: &io::Error,
    ) -> Result<()> {
        self.write_page(&Page {
            title: format!("Error Loading Post - {}", self.site_title),
            content: index::error_block(
                "Error Loading Post",
                &format!(
                    "Could not load the blog post. The file might not exist. Error: {}",
                    err
                ),
            ),
            breadcrumb: Some(self.breadcrumb(section)),
            file_path: file_path.to_owned(),
            template: self.post_template,
        })
    }

    fn breadcrumb(&self, section: &str) -> String {
        format!(
            r#"<a href="{}#{}">{}</a>"#,
            self.home_page,
            index::anchor(section),
            html_escape::encode_text(&index::display_name(section)),
        )
    }

    /// Takes a single [`Page`], templates it, and writes it to disk.
    fn write_page(&self, page: &Page) -> Result<()> {
        if let Some(dir) = page.file_path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let mut value = page.to_value();
        if let Value::Object(obj) = &mut value {
            obj.insert(
                "site_title".to_owned(),
                Value::String(html_escape::encode_text(self.site_title).into_owned()),
            );
            obj.insert(
                "home_page".to_owned(),
                Value::String(self.home_page.to_string()),
            );
            obj.insert(
                "static_url".to_owned(),
                Value::String(self.static_url.to_string()),
            );
            obj.insert("theme".to_owned(), Value::String(self.theme.to_string()));
        }

        debug!(path = %page.file_path.display(), "writing page");
        page.template.execute(
            &mut std::fs::File::create(&page.file_path)?,
            &Context::from(value)?,
        )?;
        Ok(())
    }
}

/// An object representing an output HTML file. A [`Page`] can be converted to
/// a [`Value`] and thus rendered in a template via [`Page::to_value`].
struct Page<'a> {
    /// The contents of the `<title>` element.
    title: String,

    /// The HTML for the main content area.
    content: String,

    /// A link back to the post's section on the index page, if any.
    breadcrumb: Option<String>,

    /// The target location on disk for the output file.
    file_path: PathBuf,

    /// The template with which the page will be rendered.
    template: &'a Template,
}

impl Page<'_> {
    /// Converts a [`Page`] into a [`Value`]. The result is a
    /// [`Value::Object`] with fields `title`, `content`, and `breadcrumb`
    /// (`Nil` when absent).
    fn to_value(&self) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert(
            "title".to_owned(),
            Value::String(html_escape::encode_text(&self.title).into_owned()),
        );
        m.insert("content".to_owned(), Value::String(self.content.clone()));
        m.insert(
            "breadcrumb".to_owned(),
            match &self.breadcrumb {
                Some(html) => Value::String(html.clone()),
                None => Value::Nil,
            },
        );
        Value::Object(m)
    }
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error during templating.
    Template(String),

    /// An error writing the output files.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`]. This
    /// allows us to use the `?` operator for fallible template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => write!(f, "Rendering template: {}", err),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(_) => None,
            Error::Io(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::Parser;
    use std::fs;

    fn template(text: &str) -> Template {
        let mut template = Template::default();
        template.parse(text).unwrap();
        template
    }

    #[test]
    fn test_write_post() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let home_page = Url::parse("https://example.org/index.html")?;
        let static_url = Url::parse("https://example.org/static/")?;
        let posts_url = Url::parse("https://example.org/posts/")?;
        let index_template = template("{{ .content }}");
        let post_template = template(
            "{{ .title }}|{{ .site_title }}|{{ .breadcrumb }}|{{ .content }}|{{ .theme }}",
        );
        let writer = Writer {
            index_template: &index_template,
            post_template: &post_template,
            root_output_directory: dir.path(),
            site_title: "Reads & Notes",
            home_page: &home_page,
            static_url: &static_url,
            theme: Theme::Light,
        };

        let posts_directory = dir.path().join("posts");
        let post = Parser::new(&posts_url, &posts_directory).parse(
            "daily-reads",
            "2024-01-15.md",
            "# A & B",
        )?;
        writer.write_post(&post, String::from("<p>hi</p>"))?;

        assert_eq!(
            "A &amp; B - Reads &amp; Notes|Reads &amp; Notes|<a href=\"https://example.org/index.html#daily-reads\">Daily reads</a>|<p>hi</p>|light",
            fs::read_to_string(posts_directory.join("daily-reads/2024-01-15.html"))?
        );
        Ok(())
    }
}
