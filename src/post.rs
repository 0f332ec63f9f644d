//! Defines the [`Post`] and [`Parser`] types. A post is the metadata the
//! index needs about one markdown file: its section, title, date, and where
//! its page lives. Titles and dates are pulled out of the raw text with a few
//! pattern scans (see [`extract_title`] and [`extract_date`]); the body itself
//! is converted separately by [`crate::markdown::convert`].

use chrono::NaiveDate;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::warn;
use url::Url;

/// The title given to posts without a `# ` heading.
pub const UNTITLED: &str = "Untitled";

const DATE_FORMAT: &str = "%Y-%m-%d";
const MARKDOWN_EXTENSION: &str = ".md";

/// Represents one blog post.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Post {
    /// The manifest section the post belongs to.
    pub section: String,

    /// The source file name within the section (e.g., `2024-01-15.md`).
    pub file_name: String,

    /// The text of the first level-one heading, or [`UNTITLED`].
    pub title: String,

    /// The post date, if the file name or contents carry one.
    pub date: Option<NaiveDate>,

    /// The URL of the post's page.
    pub url: Url,

    /// The location of the post's page on disk.
    pub file_path: PathBuf,
}

impl Post {
    /// Formats the date as `YYYY-MM-DD`, if there is one.
    pub fn date_string(&self) -> Option<String> {
        self.date.map(|date| date.format(DATE_FORMAT).to_string())
    }
}

/// Builds [`Post`]s from manifest entries.
pub struct Parser<'a> {
    /// `posts_url` is the base URL for post pages. A post's URL is
    /// `{posts_url}/{section}/{slug}.html`, so this should end in a trailing
    /// slash.
    posts_url: &'a Url,

    /// `posts_directory` is the directory in which post pages are rendered.
    posts_directory: &'a Path,

    /// Page paths already handed out, so that two entries whose file stems
    /// slugify alike don't overwrite each other's pages.
    taken: HashSet<PathBuf>,
}

impl<'a> Parser<'a> {
    /// Constructs a new parser. See fields on [`Parser`] for argument
    /// descriptions.
    pub fn new(posts_url: &'a Url, posts_directory: &'a Path) -> Parser<'a> {
        Parser {
            posts_url,
            posts_directory,
            taken: HashSet::new(),
        }
    }

    /// Builds the [`Post`] for `file_name` in `section` from its raw
    /// `markdown`.
    pub fn parse(
        &mut self,
        section: &str,
        file_name: &str,
        markdown: &str,
    ) -> Result<Post, url::ParseError> {
        let (url, file_path) = self.locate(section, file_name)?;
        Ok(Post {
            section: section.to_owned(),
            file_name: file_name.to_owned(),
            title: extract_title(markdown),
            date: extract_date(file_name, markdown),
            url,
            file_path,
        })
    }

    /// Returns the URL and output path of the page for a manifest entry.
    /// The page name is the slugified file stem, so `First Read.md` in
    /// `books` becomes `books/first-read.html`. If an earlier entry already
    /// claimed that page, a counter is appended (`first-read-2.html`,
    /// `first-read-3.html`, ...) until the name is free.
    pub fn locate(
        &mut self,
        section: &str,
        file_name: &str,
    ) -> Result<(Url, PathBuf), url::ParseError> {
        let stem = slug::slugify(file_name.trim_end_matches(MARKDOWN_EXTENSION));
        let mut section_directory = self.posts_directory.to_owned();
        section_directory.extend(section.split('/'));

        let mut page = format!("{}.html", stem);
        let mut suffix = 1;
        while self.taken.contains(&section_directory.join(&page)) {
            suffix += 1;
            page = format!("{}-{}.html", stem, suffix);
        }
        if suffix > 1 {
            warn!(%section, file = %file_name, %page, "page name already taken");
        }

        let url = self.posts_url.join(&format!("{}/{}", section, page))?;
        let file_path = section_directory.join(page);
        self.taken.insert(file_path.clone());
        Ok((url, file_path))
    }
}

fn title_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#\s+(.+)$").expect("invalid title regex"))
}

fn iso_date() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("invalid date regex"))
}

fn date_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)date:\s*(\d{4}-\d{2}-\d{2})").expect("invalid date line regex")
    })
}

/// Returns the text of the first `# ` heading line, trimmed, or [`UNTITLED`]
/// if there isn't one.
pub fn extract_title(markdown: &str) -> String {
    markdown
        .lines()
        .find_map(|line| title_line().captures(line))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|title| !title.is_empty())
        .unwrap_or(UNTITLED)
        .to_owned()
}

/// Finds a post's date. The file name wins (e.g., `2024-01-15.md`); failing
/// that, a `date: YYYY-MM-DD` line in the contents (any case). A candidate
/// that isn't a real calendar date is ignored.
pub fn extract_date(file_name: &str, markdown: &str) -> Option<NaiveDate> {
    let from_file_name = iso_date().find(file_name).map(|m| m.as_str());
    let from_contents = date_line()
        .captures(markdown)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str());
    from_file_name
        .into_iter()
        .chain(from_contents)
        .find_map(|candidate| NaiveDate::parse_from_str(candidate, DATE_FORMAT).ok())
}

/// Sorts posts newest first. Undated posts go after all dated posts, and
/// posts with equal dates keep their relative order.
pub fn sort_newest_first(posts: &mut [Post]) {
    // `None` orders before any `Some`, so reversing the comparison puts
    // undated posts last.
    posts.sort_by(|a, b| b.date.cmp(&a.date));
}
