//! Renders the blog list shown on the index page: posts grouped by section,
//! newest first within each section. Also home to the small HTML blocks the
//! build shows in place of content (the empty state and inline errors).

use crate::post::{sort_newest_first, Post};
use html_escape::encode_text;

/// The posts of one section, in display order.
#[derive(Debug)]
pub struct Section {
    pub name: String,
    pub posts: Vec<Post>,
}

impl Section {
    /// The human-readable section title (see [`display_name`]).
    pub fn title(&self) -> String {
        display_name(&self.name)
    }

    /// The fragment identifier of the section on the index page.
    pub fn anchor(&self) -> String {
        anchor(&self.name)
    }
}

/// Groups `posts` by section. Sections keep the order in which they first
/// appear in `posts`; posts within a section are sorted newest first.
pub fn group_by_section(posts: Vec<Post>) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    for post in posts {
        match sections.iter_mut().find(|s| s.name == post.section) {
            Some(section) => section.posts.push(post),
            None => sections.push(Section {
                name: post.section.clone(),
                posts: vec![post],
            }),
        }
    }
    for section in sections.iter_mut() {
        sort_newest_first(&mut section.posts);
    }
    sections
}

/// Turns a section name into a title: the first character is upper-cased and
/// hyphens become spaces (`daily-reads` becomes `Daily reads`).
pub fn display_name(section: &str) -> String {
    let mut chars = section.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first
            .to_uppercase()
            .chain(chars)
            .map(|c| if c == '-' { ' ' } else { c })
            .collect(),
    }
}

/// The anchor for a section on the index page (e.g., `index.html#books`).
pub fn anchor(section: &str) -> String {
    slug::slugify(section)
}

/// Renders the blog list. An empty list renders the empty state instead.
pub fn render(sections: &[Section]) -> String {
    if sections.iter().all(|s| s.posts.is_empty()) {
        return empty_state();
    }

    let mut html = String::new();
    for section in sections {
        html.push_str(&format!(
            "<section class=\"section\" id=\"{}\">\n<h2 class=\"section-title\">{}</h2>\n<ul class=\"post-list\">\n",
            section.anchor(),
            encode_text(&section.title()),
        ));
        for post in &section.posts {
            html.push_str(&format!(
                "<li class=\"post-item\"><h3 class=\"post-title\"><a href=\"{}\">{}</a></h3>",
                post.url,
                encode_text(&post.title),
            ));
            if let Some(date) = post.date_string() {
                html.push_str(&format!("<p class=\"post-date\">{}</p>", date));
            }
            html.push_str("</li>\n");
        }
        html.push_str("</ul>\n</section>\n");
    }
    html
}

/// The block shown when the blog has no readable posts.
pub fn empty_state() -> String {
    String::from(
        "<div class=\"empty-state\">\n\
         <h2>No posts yet</h2>\n\
         <p>Add markdown files to the blog folders to get started.</p>\n\
         <p>Then run <code>quire build</code> again.</p>\n\
         </div>\n",
    )
}

/// An inline error message, shown in place of content that couldn't be
/// loaded.
pub fn error_block(heading: &str, message: &str) -> String {
    format!(
        "<div class=\"error\">\n<h2>{}</h2>\n<p>{}</p>\n</div>\n",
        encode_text(heading),
        encode_text(message),
    )
}
