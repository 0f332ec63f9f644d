//! The library code for the `quire` static blog generator. At its heart is a
//! small hand-written markdown converter ([`crate::markdown`]): a forward scan
//! over the source lines that groups them into paragraphs, lists, code
//! fences, headers, blockquotes, and rules, with span-level markup
//! ([`crate::inline`]) rewritten by a fixed chain of regex substitutions.
//!
//! Around it sits the site build ([`crate::build`]):
//!
//! 1. List the blog directory into a manifest of sections and markdown files
//!    ([`crate::manifest`]), or load a pre-generated one.
//! 2. Read each post in manifest order ([`crate::source`]), pull out its title
//!    and date ([`crate::post`]), and convert it to HTML.
//! 3. Template and write the post pages and the index page, which lists the
//!    posts grouped by section ([`crate::index`], [`crate::write`]).

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod index;
pub mod inline;
pub mod manifest;
pub mod markdown;
pub mod post;
pub mod source;
pub mod write;
