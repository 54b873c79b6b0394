//! Markdown to HTML
//!
//! GitHub flavoured markdown via `pulldown-cmark`. Every heading gets a
//! GitHub-style slug id and a trailing `#` anchor link; h2/h3 headings make up
//! the page table of contents.

use lazy_static::lazy_static;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use std::collections::HashMap;

use super::types::{PageMeta, TocItem};
use super::ContentError;

lazy_static! {
    static ref SLUG_STRIP: Regex =
        Regex::new(r"[^\p{L}\p{N}\p{M} _-]").expect("Invalid slug regex");
}

/// Output of [`render_markdown`]: the HTML body and every heading it contains.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMarkdown {
    pub html: String,
    pub headings: Vec<TocItem>,
}

/// Splits a `---` fenced YAML header from the markdown body. A missing or
/// unterminated header yields default metadata and the whole input as body.
pub fn parse_frontmatter(raw: &str) -> Result<(PageMeta, &str), ContentError> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut lines = raw.split_inclusive('\n');

    match lines.next() {
        Some(first) if first.trim_end() == "---" => {
            let yaml_start = first.len();
            let mut offset = yaml_start;
            for line in lines {
                if line.trim_end() == "---" {
                    let yaml = &raw[yaml_start..offset];
                    let body = &raw[offset + line.len()..];
                    if yaml.trim().is_empty() {
                        return Ok((PageMeta::default(), body));
                    }
                    let meta = serde_yaml::from_str::<PageMeta>(yaml)
                        .map_err(|e| ContentError::Frontmatter(e.to_string()))?;
                    return Ok((meta, body));
                }
                offset += line.len();
            }
            Ok((PageMeta::default(), raw))
        }
        _ => Ok((PageMeta::default(), raw)),
    }
}

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// GitHub heading slugs: lowercase, punctuation dropped, spaces to dashes,
/// repeats suffixed with `-1`, `-2`, ...
#[derive(Default)]
struct Slugger {
    occurrences: HashMap<String, usize>,
}

impl Slugger {
    fn slug(&mut self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let base = SLUG_STRIP.replace_all(&lowered, "").replace(' ', "-");

        let mut result = base.clone();
        while self.occurrences.contains_key(&result) {
            let count = self.occurrences.entry(base.clone()).or_insert(0);
            *count += 1;
            result = format!("{}-{}", base, count);
        }
        self.occurrences.insert(result.clone(), 0);
        result
    }
}

pub fn render_markdown(body: &str) -> RenderedMarkdown {
    let mut slugger = Slugger::default();
    let mut headings = Vec::new();
    let mut events: Vec<Event> = Vec::new();

    // Heading being collected: level, plain text, inner events.
    let mut open_heading: Option<(u8, String, Vec<Event>)> = None;

    for event in Parser::new_ext(body, markdown_options()) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                open_heading = Some((level as u8, String::new(), Vec::new()));
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, text, inner)) = open_heading.take() {
                    let id = slugger.slug(&text);
                    let mut inner_html = String::new();
                    html::push_html(&mut inner_html, inner.into_iter());
                    events.push(Event::Html(CowStr::from(format!(
                        "<h{level} id=\"{id}\">{inner_html}<a class=\"anchor-link\" href=\"#{id}\">#</a></h{level}>\n"
                    ))));
                    headings.push(TocItem {
                        id,
                        text: text.trim().to_string(),
                        level,
                    });
                }
            }
            other => match open_heading.as_mut() {
                Some((_, text, inner)) => {
                    if let Event::Text(t) | Event::Code(t) = &other {
                        text.push_str(t);
                    }
                    inner.push(other);
                }
                None => events.push(other),
            },
        }
    }

    let mut html_out = String::with_capacity(body.len() * 3 / 2);
    html::push_html(&mut html_out, events.into_iter());

    RenderedMarkdown {
        html: html_out,
        headings,
    }
}

/// Table of contents: the h2 and h3 headings, in document order.
pub fn extract_toc(rendered: &RenderedMarkdown) -> Vec<TocItem> {
    rendered
        .headings
        .iter()
        .filter(|h| h.level == 2 || h.level == 3)
        .cloned()
        .collect()
}
