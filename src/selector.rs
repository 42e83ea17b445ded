//! Selector synthesis for recorded interactions.
//!
//! Given the element a user interacted with, build a CSS selector that finds
//! the same element again on replay. An id or a class list ends the search
//! immediately; otherwise the selector is a structural path from the
//! document root down to the element, using `:nth-of-type` wherever a parent
//! has several children with the same tag.

use std::fmt;

use crate::dom::DomElement;
use crate::errors::{Result, WebtrailError};

const COMBINATOR: &str = " > ";
const NTH_OF_TYPE: &str = ":nth-of-type(";

/// One step of a selector path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// `#id`
    Id(String),
    /// `.a.b`, tokens in declaration order
    ClassList(Vec<String>),
    /// `tag:nth-of-type(position)`, position is 1-based
    TagWithIndex { tag: String, position: usize },
    /// bare `tag`
    Tag(String),
}

impl Segment {
    fn parse(text: &str) -> Result<Self> {
        let invalid = || WebtrailError::Parse(format!("Invalid selector segment: '{}'", text));

        if let Some(id) = text.strip_prefix('#') {
            if id.is_empty() {
                return Err(invalid());
            }
            return Ok(Segment::Id(id.to_string()));
        }

        if let Some(classes) = text.strip_prefix('.') {
            let tokens: Vec<String> = classes.split('.').map(str::to_string).collect();
            if tokens.iter().any(String::is_empty) {
                return Err(invalid());
            }
            return Ok(Segment::ClassList(tokens));
        }

        if let Some((tag, rest)) = text.split_once(NTH_OF_TYPE) {
            let position = rest
                .strip_suffix(')')
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|n| *n >= 1)
                .ok_or_else(invalid)?;
            if tag.is_empty() {
                return Err(invalid());
            }
            return Ok(Segment::TagWithIndex {
                tag: tag.to_string(),
                position,
            });
        }

        if text.is_empty() || text.contains(char::is_whitespace) || text.contains('>') {
            return Err(invalid());
        }
        Ok(Segment::Tag(text.to_string()))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Id(id) => write!(f, "#{}", id),
            Segment::ClassList(classes) => {
                for class in classes {
                    write!(f, ".{}", class)?;
                }
                Ok(())
            }
            Segment::TagWithIndex { tag, position } => {
                write!(f, "{}{}{})", tag, NTH_OF_TYPE, position)
            }
            Segment::Tag(tag) => f.write_str(tag),
        }
    }
}

/// Ordered selector path, outermost ancestor first
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    segments: Vec<Segment>,
}

impl Selector {
    pub fn new(segments: Vec<Segment>) -> Self {
        Selector { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Parse a selector written by [`Selector`]'s `Display`
    ///
    /// Segments are split on the `" > "` combinator only, so ids and class
    /// tokens may contain a bare `>`. A token containing `" > "` itself does
    /// not survive a round trip.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(WebtrailError::Parse("Empty selector".to_string()));
        }
        let segments = text
            .split(COMBINATOR)
            .map(|part| Segment::parse(part.trim()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Selector { segments })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(COMBINATOR)?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// Position of an element among its parent's children with the same tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeRank {
    /// How many of the parent's children share the tag
    pub count: usize,
    /// 1-based rank of the element among them
    pub position: usize,
}

/// Compute the `:nth-of-type` rank of an element
pub fn nth_of_type<E: DomElement>(element: &E) -> TypeRank {
    let (tags, index) = element.sibling_tags();
    let tag = element.tag_name();

    let count = tags.iter().filter(|t| t.eq_ignore_ascii_case(tag)).count();
    let position = tags
        .iter()
        .take(index)
        .filter(|t| t.eq_ignore_ascii_case(tag))
        .count()
        + 1;
    TypeRank {
        count: count.max(1),
        position,
    }
}

/// Selector for the element alone, ignoring its ancestors
fn own_segment<E: DomElement>(element: &E) -> Segment {
    if let Some(id) = element.id().filter(|id| !id.is_empty()) {
        return Segment::Id(id.to_string());
    }

    let classes: Vec<String> = element
        .class_name()
        .map(|c| c.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    if !classes.is_empty() {
        return Segment::ClassList(classes);
    }

    Segment::Tag(element.tag_name().to_ascii_lowercase())
}

/// Build the selector path for `element`
///
/// Never fails: an element with nothing else to go on gets its bare tag,
/// prefixed by its ancestors.
pub fn synthesize<E: DomElement>(element: &E) -> Selector {
    let own = own_segment(element);
    if !matches!(own, Segment::Tag(_)) {
        return Selector::new(vec![own]);
    }

    // Built back to front, reversed at the end.
    let mut reversed = vec![own];
    let mut child_rank = nth_of_type(element);
    let mut child_tag = element.tag_name().to_ascii_lowercase();
    let mut current = element.parent();

    while let Some(parent) = current {
        let parent_tag = parent.tag_name().to_ascii_lowercase();
        if child_rank.count > 1 {
            reversed.push(Segment::TagWithIndex {
                tag: child_tag,
                position: child_rank.position,
            });
        }
        reversed.push(Segment::Tag(parent_tag.clone()));

        child_rank = nth_of_type(&parent);
        child_tag = parent_tag;
        current = parent.parent();
    }

    reversed.reverse();
    collapse_redundant(Selector::new(reversed))
}

/// Drop a bare tag segment that directly follows an `:nth-of-type` segment
/// for the same tag. Single left-to-right pass.
pub fn collapse_redundant(selector: Selector) -> Selector {
    let mut cleaned = Vec::with_capacity(selector.segments.len());
    let mut segments = selector.segments.into_iter().peekable();

    while let Some(segment) = segments.next() {
        if let Segment::TagWithIndex { tag, .. } = &segment
            && matches!(segments.peek(), Some(Segment::Tag(next)) if next == tag)
        {
            segments.next();
        }
        cleaned.push(segment);
    }

    Selector::new(cleaned)
}

/// Convenience wrapper returning the serialized selector
pub fn synthesize_string<E: DomElement>(element: &E) -> String {
    synthesize(element).to_string()
}

#[cfg(test)]
#[path = "selector_test.rs"]
mod selector_test;
