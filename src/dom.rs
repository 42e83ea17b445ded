//! Element handles the selector synthesizer walks over.
//!
//! Two implementations exist: [`NodeRef`] over an in-memory [`Document`]
//! and [`LineageRef`] over an [`ElementSnapshot`] captured inside a live
//! page and shipped to the host with each interaction.

use serde::{Deserialize, Serialize};

use crate::selector::{Segment, Selector};

/// Read-only view of a DOM element
pub trait DomElement: Sized {
    /// Tag name as reported by the document (any case)
    fn tag_name(&self) -> &str;

    /// Value of the `id` attribute, if any
    fn id(&self) -> Option<&str>;

    /// Raw `class` attribute, if any
    fn class_name(&self) -> Option<&str>;

    /// Parent element, `None` at the document root
    fn parent(&self) -> Option<Self>;

    /// Tag names of the parent's element children in document order,
    /// and this element's index in that list
    fn sibling_tags(&self) -> (Vec<&str>, usize);
}

/// Index of a node inside a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    id: Option<String>,
    class: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Attributes for a new element appended to a [`Document`]
#[derive(Debug, Clone, Default)]
pub struct ElementSpec {
    tag: String,
    id: Option<String>,
    class: Option<String>,
}

impl ElementSpec {
    pub fn new(tag: &str) -> Self {
        ElementSpec {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.class = Some(class.to_string());
        self
    }
}

/// Minimal element tree used to compute and resolve selectors off-browser
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    /// Create a document whose root element has the given tag
    pub fn new(root_tag: &str) -> Self {
        Document {
            nodes: vec![Node {
                tag: root_tag.to_string(),
                id: None,
                class: None,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append an element as the last child of `parent`
    pub fn append(&mut self, parent: NodeId, spec: ElementSpec) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            tag: spec.tag,
            id: spec.id,
            class: spec.class,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn element(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { doc: self, id }
    }

    /// All elements in document order
    pub fn elements(&self) -> impl Iterator<Item = NodeRef<'_>> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        order.into_iter().map(move |id| self.element(id))
    }

    /// Resolve a selector using child-combinator semantics
    ///
    /// The last segment must match the candidate itself, every earlier
    /// segment its successive parents.
    pub fn select(&self, selector: &Selector) -> Vec<NodeId> {
        let segments = selector.segments();
        if segments.is_empty() {
            return Vec::new();
        }

        self.elements()
            .filter(|candidate| {
                let mut current = Some(*candidate);
                for segment in segments.iter().rev() {
                    match current {
                        Some(el) if segment_matches(segment, &el) => current = el.parent(),
                        _ => return false,
                    }
                }
                true
            })
            .map(|el| el.id)
            .collect()
    }
}

fn segment_matches<E: DomElement>(segment: &Segment, el: &E) -> bool {
    match segment {
        Segment::Id(id) => el.id() == Some(id.as_str()),
        Segment::ClassList(classes) => {
            let tokens: Vec<&str> = el
                .class_name()
                .map(|c| c.split_whitespace().collect())
                .unwrap_or_default();
            classes.iter().all(|c| tokens.contains(&c.as_str()))
        }
        Segment::Tag(tag) => el.tag_name().eq_ignore_ascii_case(tag),
        Segment::TagWithIndex { tag, position } => {
            el.tag_name().eq_ignore_ascii_case(tag)
                && crate::selector::nth_of_type(el).position == *position
        }
    }
}

/// Handle to an element of a [`Document`]
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn node_id(&self) -> NodeId {
        self.id
    }

    fn node(&self) -> &'a Node {
        &self.doc.nodes[self.id.0]
    }
}

impl DomElement for NodeRef<'_> {
    fn tag_name(&self) -> &str {
        &self.node().tag
    }

    fn id(&self) -> Option<&str> {
        self.node().id.as_deref()
    }

    fn class_name(&self) -> Option<&str> {
        self.node().class.as_deref()
    }

    fn parent(&self) -> Option<Self> {
        self.node().parent.map(|id| NodeRef { doc: self.doc, id })
    }

    fn sibling_tags(&self) -> (Vec<&str>, usize) {
        let Some(parent) = self.node().parent else {
            return (vec![self.tag_name()], 0);
        };
        let children = &self.doc.nodes[parent.0].children;
        let tags = children
            .iter()
            .map(|child| self.doc.nodes[child.0].tag.as_str())
            .collect();
        let index = children
            .iter()
            .position(|child| *child == self.id)
            .unwrap_or(0);
        (tags, index)
    }
}

/// One level of a lineage captured in the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageLevel {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    /// Tags of the parent's element children, empty at the root
    #[serde(default)]
    pub siblings: Vec<String>,
    /// Index of this level in `siblings`
    #[serde(default)]
    pub index: usize,
}

/// Target-to-root chain of element facts, `lineage[0]` is the target
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub lineage: Vec<LineageLevel>,
}

impl ElementSnapshot {
    /// Snapshot an element of an in-memory document
    pub fn capture<E: DomElement>(element: &E) -> Self
    where
        E: Clone,
    {
        let mut lineage = Vec::new();
        let mut current = Some(element.clone());
        while let Some(el) = current {
            let (siblings, index) = if el.parent().is_some() {
                let (tags, index) = el.sibling_tags();
                (tags.into_iter().map(str::to_string).collect(), index)
            } else {
                (Vec::new(), 0)
            };
            lineage.push(LineageLevel {
                tag: el.tag_name().to_string(),
                id: el.id().map(str::to_string),
                class_name: el.class_name().map(str::to_string),
                siblings,
                index,
            });
            current = el.parent();
        }
        ElementSnapshot { lineage }
    }

    /// Handle to the captured target, `None` for an empty snapshot
    pub fn target(&self) -> Option<LineageRef<'_>> {
        if self.lineage.is_empty() {
            None
        } else {
            Some(LineageRef {
                levels: &self.lineage,
                depth: 0,
            })
        }
    }
}

/// Handle to one level of an [`ElementSnapshot`]
#[derive(Debug, Clone, Copy)]
pub struct LineageRef<'a> {
    levels: &'a [LineageLevel],
    depth: usize,
}

impl<'a> LineageRef<'a> {
    fn level(&self) -> &'a LineageLevel {
        &self.levels[self.depth]
    }
}

impl DomElement for LineageRef<'_> {
    fn tag_name(&self) -> &str {
        &self.level().tag
    }

    fn id(&self) -> Option<&str> {
        self.level().id.as_deref()
    }

    fn class_name(&self) -> Option<&str> {
        self.level().class_name.as_deref()
    }

    fn parent(&self) -> Option<Self> {
        let depth = self.depth + 1;
        (depth < self.levels.len()).then_some(LineageRef {
            levels: self.levels,
            depth,
        })
    }

    fn sibling_tags(&self) -> (Vec<&str>, usize) {
        let level = self.level();
        if level.siblings.is_empty() {
            return (vec![level.tag.as_str()], 0);
        }
        (
            level.siblings.iter().map(String::as_str).collect(),
            level.index,
        )
    }
}
