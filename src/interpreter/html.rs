use std::cell::RefCell;

use ego_tree::{NodeId, NodeRef, Tree};
use indexmap::IndexSet;
use piper_filter_types::{Error, Result, Value};
use scraper::{ElementRef, Html, Node, Selector};

use super::Context;
use crate::{
    frontend::{Axis, Extract, HtmlSelector, NavOp},
    schema::PipeType,
};

/// A node set in document order of discovery, without duplicates.
type NodeSet = IndexSet<NodeId>;

/// A parsed HTML document.
///
/// The tree sits behind a `RefCell` because the `rm(sel)` navigation
/// operator detaches nodes while contexts referring to the document are alive.
#[derive(Debug)]
pub struct Document {
    html: RefCell<Html>,
}

impl Document {
    #[must_use]
    pub fn parse(html: &str) -> Self {
        Self {
            html: RefCell::new(Html::parse_document(html)),
        }
    }

    /// The whole document, serialized.
    #[must_use]
    pub fn html(&self) -> String {
        self.html.borrow().html()
    }

    fn with_tree<T>(&self, f: impl FnOnce(&Tree<Node>) -> T) -> T {
        f(&self.html.borrow().tree)
    }

    /// Detaches every descendant of `nodes` that matches `selector`.
    fn remove(&self, nodes: &NodeSet, selector: &Selector) {
        let doomed = self.with_tree(|tree| find(tree, nodes, selector));
        if doomed.is_empty() {
            return;
        }

        tracing::trace!(count = doomed.len(), "removing nodes from document");
        let mut html = self.html.borrow_mut();
        for id in doomed {
            if let Some(mut node) = html.tree.get_mut(id) {
                node.detach();
            }
        }
    }
}

fn compile(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::schema(format!("invalid CSS selector `{css}`: {e}")))
}

fn is_element(node: &NodeRef<'_, Node>) -> bool {
    node.value().is_element()
}

fn matches(tree: &Tree<Node>, id: NodeId, selector: &Selector) -> bool {
    tree.get(id)
        .and_then(ElementRef::wrap)
        .is_some_and(|element| selector.matches(&element))
}

fn find(tree: &Tree<Node>, nodes: &NodeSet, selector: &Selector) -> NodeSet {
    nodes
        .iter()
        .filter_map(|&id| tree.get(id))
        .flat_map(|node| node.descendants().skip(1))
        .filter_map(ElementRef::wrap)
        .filter(|element| selector.matches(element))
        .map(|element| element.id())
        .collect()
}

fn step(tree: &Tree<Node>, id: NodeId, axis: Axis, out: &mut NodeSet) {
    let Some(node) = tree.get(id) else {
        return;
    };

    match axis {
        Axis::Itself => {
            out.insert(id);
        }
        Axis::Next => out.extend(node.next_siblings().find(is_element).map(|n| n.id())),
        Axis::Prev => out.extend(node.prev_siblings().find(is_element).map(|n| n.id())),
        Axis::NextAll => out.extend(node.next_siblings().filter(is_element).map(|n| n.id())),
        Axis::PrevAll => out.extend(node.prev_siblings().filter(is_element).map(|n| n.id())),
        Axis::Parent => out.extend(node.parent().filter(is_element).map(|n| n.id())),
        Axis::Parents => out.extend(node.ancestors().filter(is_element).map(|n| n.id())),
        Axis::Children => out.extend(node.children().filter(is_element).map(|n| n.id())),
        Axis::Siblings => {
            let siblings = node.parent().into_iter().flat_map(|p| p.children());
            out.extend(
                siblings
                    .filter(|n| is_element(n) && n.id() != id)
                    .map(|n| n.id()),
            );
        }
    }
}

fn text_of(tree: &Tree<Node>, id: NodeId) -> String {
    tree.get(id)
        .map(|node| {
            node.descendants()
                .filter_map(|n| n.value().as_text().map(|t| &**t))
                .collect()
        })
        .unwrap_or_default()
}

fn attr_of(tree: &Tree<Node>, id: NodeId, name: &str) -> Option<String> {
    tree.get(id)
        .and_then(ElementRef::wrap)
        .and_then(|element| element.value().attr(name))
        .map(str::to_owned)
}

/// A selection of nodes in a [`Document`], and what to read from them.
#[derive(Debug, Clone)]
pub struct HtmlContext<'d> {
    doc: &'d Document,
    nodes: NodeSet,
    extract: Extract,
}

impl<'d> HtmlContext<'d> {
    /// The context holding only the document node.
    #[must_use]
    pub fn root(doc: &'d Document) -> Self {
        let root = doc.with_tree(|tree| tree.root().id());
        Self {
            doc,
            nodes: NodeSet::from_iter([root]),
            extract: Extract::Text,
        }
    }

    fn with_nodes(&self, nodes: NodeSet) -> Self {
        Self {
            doc: self.doc,
            nodes,
            extract: Extract::Text,
        }
    }

    fn navigate(&self, nodes: NodeSet, op: &NavOp) -> Result<NodeSet> {
        Ok(match op {
            NavOp::Eq(n) => {
                let index = if *n < 0 {
                    usize::try_from(n.unsigned_abs())
                        .ok()
                        .and_then(|back| nodes.len().checked_sub(back))
                } else {
                    usize::try_from(*n).ok()
                };
                index
                    .and_then(|i| nodes.get_index(i))
                    .into_iter()
                    .copied()
                    .collect()
            }
            NavOp::First => nodes.first().into_iter().copied().collect(),
            NavOp::Last => nodes.last().into_iter().copied().collect(),
            NavOp::Move(axis) => self.doc.with_tree(|tree| {
                let mut out = NodeSet::new();
                for &id in &nodes {
                    step(tree, id, *axis, &mut out);
                }
                out
            }),
            NavOp::MoveFiltered(axis, css) => {
                let selector = compile(css)?;
                self.doc.with_tree(|tree| {
                    let mut out = NodeSet::new();
                    for &id in &nodes {
                        step(tree, id, *axis, &mut out);
                    }
                    out.retain(|&id| matches(tree, id, &selector));
                    out
                })
            }
            NavOp::Not(css) => {
                let selector = compile(css)?;
                self.doc.with_tree(|tree| {
                    let mut out = nodes;
                    out.retain(|&id| !matches(tree, id, &selector));
                    out
                })
            }
            NavOp::Remove(css) => {
                self.doc.remove(&nodes, &compile(css)?);
                nodes
            }
        })
    }

    /// Markup of each node: inner or outer for elements, the whole document
    /// for the document node, and the text for anything else.
    fn markup_list(&self, outer: bool) -> Vec<String> {
        let document_html = self.doc.html.borrow();
        let tree = &document_html.tree;
        self.nodes
            .iter()
            .filter_map(|&id| tree.get(id))
            .map(|node| match ElementRef::wrap(node) {
                Some(element) if outer => element.html(),
                Some(element) => element.inner_html(),
                None if node.value().is_document() => self.doc.html(),
                None => text_of(tree, node.id()),
            })
            .collect()
    }

    fn first_attr(&self, name: &str) -> Result<String> {
        self.nodes
            .first()
            .and_then(|&id| self.doc.with_tree(|tree| attr_of(tree, id, name)))
            .ok_or_else(|| Error::selector(format!("matched element has no attribute `{name}`")))
    }

    fn attr_list(&self, name: &str) -> Vec<String> {
        self.doc.with_tree(|tree| {
            self.nodes
                .iter()
                .filter_map(|&id| attr_of(tree, id, name))
                .collect()
        })
    }
}

impl Context for HtmlContext<'_> {
    fn select(&self, selector: &str) -> Result<Self> {
        let selector = HtmlSelector::parse(selector)?;

        let mut nodes = match &selector.css {
            Some(css) => {
                let css = compile(css)?;
                self.doc.with_tree(|tree| find(tree, &self.nodes, &css))
            }
            None => self.nodes.clone(),
        };

        for op in &selector.ops {
            nodes = self.navigate(nodes, op)?;
        }

        Ok(Self {
            doc: self.doc,
            nodes,
            extract: selector.extract,
        })
    }

    fn regex_source(&self) -> Result<String> {
        let first = self.with_nodes(self.nodes.first().into_iter().copied().collect());
        Ok(first.markup_list(false).concat())
    }

    fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn text(&self) -> Result<String> {
        match &self.extract {
            Extract::Text => Ok(self.doc.with_tree(|tree| {
                self.nodes.iter().map(|&id| text_of(tree, id)).collect()
            })),
            Extract::Attr(name) => self.first_attr(name),
            Extract::Html => Ok(self.markup_list(false).concat()),
            Extract::OuterHtml => Ok(self.markup_list(true).concat()),
        }
    }

    fn text_list(&self) -> Result<Vec<String>> {
        Ok(match &self.extract {
            Extract::Text => self.doc.with_tree(|tree| {
                self.nodes.iter().map(|&id| text_of(tree, id)).collect()
            }),
            Extract::Attr(name) => self.attr_list(name),
            Extract::Html => self.markup_list(false),
            Extract::OuterHtml => self.markup_list(true),
        })
    }

    fn items(&self) -> Result<Vec<Self>> {
        Ok(self
            .nodes
            .iter()
            .map(|&id| self.with_nodes(NodeSet::from_iter([id])))
            .collect())
    }

    fn markup(&self, kind: &PipeType) -> Option<Result<Value>> {
        Some(match kind {
            PipeType::Attr(name) => self.first_attr(name).map(Value::from),
            PipeType::Href => self.first_attr("href").map(Value::from),
            PipeType::Src => self.first_attr("src").map(Value::from),
            PipeType::Alt => self.first_attr("alt").map(Value::from),
            PipeType::AttrArray(name) => Ok(Value::from(self.attr_list(name))),
            PipeType::HrefArray => Ok(Value::from(self.attr_list("href"))),
            PipeType::Html => Ok(Value::from(self.markup_list(false).concat())),
            PipeType::OutHtml => Ok(Value::from(self.markup_list(true).concat())),
            _ => return None,
        })
    }
}
