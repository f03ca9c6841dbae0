//! Namespace-scoped path queries over a [`Document`].
//!
//! A small subset of XPath 1.0 location paths, enough for reading AWS
//! responses:
//!
//! ```text
//! //az:Items/az:Item      descendant search from the document
//! /Response/Errors/Error  absolute child steps
//! ec2:regionName          relative to a context element
//! Error//Code             descendant step in the middle of a path
//! *                       any element
//! ```
//!
//! One prefix is registered per view. An unprefixed name matches elements in
//! no namespace, as in XPath; a name with an unregistered prefix matches
//! nothing.

use tracing::debug;

use crate::document::{Document, Element};

/// A query view over a document with a single registered namespace alias.
#[derive(Debug, Clone, Copy)]
pub struct XPath<'a> {
    document: &'a Document,
    prefix: &'a str,
    namespace: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, Copy)]
struct Step<'p> {
    axis: Axis,
    test: &'p str,
}

impl<'a> XPath<'a> {
    /// Create a view that resolves `prefix:` to `namespace`.
    #[must_use]
    pub fn new(document: &'a Document, prefix: &'a str, namespace: &'a str) -> Self {
        Self {
            document,
            prefix,
            namespace,
        }
    }

    /// The registered prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        self.prefix
    }

    /// The namespace URI bound to the registered prefix.
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.namespace
    }

    /// Evaluate a path against the document.
    ///
    /// Relative paths are evaluated from the document element.
    #[must_use]
    pub fn query(&self, path: &str) -> Vec<&'a Element> {
        let root = self.document.root();
        if path.starts_with('/') {
            return self.evaluate_absolute(path);
        }
        self.query_from(root, path)
    }

    /// Evaluate a relative path with `context` as the starting element.
    #[must_use]
    pub fn query_from(&self, context: &'a Element, path: &str) -> Vec<&'a Element> {
        if path.starts_with('/') {
            return self.evaluate_absolute(path);
        }
        let steps = parse_steps(path, Axis::Child);
        self.apply_steps(vec![context], &steps)
    }

    /// First match of `path`, if any.
    #[must_use]
    pub fn first(&self, path: &str) -> Option<&'a Element> {
        self.query(path).into_iter().next()
    }

    /// XPath `string(path)`: the string value of the first match, or `""`.
    #[must_use]
    pub fn evaluate_string(&self, context: &'a Element, path: &str) -> String {
        self.query_from(context, path)
            .first()
            .map(|element| element.string_value())
            .unwrap_or_default()
    }

    fn evaluate_absolute(&self, path: &str) -> Vec<&'a Element> {
        let root = self.document.root();
        let (first_axis, rest) = match path.strip_prefix("//") {
            Some(rest) => (Axis::Descendant, rest),
            None => (Axis::Child, path.trim_start_matches('/')),
        };
        let steps = parse_steps(rest, first_axis);
        let Some((first, remaining)) = steps.split_first() else {
            return Vec::new();
        };

        // The document node's only child is the root element.
        let candidates: Vec<&'a Element> = match first.axis {
            Axis::Child => vec![root],
            Axis::Descendant => std::iter::once(root).chain(root.descendants()).collect(),
        };
        let matched = candidates
            .into_iter()
            .filter(|element| self.matches(element, first.test))
            .collect();
        self.apply_steps(matched, remaining)
    }

    fn apply_steps(&self, mut current: Vec<&'a Element>, steps: &[Step<'_>]) -> Vec<&'a Element> {
        for step in steps {
            let mut next: Vec<&'a Element> = Vec::new();
            for context in current {
                let candidates: Vec<&'a Element> = match step.axis {
                    Axis::Child => context.children().collect(),
                    Axis::Descendant => context.descendants(),
                };
                for candidate in candidates {
                    if self.matches(candidate, step.test)
                        && !next.iter().any(|seen| std::ptr::eq(*seen, candidate))
                    {
                        next.push(candidate);
                    }
                }
            }
            current = next;
        }
        current
    }

    fn matches(&self, element: &Element, test: &str) -> bool {
        if test == "*" {
            return true;
        }
        match test.split_once(':') {
            Some((prefix, local)) => {
                if prefix != self.prefix {
                    debug!(prefix, "path uses an unregistered namespace prefix");
                    return false;
                }
                element.namespace() == Some(self.namespace)
                    && (local == "*" || element.local_name() == local)
            }
            None => element.namespace().is_none() && element.local_name() == test,
        }
    }
}

impl Document {
    /// Create a query view that resolves `prefix:` to `namespace`.
    #[must_use]
    pub fn xpath<'a>(&'a self, prefix: &'a str, namespace: &'a str) -> XPath<'a> {
        XPath::new(self, prefix, namespace)
    }
}

/// Split a relative path into steps; an empty segment marks a `//`.
fn parse_steps(path: &str, first_axis: Axis) -> Vec<Step<'_>> {
    let mut steps = Vec::new();
    let mut axis = first_axis;
    for segment in path.split('/') {
        if segment.is_empty() {
            axis = Axis::Descendant;
            continue;
        }
        steps.push(Step {
            axis,
            test: segment,
        });
        axis = Axis::Child;
    }
    steps
}
