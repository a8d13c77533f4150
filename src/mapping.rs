//! View→model position resolution.
//!
//! Cursor positions arrive in view coordinates. Most resolve structurally,
//! but widgets need special handling: a position inside a widget must land
//! on a model position outside it. Rather than an ambient event
//! subscription, resolution is an explicit ordered chain of strategies
//! (predicate + resolver pairs); the first strategy whose predicate matches
//! the containing element wins, and precedence is registration order.

use crate::view::{ViewElement, ViewNode};

/// A position in the view tree.
///
/// `path` holds the child indices of the elements descended into, starting
/// from the root sequence; `offset` is the position inside the innermost
/// node. An empty path addresses the root sequence directly, where offsets
/// count one unit per text character and one per element, matching model
/// offset space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewPosition {
    /// Child indices from the root to the containing element.
    pub path: Vec<usize>,
    /// Offset inside the innermost node.
    pub offset: usize,
}

impl ViewPosition {
    /// A position in the root sequence.
    pub const fn at_root(offset: usize) -> Self {
        Self {
            path: Vec::new(),
            offset,
        }
    }

    /// A position inside the root child at `index`.
    pub fn inside(index: usize, offset: usize) -> Self {
        Self {
            path: vec![index],
            offset,
        }
    }
}

/// What a strategy resolver gets to work with: the matched element's
/// location in model offset space and the view offset inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingContext {
    /// Model offset immediately before the element.
    pub element_start: usize,
    /// Model offset immediately after the element.
    pub element_end: usize,
    /// View offset inside the element.
    pub inner_offset: usize,
}

type Predicate = Box<dyn Fn(&ViewElement) -> bool>;
type Resolver = Box<dyn Fn(&MappingContext) -> usize>;

/// One position-resolution strategy: a predicate over view elements plus a
/// resolver producing the model offset.
pub struct Strategy {
    matches: Predicate,
    resolve: Resolver,
}

impl std::fmt::Debug for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Strategy { .. }")
    }
}

impl Strategy {
    /// Build a strategy from a predicate and a resolver.
    pub fn new(
        matches: impl Fn(&ViewElement) -> bool + 'static,
        resolve: impl Fn(&MappingContext) -> usize + 'static,
    ) -> Self {
        Self {
            matches: Box::new(matches),
            resolve: Box::new(resolve),
        }
    }

    /// The standard widget strategy: positions inside a matched element
    /// resolve to just outside it — before the element when the inner
    /// offset is 0, after it otherwise.
    pub fn outside_element(matches: impl Fn(&ViewElement) -> bool + 'static) -> Self {
        Self::new(matches, |ctx| {
            if ctx.inner_offset == 0 {
                ctx.element_start
            } else {
                ctx.element_end
            }
        })
    }
}

/// Ordered chain of [`Strategy`] values with a structural fallback.
#[derive(Debug, Default)]
pub struct MappingChain {
    strategies: Vec<Strategy>,
}

impl MappingChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a strategy. Earlier strategies take precedence.
    pub fn push(&mut self, strategy: Strategy) {
        self.strategies.push(strategy);
    }

    /// Number of registered strategies.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Whether no strategies are registered.
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Resolve a view position against a view tree, returning a model
    /// offset.
    ///
    /// Root-level positions map structurally (identical offset spaces).
    /// Positions inside an element are offered to the strategies in order;
    /// if none claims the element, the position snaps to the element start.
    pub fn view_to_model_position(&self, view: &[ViewNode], position: &ViewPosition) -> usize {
        let total: usize = view.iter().map(flat_width).sum();
        let Some(&child_index) = position.path.first() else {
            return position.offset.min(total);
        };
        let Some(node) = view.get(child_index) else {
            return total;
        };
        let element_start: usize = view[..child_index].iter().map(flat_width).sum();

        let ViewNode::Element(element) = node else {
            // A path into a text node addresses its characters directly.
            return (element_start + position.offset).min(total);
        };

        let context = MappingContext {
            element_start,
            element_end: element_start + 1,
            // Descent deeper than the element itself counts as "inside".
            inner_offset: if position.path.len() == 1 {
                position.offset
            } else {
                position.offset.max(1)
            },
        };
        for strategy in &self.strategies {
            if (strategy.matches)(element) {
                return (strategy.resolve)(&context);
            }
        }
        element_start
    }
}

fn flat_width(node: &ViewNode) -> usize {
    match node {
        ViewNode::Text(text) => text.chars().count(),
        ViewNode::Element(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::ViewWriter;

    fn sample_view() -> Vec<ViewNode> {
        // "ab" + <badge>{{X}}</badge> + "cd"  → widths 2, 1, 2
        let writer = ViewWriter;
        let mut badge = writer.create_container_element("badge");
        writer.insert(&mut badge, 0, writer.create_text("{{X}}"));
        vec![
            writer.create_text("ab"),
            ViewNode::Element(badge),
            writer.create_text("cd"),
        ]
    }

    #[test]
    fn test_root_position_is_structural() {
        let chain = MappingChain::new();
        let view = sample_view();
        assert_eq!(chain.view_to_model_position(&view, &ViewPosition::at_root(0)), 0);
        assert_eq!(chain.view_to_model_position(&view, &ViewPosition::at_root(4)), 4);
    }

    #[test]
    fn test_root_position_clamped_to_width() {
        let chain = MappingChain::new();
        let view = sample_view();
        assert_eq!(chain.view_to_model_position(&view, &ViewPosition::at_root(99)), 5);
    }

    #[test]
    fn test_position_in_text_child_maps_through() {
        let chain = MappingChain::new();
        let view = sample_view();
        // Offset 1 inside the trailing "cd" run → model offset 4.
        assert_eq!(
            chain.view_to_model_position(&view, &ViewPosition::inside(2, 1)),
            4
        );
    }

    #[test]
    fn test_outside_element_maps_before_and_after() {
        let mut chain = MappingChain::new();
        chain.push(Strategy::outside_element(|el| el.name() == "badge"));
        let view = sample_view();
        assert_eq!(
            chain.view_to_model_position(&view, &ViewPosition::inside(1, 0)),
            2
        );
        for offset in 1..=5 {
            assert_eq!(
                chain.view_to_model_position(&view, &ViewPosition::inside(1, offset)),
                3,
                "inner offset {offset} should resolve after the widget"
            );
        }
    }

    #[test]
    fn test_deep_descent_counts_as_inside() {
        let mut chain = MappingChain::new();
        chain.push(Strategy::outside_element(|el| el.name() == "badge"));
        let view = sample_view();
        let position = ViewPosition {
            path: vec![1, 0],
            offset: 0,
        };
        assert_eq!(chain.view_to_model_position(&view, &position), 3);
    }

    #[test]
    fn test_unmatched_element_snaps_to_start() {
        let chain = MappingChain::new();
        let view = sample_view();
        assert_eq!(
            chain.view_to_model_position(&view, &ViewPosition::inside(1, 3)),
            2
        );
    }

    #[test]
    fn test_first_matching_strategy_wins() {
        let mut chain = MappingChain::new();
        chain.push(Strategy::new(|el| el.name() == "badge", |ctx| ctx.element_end));
        chain.push(Strategy::new(|el| el.name() == "badge", |_| 0));
        let view = sample_view();
        assert_eq!(
            chain.view_to_model_position(&view, &ViewPosition::inside(1, 0)),
            3
        );
    }
}
