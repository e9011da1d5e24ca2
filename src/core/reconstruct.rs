/*
 * Rebuilds a proposed file name from a token tree. Leaves are joined in tree order: the
 * first leaf gets no separator, the last leaf is joined with "." (the extension), and
 * every other leaf is joined with a single space. Discarded leaves contribute nothing.
 * Containers contribute only the concatenation of their children.
 *
 * Which leaves count as "first" and "last" is decided against the whole tree, never
 * against local siblings, according to the configured `BoundaryPolicy`.
 */
use super::token::{Token, TokenId, TokenTree};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BoundaryPolicy {
    /// First and last are taken over every leaf, discarded or not.
    #[default]
    AllLeaves,
    /// First and last are taken over the leaves that are not discarded.
    VisibleLeaves,
}

impl BoundaryPolicy {
    fn skips_discarded(self) -> bool {
        matches!(self, BoundaryPolicy::VisibleLeaves)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconstructOptions {
    pub boundary_policy: BoundaryPolicy,
    pub lowercase_extension: bool,
}

struct Boundaries {
    first: Option<TokenId>,
    last: Option<TokenId>,
}

/// Proposed name for the whole tree.
pub fn reconstruct_output(tree: &TokenTree, options: &ReconstructOptions) -> String {
    reconstruct_token(tree, tree.root(), options)
}

/*
 * Output contributed by the subtree rooted at `id`. Boundaries are still resolved against
 * the master root of `tree`. An id that is not part of the tree contributes nothing.
 */
pub fn reconstruct_token(tree: &TokenTree, id: TokenId, options: &ReconstructOptions) -> String {
    let skip = options.boundary_policy.skips_discarded();
    let boundaries = Boundaries {
        first: tree.find_first_leaf(tree.root(), skip),
        last: tree.find_last_leaf(tree.root(), skip),
    };
    let mut name = String::new();
    append_token(tree, id, &boundaries, options, &mut name);
    name
}

fn append_token(
    tree: &TokenTree,
    id: TokenId,
    boundaries: &Boundaries,
    options: &ReconstructOptions,
    name: &mut String,
) {
    let Some(token) = tree.get(id) else {
        return;
    };
    if !token.is_leaf() {
        for &child in token.children() {
            append_token(tree, child, boundaries, options, name);
        }
        return;
    }
    if token.is_discarded() {
        return;
    }

    let is_first = boundaries.first == Some(id);
    let is_last = boundaries.last == Some(id);
    if is_first {
        name.push_str(token.text());
    } else if is_last {
        name.push('.');
        name.push_str(&extension_text(token, options));
    } else {
        name.push(' ');
        name.push_str(token.text());
    }
}

fn extension_text(token: &Token, options: &ReconstructOptions) -> String {
    if options.lowercase_extension {
        token.text().to_lowercase()
    } else {
        token.text().to_string()
    }
}
