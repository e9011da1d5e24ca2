/*
 * This module defines the token tree that represents one file name as a hierarchy of
 * fragments. A `TokenTree` is an arena owning every `Token` of one name; nodes refer to
 * each other through copyable `TokenId` handles. Each container owns its ordered children,
 * and every child keeps a non-owning handle to its parent.
 *
 * Split policy: separator characters are dropped, and runs of separators (or separators at
 * either end of the text) never produce empty fragments. Non-empty text without any
 * separator yields exactly one child carrying the whole text. Empty text yields no children.
 */

/*
 * Handle to a token inside a `TokenTree`. Slots of removed tokens are never reused, so a
 * handle that outlived its token simply resolves to nothing.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

/*
 * One fragment of a file name. A token with no children is a leaf and contributes its text
 * to reconstruction; a token with children contributes only what its children contribute.
 * The tree links (`parent`, `children`) can only be changed through `TokenTree`, which keeps
 * them consistent.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    text: String,
    separators: String,
    discard: bool,
    parent: Option<TokenId>,
    children: Vec<TokenId>,
}

impl Token {
    fn new(text: String, separators: String, parent: Option<TokenId>) -> Self {
        Token {
            text,
            separators,
            discard: false,
            parent,
            children: Vec::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn separators(&self) -> &str {
        &self.separators
    }

    pub fn is_discarded(&self) -> bool {
        self.discard
    }

    pub fn set_discard(&mut self, discard: bool) {
        self.discard = discard;
    }

    pub fn parent(&self) -> Option<TokenId> {
        self.parent
    }

    pub fn children(&self) -> &[TokenId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/*
 * Splits `text` into fragments at every character contained in `separators`.
 * An empty separator set leaves the text whole. Leading separators are dropped too, so
 * `.bashrc` yields the single fragment `bashrc`.
 */
pub fn split_fragments<'a>(text: &'a str, separators: &str) -> Vec<&'a str> {
    text.split(|c: char| separators.contains(c))
        .filter(|fragment| !fragment.is_empty())
        .collect()
}

#[derive(Debug, Clone)]
pub struct TokenTree {
    nodes: Vec<Option<Token>>,
    root: TokenId,
}

impl TokenTree {
    /*
     * Creates a tree holding only an unsplit root token. Call `split` on the root to
     * produce the first level of fragments.
     */
    pub fn new(text: &str, separators: &str) -> Self {
        TokenTree {
            nodes: vec![Some(Token::new(
                text.to_string(),
                separators.to_string(),
                None,
            ))],
            root: TokenId(0),
        }
    }

    pub fn root(&self) -> TokenId {
        self.root
    }

    pub fn get(&self, id: TokenId) -> Option<&Token> {
        self.nodes.get(id.0).and_then(|slot| slot.as_ref())
    }

    pub fn get_mut(&mut self, id: TokenId) -> Option<&mut Token> {
        self.nodes.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    pub fn contains(&self, id: TokenId) -> bool {
        self.get(id).is_some()
    }

    pub fn is_root(&self, id: TokenId) -> bool {
        id == self.root
    }

    /// Number of live tokens. Never zero, since the root cannot be removed.
    pub fn token_count(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    fn alloc(&mut self, token: Token) -> TokenId {
        self.nodes.push(Some(token));
        TokenId(self.nodes.len() - 1)
    }

    pub(crate) fn set_separators(&mut self, id: TokenId, separators: &str) {
        if let Some(token) = self.get_mut(id) {
            token.separators = separators.to_string();
        }
    }

    /*
     * Replaces the children of `id` with one leaf per fragment of its text. Previous
     * children (and any edits made to them) are dropped. Each new child inherits the
     * separators of the token being split. Returns false if `id` is not in the tree.
     */
    pub fn split(&mut self, id: TokenId) -> bool {
        let (text, separators) = match self.get(id) {
            Some(token) => (token.text.clone(), token.separators.clone()),
            None => return false,
        };
        self.clear_subtokens(id);

        let fragments: Vec<String> = split_fragments(&text, &separators)
            .into_iter()
            .map(str::to_string)
            .collect();
        log::trace!(
            "TokenTree: Splitting {text:?} on {separators:?} into {} fragment(s).",
            fragments.len()
        );
        for fragment in fragments {
            let child = self.alloc(Token::new(fragment, separators.clone(), Some(id)));
            if let Some(token) = self.get_mut(id) {
                token.children.push(child);
            }
        }
        true
    }

    /*
     * Inserts a new leaf holding `text` into the children of `parent` at `position`. The
     * position is clamped to the end of the child list. The new token inherits the
     * parent's separators.
     */
    pub fn add_subtoken(&mut self, parent: TokenId, text: &str, position: usize) -> Option<TokenId> {
        let separators = self.get(parent)?.separators.clone();
        let child = self.alloc(Token::new(text.to_string(), separators, Some(parent)));
        let token = self.get_mut(parent)?;
        let position = position.min(token.children.len());
        token.children.insert(position, child);
        Some(child)
    }

    /*
     * Moves `token` one step within the children of `parent`. Returns true only if the
     * order actually changed; a token already at the boundary stays where it is.
     */
    pub fn shift_subtoken(&mut self, parent: TokenId, token: TokenId, direction: Direction) -> bool {
        let Some(parent_token) = self.get_mut(parent) else {
            return false;
        };
        let Some(index) = parent_token.children.iter().position(|&c| c == token) else {
            return false;
        };
        let target = match direction {
            Direction::Left if index > 0 => index - 1,
            Direction::Right if index + 1 < parent_token.children.len() => index + 1,
            _ => return false,
        };
        parent_token.children.swap(index, target);
        true
    }

    /*
     * Drops every descendant of `id`, turning it back into a leaf. Its own text, discard
     * flag, separators and parent are kept.
     */
    pub fn clear_subtokens(&mut self, id: TokenId) {
        let children = match self.get_mut(id) {
            Some(token) => std::mem::take(&mut token.children),
            None => return,
        };
        for child in children {
            self.release(child);
        }
    }

    /*
     * Detaches a non-root token from its parent and drops it with its subtree.
     */
    pub fn remove_subtoken(&mut self, id: TokenId) -> bool {
        let Some(parent) = self.get(id).and_then(Token::parent) else {
            return false;
        };
        if let Some(parent_token) = self.get_mut(parent) {
            parent_token.children.retain(|&c| c != id);
        }
        self.release(id);
        true
    }

    fn release(&mut self, id: TokenId) {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(token) = self.nodes.get_mut(current.0).and_then(Option::take) {
                pending.extend(token.children);
            }
        }
    }

    /// Index of `id` among its parent's children, together with the parent.
    pub fn position_in_parent(&self, id: TokenId) -> Option<(TokenId, usize)> {
        let parent = self.get(id)?.parent?;
        let index = self.get(parent)?.children.iter().position(|&c| c == id)?;
        Some((parent, index))
    }

    /// Pre-order, depth-first listing of `from` and all its descendants.
    pub fn preorder(&self, from: TokenId) -> Vec<TokenId> {
        let mut order = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            let Some(token) = self.get(id) else {
                continue;
            };
            order.push(id);
            for &child in token.children.iter().rev() {
                stack.push(child);
            }
        }
        order
    }

    /// Leaves below `from` in pre-order.
    pub fn leaves(&self, from: TokenId) -> Vec<TokenId> {
        self.preorder(from)
            .into_iter()
            .filter(|&id| self.get(id).is_some_and(Token::is_leaf))
            .collect()
    }

    pub fn find_first_leaf(&self, from: TokenId, skip_discarded: bool) -> Option<TokenId> {
        self.leaves(from)
            .into_iter()
            .find(|&id| !skip_discarded || !self.is_discarded(id))
    }

    pub fn find_last_leaf(&self, from: TokenId, skip_discarded: bool) -> Option<TokenId> {
        self.leaves(from)
            .into_iter()
            .rev()
            .find(|&id| !skip_discarded || !self.is_discarded(id))
    }

    fn is_discarded(&self, id: TokenId) -> bool {
        self.get(id).is_some_and(Token::is_discarded)
    }

    /// Texts of all leaves of the whole tree, in order.
    pub fn leaf_texts(&self) -> Vec<&str> {
        self.leaves(self.root)
            .into_iter()
            .filter_map(|id| self.get(id).map(Token::text))
            .collect()
    }
}
