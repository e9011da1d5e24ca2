/*
 * This module defines the transform pipeline: an ordered list of pluggable, individually
 * enabled operations that edit tokens in place. A transform only ever sees one `Token` at a
 * time and can change its text or discard flag; the tree links are not reachable through
 * `Token`, so a transform cannot restructure the tree.
 *
 * Whether a transform is idempotent is up to the transform. Disabled transforms are skipped
 * without being called.
 */
use super::token::{Token, TokenId, TokenTree};

pub trait TokenTransform: Send + Sync {
    fn name(&self) -> &str;
    fn is_enabled(&self) -> bool;
    fn set_enabled(&mut self, enabled: bool);
    fn apply(&self, token: &mut Token);
}

#[derive(Default)]
pub struct TransformPipeline {
    transforms: Vec<Box<dyn TokenTransform>>,
}

impl TransformPipeline {
    pub fn new() -> Self {
        TransformPipeline {
            transforms: Vec::new(),
        }
    }

    pub fn add(&mut self, transform: Box<dyn TokenTransform>) {
        log::debug!("TransformPipeline: Adding transform '{}'.", transform.name());
        self.transforms.push(transform);
    }

    /// Returns false if there is no transform at `index`.
    pub fn set_enabled(&mut self, index: usize, enabled: bool) -> bool {
        match self.transforms.get_mut(index) {
            Some(transform) => {
                transform.set_enabled(enabled);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.transforms.clear();
    }

    pub fn transforms(&self) -> &[Box<dyn TokenTransform>] {
        &self.transforms
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /*
     * Applies every enabled transform, in order, to `id` and then to each of its
     * descendants (pre-order, depth-first).
     */
    pub fn apply_to_token(&self, tree: &mut TokenTree, id: TokenId) {
        for current in tree.preorder(id) {
            if let Some(token) = tree.get_mut(current) {
                self.apply_to_single(token);
            }
        }
    }

    fn apply_to_single(&self, token: &mut Token) {
        for transform in self.transforms.iter().filter(|t| t.is_enabled()) {
            transform.apply(token);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseChange {
    Upper,
    Lower,
    /// Uppercases the first character and lowercases the rest.
    CapitalizeFirst,
}

pub struct ChangeCaseTransform {
    mode: CaseChange,
    enabled: bool,
}

impl ChangeCaseTransform {
    pub fn new(mode: CaseChange) -> Self {
        ChangeCaseTransform {
            mode,
            enabled: true,
        }
    }

    pub fn change_case(text: &str, mode: CaseChange) -> String {
        match mode {
            CaseChange::Upper => text.to_uppercase(),
            CaseChange::Lower => text.to_lowercase(),
            CaseChange::CapitalizeFirst => {
                let mut chars = text.chars();
                match chars.next() {
                    Some(first) => first
                        .to_uppercase()
                        .chain(chars.flat_map(char::to_lowercase))
                        .collect(),
                    None => String::new(),
                }
            }
        }
    }
}

impl TokenTransform for ChangeCaseTransform {
    fn name(&self) -> &str {
        match self.mode {
            CaseChange::Upper => "Upper case",
            CaseChange::Lower => "Lower case",
            CaseChange::CapitalizeFirst => "Capitalize",
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn apply(&self, token: &mut Token) {
        let changed = Self::change_case(token.text(), self.mode);
        token.set_text(changed);
    }
}

/*
 * Literal find/replace on token text. With `discard_if_empty`, a token whose text ends up
 * empty after replacement is marked discarded.
 */
pub struct ReplaceTextTransform {
    find: String,
    replace: String,
    discard_if_empty: bool,
    enabled: bool,
}

impl ReplaceTextTransform {
    pub fn new(find: &str, replace: &str) -> Self {
        ReplaceTextTransform {
            find: find.to_string(),
            replace: replace.to_string(),
            discard_if_empty: false,
            enabled: true,
        }
    }

    pub fn discarding_empty(mut self) -> Self {
        self.discard_if_empty = true;
        self
    }
}

impl TokenTransform for ReplaceTextTransform {
    fn name(&self) -> &str {
        "Replace text"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn apply(&self, token: &mut Token) {
        if self.find.is_empty() || !token.text().contains(&self.find) {
            return;
        }
        let replaced = token.text().replace(&self.find, &self.replace);
        if self.discard_if_empty && replaced.is_empty() {
            token.set_discard(true);
        }
        token.set_text(replaced);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTransform {
        calls: Arc<AtomicUsize>,
        enabled: bool,
    }

    impl TokenTransform for CountingTransform {
        fn name(&self) -> &str {
            "Counting"
        }
        fn is_enabled(&self) -> bool {
            self.enabled
        }
        fn set_enabled(&mut self, enabled: bool) {
            self.enabled = enabled;
        }
        fn apply(&self, _token: &mut Token) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Appends a marker so the order of application shows up in the text.
    struct SuffixTransform(&'static str);

    impl TokenTransform for SuffixTransform {
        fn name(&self) -> &str {
            self.0
        }
        fn is_enabled(&self) -> bool {
            true
        }
        fn set_enabled(&mut self, _enabled: bool) {}
        fn apply(&self, token: &mut Token) {
            let text = format!("{}{}", token.text(), self.0);
            token.set_text(text);
        }
    }

    fn split_tree(text: &str, separators: &str) -> TokenTree {
        let mut tree = TokenTree::new(text, separators);
        let root = tree.root();
        tree.split(root);
        tree
    }

    #[test]
    fn test_pipeline_visits_every_token_preorder() {
        // Arrange
        let calls = Arc::new(AtomicUsize::new(0));
        let mut pipeline = TransformPipeline::new();
        pipeline.add(Box::new(CountingTransform {
            calls: Arc::clone(&calls),
            enabled: true,
        }));
        let mut tree = split_tree("a b c", " ");
        let root = tree.root();

        // Act
        pipeline.apply_to_token(&mut tree, root);

        // Assert
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_pipeline_skips_disabled_transforms() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut pipeline = TransformPipeline::new();
        pipeline.add(Box::new(CountingTransform {
            calls: Arc::clone(&calls),
            enabled: true,
        }));
        assert!(pipeline.set_enabled(0, false));
        assert!(!pipeline.set_enabled(5, false));

        let mut tree = split_tree("a b", " ");
        let root = tree.root();
        pipeline.apply_to_token(&mut tree, root);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_pipeline_applies_in_order() {
        let mut pipeline = TransformPipeline::new();
        pipeline.add(Box::new(SuffixTransform("1")));
        pipeline.add(Box::new(SuffixTransform("2")));
        let mut tree = split_tree("a", " ");
        let root = tree.root();
        pipeline.apply_to_token(&mut tree, root);
        assert_eq!(tree.leaf_texts(), vec!["a12"]);
        assert_eq!(tree.get(root).unwrap().text(), "a12");
    }

    #[test]
    fn test_pipeline_does_not_change_structure() {
        let mut pipeline = TransformPipeline::new();
        pipeline.add(Box::new(ChangeCaseTransform::new(CaseChange::Upper)));
        let mut tree = split_tree("my file.txt", " .");
        let root = tree.root();
        let before: Vec<TokenId> = tree.preorder(root);

        pipeline.apply_to_token(&mut tree, root);

        assert_eq!(tree.preorder(root), before);
        assert_eq!(tree.leaf_texts(), vec!["MY", "FILE", "TXT"]);
    }

    #[test]
    fn test_change_case_modes() {
        assert_eq!(ChangeCaseTransform::change_case("hELLO", CaseChange::Upper), "HELLO");
        assert_eq!(ChangeCaseTransform::change_case("hELLO", CaseChange::Lower), "hello");
        assert_eq!(
            ChangeCaseTransform::change_case("hELLO", CaseChange::CapitalizeFirst),
            "Hello"
        );
        assert_eq!(ChangeCaseTransform::change_case("", CaseChange::CapitalizeFirst), "");
    }

    #[test]
    fn test_replace_text_can_discard_emptied_tokens() {
        let mut pipeline = TransformPipeline::new();
        pipeline.add(Box::new(ReplaceTextTransform::new("copy", "").discarding_empty()));
        let mut tree = split_tree("photo copy.png", " .");
        let root = tree.root();

        pipeline.apply_to_token(&mut tree, root);

        let copy = tree.get(root).unwrap().children()[1];
        assert!(tree.get(copy).unwrap().is_discarded());
        assert_eq!(tree.get(root).unwrap().text(), "photo .png");
        assert!(!tree.get(root).unwrap().is_discarded());
    }
}
