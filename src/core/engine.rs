/*
 * This module provides `RenameEngine`, which orchestrates one editing session: it selects
 * the file whose token tree is being edited, exposes tree-editing operations on the
 * selected token, runs the transform pipeline, keeps the proposed name up to date and
 * notifies registered observers.
 *
 * The engine never owns a token tree. Trees live in the `RenameCache`; the engine only
 * remembers which entry is active (by its original name) and which token in it is selected.
 * Editing operations report what happened through `EditOutcome` instead of failing, so a UI
 * can call them opportunistically.
 */
use super::batch_executor::{self, CoreFileRenamer, FileRenameOperations, RenameOutcome};
use super::config::EngineConfig;
use super::reconstruct::reconstruct_output;
use super::rename_cache::{FileRenameInfo, RenameCache};
use super::token::{Direction, TokenId, TokenTree};
use super::transform::{CaseChange, ChangeCaseTransform, TokenTransform, TransformPipeline};
use std::path::Path;

/*
 * Receives a notification whenever the engine's selection changes. Observers must not
 * assume any ordering relative to other observers, and must not edit the engine from
 * inside `notify`.
 */
pub trait EngineObserver: Send + Sync {
    fn notify(&self);
}

#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    /// The operation was valid but had nothing to change.
    Unchanged,
    /// No file is active, or no token is selected.
    NoSelection,
    /// The token is not part of the active tree, or the operation does not apply to it.
    InvalidTarget,
}

pub struct RenameEngine {
    config: EngineConfig,
    cache: RenameCache,
    active_file: Option<String>,
    selected: Option<TokenId>,
    transforms: TransformPipeline,
    observers: Vec<Box<dyn EngineObserver>>,
    file_ops: Box<dyn FileRenameOperations>,
}

impl RenameEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_file_operations(config, Box::new(CoreFileRenamer::new()))
    }

    pub fn with_file_operations(
        config: EngineConfig,
        file_ops: Box<dyn FileRenameOperations>,
    ) -> Self {
        log::debug!(
            "RenameEngine: Created with default separators {:?}.",
            config.default_separators
        );
        RenameEngine {
            config,
            cache: RenameCache::new(),
            active_file: None,
            selected: None,
            transforms: TransformPipeline::new(),
            observers: Vec::new(),
            file_ops,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Applies to files tokenized from now on; cached trees are left as they are.
    pub fn set_default_separators(&mut self, separators: &str) {
        self.config.default_separators = separators.to_string();
    }

    pub fn cache(&self) -> &RenameCache {
        &self.cache
    }

    pub fn active_file(&self) -> Option<&str> {
        self.active_file.as_deref()
    }

    fn active_entry(&self) -> Option<&FileRenameInfo> {
        self.cache.get(self.active_file.as_deref()?)
    }

    fn active_entry_mut(&mut self) -> Option<&mut FileRenameInfo> {
        self.cache.get_mut(self.active_file.as_deref()?)
    }

    pub fn active_tree(&self) -> Option<&TokenTree> {
        self.active_entry().map(FileRenameInfo::tree)
    }

    pub fn active_root(&self) -> Option<TokenId> {
        self.active_tree().map(TokenTree::root)
    }

    pub fn selected_subtoken(&self) -> Option<TokenId> {
        self.selected
    }

    pub fn is_token_current_root(&self, token: TokenId) -> bool {
        self.active_root() == Some(token)
    }

    /// Proposed name of the active file, as last reconstructed. Empty when nothing is active.
    pub fn rename_to(&self) -> &str {
        self.active_entry().map_or("", FileRenameInfo::rename_to)
    }

    fn tokenize(&self, file_name: &str) -> TokenTree {
        let separators = &self.config.default_separators;
        let mut tree = TokenTree::new(file_name, separators);
        let root = tree.root();

        let cleaned = self.config.remove_strings(file_name);
        if cleaned != file_name {
            log::debug!("RenameEngine: Tokenizing cleaned name {cleaned:?} for {file_name:?}.");
            if let Some(sub) = tree.add_subtoken(root, &cleaned, 0) {
                tree.split(sub);
            }
        } else {
            tree.split(root);
        }
        tree
    }

    /*
     * Makes `file_name` the active file. A cached tree is reused as is; otherwise the name
     * is tokenized with the default separators, its proposed name is reconstructed and a
     * new cache entry is stored. The root becomes the selected token. An empty name clears
     * the active file and selection.
     */
    pub fn select_file(&mut self, file_name: &str) {
        if file_name.is_empty() {
            log::trace!("RenameEngine: Deselecting active file.");
            self.active_file = None;
            self.selected = None;
            return;
        }

        if !self.cache.contains(file_name) {
            let tree = self.tokenize(file_name);
            let rename_to = reconstruct_output(&tree, &self.config.reconstruct_options());
            log::debug!("RenameEngine: Tokenized {file_name:?}, proposing {rename_to:?}.");
            self.cache.insert(file_name, tree, rename_to);
        }

        self.active_file = Some(file_name.to_string());
        self.selected = self.active_root();
    }

    /*
     * Selects `token` within the active tree, optionally reconstructs the proposed name,
     * and then notifies every observer.
     */
    pub fn select_subtoken(&mut self, token: TokenId, update_output: bool) -> EditOutcome {
        let Some(tree) = self.active_tree() else {
            return EditOutcome::NoSelection;
        };
        if !tree.contains(token) {
            return EditOutcome::InvalidTarget;
        }

        self.selected = Some(token);
        if update_output {
            self.refresh_rename_to();
        }
        self.notify_observers();
        EditOutcome::Applied
    }

    /*
     * Edits `token` in the active tree. A change of text or separators (or `force`) drops
     * the token's children, stores the new values and splits it again. Otherwise only the
     * discard flag is updated. The root's discard flag is never changed here.
     * The proposed name is not refreshed.
     */
    pub fn update_token(
        &mut self,
        token: TokenId,
        text: &str,
        separators: &str,
        discard: bool,
        force: bool,
    ) -> EditOutcome {
        let Some(entry) = self.active_entry_mut() else {
            return EditOutcome::NoSelection;
        };
        let tree = entry.tree_mut();
        let is_root = tree.is_root(token);
        let Some(current) = tree.get(token) else {
            return EditOutcome::InvalidTarget;
        };

        if current.text() != text || current.separators() != separators || force {
            tree.clear_subtokens(token);
            tree.set_separators(token, separators);
            if let Some(current) = tree.get_mut(token) {
                current.set_text(text);
                if !is_root {
                    current.set_discard(discard);
                }
            }
            tree.split(token);
            EditOutcome::Applied
        } else if current.is_discarded() != discard && !is_root {
            if let Some(current) = tree.get_mut(token) {
                current.set_discard(discard);
            }
            EditOutcome::Applied
        } else {
            EditOutcome::Unchanged
        }
    }

    /// `update_token` on the selected token, followed by a refresh of the proposed name.
    pub fn update_selected_subtoken(
        &mut self,
        text: &str,
        separators: &str,
        discard: bool,
        force: bool,
    ) -> EditOutcome {
        let Some(selected) = self.selected else {
            return EditOutcome::NoSelection;
        };
        let outcome = self.update_token(selected, text, separators, discard, force);
        if outcome == EditOutcome::Applied {
            self.refresh_rename_to();
        }
        outcome
    }

    pub fn shift_selected_subtoken(&mut self, direction: Direction) -> EditOutcome {
        let Some(selected) = self.selected else {
            return EditOutcome::NoSelection;
        };
        let Some(tree) = self.active_entry_mut().map(FileRenameInfo::tree_mut) else {
            return EditOutcome::NoSelection;
        };
        let Some((parent, _)) = tree.position_in_parent(selected) else {
            return EditOutcome::InvalidTarget;
        };

        let moved = tree.shift_subtoken(parent, selected, direction);
        self.refresh_rename_to();
        if moved {
            EditOutcome::Applied
        } else {
            EditOutcome::Unchanged
        }
    }

    /*
     * Inserts a new leaf holding `text` next to the selected token, before it for
     * `Direction::Left` and after it for `Direction::Right`. The root has no siblings, so
     * nothing can be inserted next to it.
     */
    pub fn insert_text(&mut self, text: &str, direction: Direction) -> EditOutcome {
        let Some(selected) = self.selected else {
            return EditOutcome::NoSelection;
        };
        let Some(tree) = self.active_entry_mut().map(FileRenameInfo::tree_mut) else {
            return EditOutcome::NoSelection;
        };
        let Some((parent, index)) = tree.position_in_parent(selected) else {
            return EditOutcome::InvalidTarget;
        };

        let position = match direction {
            Direction::Left => index,
            Direction::Right => index + 1,
        };
        tree.add_subtoken(parent, text, position);
        self.refresh_rename_to();
        EditOutcome::Applied
    }

    /// Drops the selected token and its subtree; its parent becomes the selection.
    pub fn remove_selected_subtoken(&mut self) -> EditOutcome {
        let Some(selected) = self.selected else {
            return EditOutcome::NoSelection;
        };
        let Some(tree) = self.active_entry_mut().map(FileRenameInfo::tree_mut) else {
            return EditOutcome::NoSelection;
        };
        let Some((parent, _)) = tree.position_in_parent(selected) else {
            return EditOutcome::InvalidTarget;
        };

        tree.remove_subtoken(selected);
        self.selected = Some(parent);
        self.refresh_rename_to();
        self.notify_observers();
        EditOutcome::Applied
    }

    /// One-off case change of the selected token, and of its subtree when `recursive`.
    pub fn change_case(&mut self, mode: CaseChange, recursive: bool) -> EditOutcome {
        let Some(selected) = self.selected else {
            return EditOutcome::NoSelection;
        };
        let Some(tree) = self.active_entry_mut().map(FileRenameInfo::tree_mut) else {
            return EditOutcome::NoSelection;
        };
        if !tree.contains(selected) {
            return EditOutcome::InvalidTarget;
        }

        let targets = if recursive {
            tree.preorder(selected)
        } else {
            vec![selected]
        };
        let transform = ChangeCaseTransform::new(mode);
        for id in targets {
            if let Some(token) = tree.get_mut(id) {
                transform.apply(token);
            }
        }
        self.refresh_rename_to();
        EditOutcome::Applied
    }

    pub fn add_transform(&mut self, transform: Box<dyn TokenTransform>) {
        self.transforms.add(transform);
    }

    pub fn set_transform_enabled(&mut self, index: usize, enabled: bool) -> bool {
        self.transforms.set_enabled(index, enabled)
    }

    pub fn transforms(&self) -> &[Box<dyn TokenTransform>] {
        self.transforms.transforms()
    }

    pub fn clear_transforms(&mut self) {
        self.transforms.clear();
    }

    /*
     * Runs the transform pipeline over `token` and its descendants in the active tree.
     * The proposed name is not refreshed.
     */
    pub fn apply_transforms_to_token(&mut self, token: TokenId) -> EditOutcome {
        let Some(name) = self.active_file.as_deref() else {
            return EditOutcome::NoSelection;
        };
        let Some(entry) = self.cache.get_mut(name) else {
            return EditOutcome::NoSelection;
        };
        if !entry.tree().contains(token) {
            return EditOutcome::InvalidTarget;
        }
        self.transforms.apply_to_token(entry.tree_mut(), token);
        EditOutcome::Applied
    }

    /// Runs the pipeline over the whole active tree and refreshes the proposed name.
    pub fn apply_transforms_to_active(&mut self) -> EditOutcome {
        if !self.config.apply_transforms || self.transforms.is_empty() {
            return EditOutcome::Unchanged;
        }
        let Some(root) = self.active_root() else {
            return EditOutcome::NoSelection;
        };
        let outcome = self.apply_transforms_to_token(root);
        if outcome == EditOutcome::Applied {
            self.refresh_rename_to();
        }
        outcome
    }

    /// Output of the active tree as it stands now; empty when no file is active.
    pub fn reconstruct_output(&self) -> String {
        self.active_tree()
            .map(|tree| reconstruct_output(tree, &self.config.reconstruct_options()))
            .unwrap_or_default()
    }

    fn refresh_rename_to(&mut self) {
        let rename_to = self.reconstruct_output();
        if let Some(entry) = self.active_entry_mut() {
            log::trace!(
                "RenameEngine: Proposed name for {:?} is now {rename_to:?}.",
                entry.original_name()
            );
            entry.set_rename_to(rename_to);
        }
    }

    /// Cached proposed name for `file_name`; never tokenizes.
    pub fn rename_to_for(&self, file_name: &str) -> Option<&str> {
        self.cache.rename_to(file_name)
    }

    pub fn has_rename_to(&self, file_name: &str) -> bool {
        self.cache.contains(file_name)
    }

    pub fn has_files_to_rename(&self) -> bool {
        self.cache.has_files_to_rename()
    }

    /// Drops every cached tree. The active file goes with them.
    pub fn clear_files_map(&mut self) {
        self.cache.clear();
        self.active_file = None;
        self.selected = None;
    }

    pub fn add_observer(&mut self, observer: Box<dyn EngineObserver>) {
        self.observers.push(observer);
    }

    pub fn clear_observers(&mut self) {
        self.observers.clear();
    }

    fn notify_observers(&self) {
        for observer in &self.observers {
            observer.notify();
        }
    }

    pub fn rename_one(
        &mut self,
        directory: &Path,
        source: &str,
        destination: &str,
        update_cache_entry: bool,
    ) -> batch_executor::Result<()> {
        batch_executor::rename_one(
            self.file_ops.as_ref(),
            &mut self.cache,
            directory,
            source,
            destination,
            update_cache_entry,
        )?;
        if update_cache_entry {
            self.follow_rename(source, destination);
        }
        Ok(())
    }

    pub fn rename_all(&mut self, directory: &Path) -> Vec<RenameOutcome> {
        let outcomes =
            batch_executor::rename_all(self.file_ops.as_ref(), &mut self.cache, directory);
        for outcome in outcomes.iter().filter(|o| o.is_renamed()) {
            self.follow_rename(&outcome.source, &outcome.destination);
        }
        outcomes
    }

    /// Keeps the active file pointing at its cache entry after the entry was re-keyed.
    fn follow_rename(&mut self, source: &str, destination: &str) {
        if self.active_file.as_deref() == Some(source) {
            self.active_file = Some(destination.to_string());
        }
    }
}
