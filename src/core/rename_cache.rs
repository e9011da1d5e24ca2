/*
 * The rename cache owns one token tree per original file name together with the name last
 * reconstructed from that tree. It is the single owner of every tree; the engine only holds
 * the name of the entry it is currently editing.
 *
 * Entries are keyed by `RenameKey` and verified against the stored original name, so two
 * distinct names can never share rename state. Iteration follows insertion order.
 */
use super::rename_key::RenameKey;
use super::token::TokenTree;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

#[derive(Debug, Clone)]
pub struct FileRenameInfo {
    original_name: String,
    tree: TokenTree,
    rename_to: String,
    sequence: u64,
}

impl FileRenameInfo {
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn tree(&self) -> &TokenTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut TokenTree {
        &mut self.tree
    }

    /// Last reconstructed name. Stale after tree edits until reconstruction runs again.
    pub fn rename_to(&self) -> &str {
        &self.rename_to
    }

    pub fn set_rename_to(&mut self, rename_to: String) {
        self.rename_to = rename_to;
    }

    pub fn needs_rename(&self) -> bool {
        self.original_name != self.rename_to
    }
}

#[derive(Debug, Default)]
pub struct RenameCache {
    entries: HashMap<RenameKey, FileRenameInfo>,
    next_sequence: u64,
}

impl RenameCache {
    pub fn new() -> Self {
        RenameCache {
            entries: HashMap::new(),
            next_sequence: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        log::debug!("RenameCache: Clearing {} entries.", self.entries.len());
        self.entries.clear();
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.get(file_name).is_some()
    }

    pub fn get(&self, file_name: &str) -> Option<&FileRenameInfo> {
        let entry = self.entries.get(&RenameKey::from_name(file_name))?;
        if entry.original_name != file_name {
            log::error!(
                "RenameCache: Key collision between {file_name:?} and {:?}; treating as a miss.",
                entry.original_name
            );
            return None;
        }
        Some(entry)
    }

    pub fn get_mut(&mut self, file_name: &str) -> Option<&mut FileRenameInfo> {
        let entry = self.entries.get_mut(&RenameKey::from_name(file_name))?;
        if entry.original_name != file_name {
            log::error!(
                "RenameCache: Key collision between {file_name:?} and {:?}; treating as a miss.",
                entry.original_name
            );
            return None;
        }
        Some(entry)
    }

    /*
     * Stores a tree and its proposed name for `file_name`, replacing any previous entry for
     * the same name.
     */
    pub fn insert(&mut self, file_name: &str, tree: TokenTree, rename_to: String) -> &mut FileRenameInfo {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        log::trace!("RenameCache: Inserting {file_name:?} -> {rename_to:?}.");
        let entry = FileRenameInfo {
            original_name: file_name.to_string(),
            tree,
            rename_to,
            sequence,
        };
        match self.entries.entry(RenameKey::from_name(file_name)) {
            Entry::Occupied(mut occupied) => {
                occupied.insert(entry);
                occupied.into_mut()
            }
            Entry::Vacant(vacant) => vacant.insert(entry),
        }
    }

    pub fn remove(&mut self, file_name: &str) -> Option<FileRenameInfo> {
        self.get(file_name)?;
        self.entries.remove(&RenameKey::from_name(file_name))
    }

    /// Proposed name for `file_name`, without tokenizing anything.
    pub fn rename_to(&self, file_name: &str) -> Option<&str> {
        self.get(file_name).map(FileRenameInfo::rename_to)
    }

    pub fn has_files_to_rename(&self) -> bool {
        self.entries.values().any(FileRenameInfo::needs_rename)
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> Vec<&FileRenameInfo> {
        let mut entries: Vec<&FileRenameInfo> = self.entries.values().collect();
        entries.sort_by_key(|entry| entry.sequence);
        entries
    }

    /// (original, proposed) pairs in insertion order.
    pub fn proposals(&self) -> Vec<(String, String)> {
        self.entries()
            .into_iter()
            .map(|entry| (entry.original_name.clone(), entry.rename_to.clone()))
            .collect()
    }

    /*
     * Moves the entry for `old_name` under `new_name` after the file was renamed on disk.
     * The root token's text and the stored original name both become `new_name`; the
     * insertion position is kept. An unrelated entry already stored under `new_name` is
     * replaced.
     */
    pub fn rekey(&mut self, old_name: &str, new_name: &str) -> bool {
        let Some(mut entry) = self.remove(old_name) else {
            return false;
        };
        entry.original_name = new_name.to_string();
        let root = entry.tree.root();
        if let Some(token) = entry.tree.get_mut(root) {
            token.set_text(new_name);
        }
        if let Some(replaced) = self.entries.insert(RenameKey::from_name(new_name), entry) {
            log::warn!(
                "RenameCache: Entry for {:?} was replaced by renamed {old_name:?}.",
                replaced.original_name
            );
        }
        true
    }
}
