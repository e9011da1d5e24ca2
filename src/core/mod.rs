/*
 * This module consolidates the core logic of the renaming tool: the token tree that
 * represents a file name, reconstruction of a proposed name from that tree, the transform
 * pipeline, the rename cache, the engine that ties these together, and the batch executor
 * that applies approved renames. It also holds configuration and directory listing.
 * Engine unit tests live in `engine_tests.rs`.
 */
pub mod batch_executor;
pub mod config;
pub mod engine;
pub mod file_listing;
pub mod reconstruct;
pub mod rename_cache;
pub mod rename_key;
pub mod token;
pub mod transform;


// Re-export the tree model
pub use token::{Direction, Token, TokenId, TokenTree};

pub use reconstruct::{BoundaryPolicy, ReconstructOptions, reconstruct_output};

pub use transform::{
    CaseChange, ChangeCaseTransform, ReplaceTextTransform, TokenTransform, TransformPipeline,
};

pub use rename_cache::{FileRenameInfo, RenameCache};
pub use rename_key::RenameKey;

pub use engine::{EditOutcome, EngineObserver, RenameEngine};

pub use batch_executor::{
    CoreFileRenamer, FileRenameOperations, RenameError, RenameOutcome, RenameStatus,
};

pub use config::{ConfigError, ConfigManagerOperations, CoreConfigManager, EngineConfig};

pub use file_listing::{FileListingError, list_candidate_files};
