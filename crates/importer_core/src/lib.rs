//! Importer core: pure listing, naming and message logic.
mod commit;
mod extraction;
mod listing;
mod manifest;
mod resolve;
mod version;

pub use commit::{compose_message, format_listing, summary_line, ArchiveDigests, StagedFile};
pub use extraction::ExtractionDecision;
pub use listing::{
    decode_url_component, files_only, parse_file_index, EntryKind, ListingEntry, ResolvedFile,
};
pub use manifest::{patch_manifest_version, ManifestPatchError};
pub use resolve::{file_by_index, file_by_name};
pub use version::{VersionExtractor, VersionFormatError, VersionInfo};
