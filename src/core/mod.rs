// ─── Updater Core ───
// Self-updater for mod distributions: works out what is installed, fetches the
// expected file list and downloads whatever is missing or stale.
//
// Architecture:
//   core/
//     config/     — Profiles (DMP, KMP), updater.json, CLI overrides
//     mode        — Channel + role resolution
//     manifest/   — Channel index, manifest fetch + `path=hash` parsing
//     downloader/ — SHA-256 validated object downloads
//     sync/       — Reconciler (manifest diff + directory materialization)
//     pipeline    — Stage sequencing and the per-run context
//     error, http — Shared error type and HTTP client

pub mod config;
pub mod downloader;
pub mod error;
pub mod http;
pub mod manifest;
pub mod mode;
pub mod pipeline;
pub mod sync;
