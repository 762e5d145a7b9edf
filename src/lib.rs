//! # titledrop
//!
//! A watched-folder PDF titling pipeline. PDFs dropped into an input
//! directory get their text extracted (embedded text layer first, OCR as the
//! fallback for scans), a title proposed by a chat-completion model, and are
//! then filed into an output directory as `YYYYMMDD-Sanitized_Title.pdf`.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────┐   ┌───────────┐   ┌────────────┐
//! │ input dir │──▶│ text layer   │──▶│ title     │──▶│ output dir │
//! │ (*.pdf)   │   │ → OCR        │   │ model     │   │ DATE-TITLE │
//! └───────────┘   │ fallback     │   │ +sanitize │   │ .pdf       │
//!                 └──────────────┘   └───────────┘   └────────────┘
//! ```
//!
//! Processing is synchronous and sequential: one document is fully handled
//! before the next begins, and a failure in one document never touches the
//! others — the file stays in the input directory and is retried on a later
//! pass, up to a bounded number of attempts.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`scan`] | Input directory discovery |
//! | [`extract`] | Text-layer extraction and the OCR-fallback coordinator |
//! | [`ocr`] | Rasterizing OCR (poppler + tesseract) |
//! | [`infer`] | Title inference via a chat-completion service |
//! | [`sanitize`] | Filesystem-safe title tokens |
//! | [`rename`] | Output filename composition and the final move |
//! | [`pipeline`] | Per-document orchestration and retry bookkeeping |
//! | [`check`] | Configuration and collaborator health checks |

pub mod check;
pub mod config;
pub mod extract;
pub mod infer;
pub mod ocr;
pub mod pipeline;
pub mod rename;
pub mod sanitize;
pub mod scan;
