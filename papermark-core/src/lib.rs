//! Papermark Core - PDF question-bank annotation engine
//!
//! This crate provides the data model and logic behind the Papermark
//! annotation tool: classified rectangular regions on PDF pages, parent/child
//! links between text and image regions, named groups representing logical
//! questions, and bidirectional conversion to the external question-bank
//! format, with optional remote synchronization.
//!
//! Page rendering, canvas drawing, and OCR are external collaborators; the
//! core consumes only viewport sizes and opaque thumbnail strings.

pub mod export;
pub mod import;
pub mod model;
pub mod remote;
pub mod store;

pub use export::{to_json, QuestionBank, QuestionImage, QuestionItem, QuestionRecord};
pub use import::{validate_import, ImportDocument, ImportReport, Validation};
pub use model::{Annotation, AnnotationGroup, AnnotationKind, PageViewport, Rect, RelativeRect};
pub use remote::{RemoteClient, RemoteConfig, RemoteError, RemotePair, SyncReport};
pub use store::{AnnotationStore, GroupedAnnotations};
