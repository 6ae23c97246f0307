pub mod draft;
pub mod file;
pub mod issue;
pub mod loaders;
pub mod record;
pub mod report;

pub use draft::{positional_label, OptionDraft, QuestionDraft};
pub use file::{FileHandle, LocalFile};
pub use issue::DraftIssue;
pub use loaders::{load_local_files, pick_markup_document, read_markup_document};
pub use record::{PoolAssignment, QuestionRecord, RecordOption};
pub use report::{DraftOutcome, DraftStatus, ImportReport};
