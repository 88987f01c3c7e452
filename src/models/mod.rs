pub mod detection;
pub mod grading;
pub mod loaders;
pub mod question;
pub mod status;
pub mod student;

pub use detection::{BBox, Candidate, DetectionRecord, Label, PageDetections, ScanDocument};
pub use grading::{DecimalSeparator, GradeThreshold, GradingTable};
pub use loaders::{load_all_documents, load_document};
pub use question::{
    Association, AssociationEntry, AssociationMap, DuplicateHeader, GradeCandidate, QuestionSlot,
    NOT_DETECTED,
};
pub use status::PlausibilityStatus;
pub use student::{
    Evaluation, GradeCount, IdField, MissingCause, PageHealth, QuestionResult, StudentRecord,
};
