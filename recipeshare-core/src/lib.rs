pub mod durations;
pub mod error;
pub mod image;
pub mod policy;
pub mod spreadsheet;
pub mod storage;
pub mod submission;

pub use durations::{sum_durations, CategoryDurations};
pub use error::{SpreadsheetError, StorageError, SubmissionError};
pub use policy::{Denied, Principal, RecipeScope, Roles};
pub use spreadsheet::{parse_workbook, SheetRecipe};
pub use storage::{slugify, StagedUpload, StoragePlan};
pub use submission::{
    check_length, check_names, instruction_steps, split_names, NameList, RecipeSubmission,
    SubmissionForm, MAX_NAME_LENGTH,
};
