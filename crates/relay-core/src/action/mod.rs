//! User action records and the local artifacts built from them.

pub mod model;
pub mod recorder;

pub use model::{ACTION_ANSWER, ACTION_HELP, ACTION_START, ActionRecord, LOG_HEADER};
pub use recorder::{ActionRecorder, ConvertError, ConvertReport, TableConverter};
