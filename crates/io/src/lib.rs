// Sheet sources: where the movement log and stock snapshot come from

pub mod csv;
pub mod error;
pub mod gsheets;
pub mod source;
pub mod workbook;

pub use error::SourceError;
pub use source::SheetSource;
