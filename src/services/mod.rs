pub mod answer_extractor;
pub mod format_converter;
pub mod result_writer;

pub use answer_extractor::{extract_boxed_answer, normalize_choice};
pub use format_converter::{comma_to_tab, convert_delimiter};
pub use result_writer::ResultWriter;
