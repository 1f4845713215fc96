pub use line_reader::{read_line, read_until, MAX_FRAME_LEN_DEFAULT};

pub(crate) mod line_reader;
