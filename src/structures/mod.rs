//! The on-disk records that describe an entry

mod central_directory;
mod data_descriptor;
mod local_file_header;

pub use central_directory::*;
pub use data_descriptor::*;
pub use local_file_header::*;
