pub mod ops_reader;
pub mod summary_writer;
