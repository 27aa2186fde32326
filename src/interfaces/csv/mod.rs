pub mod count_reader;
pub mod fee_writer;
pub mod formula_reader;
pub mod procedure_reader;
