pub(crate) mod witness_writer;
