pub mod column_index;
