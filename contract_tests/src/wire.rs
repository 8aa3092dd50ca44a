//! Wire-shape contract tests
//!
//! These tests pin the serialized form of the records a client sees and
//! the text of the client-visible error taxonomy.
