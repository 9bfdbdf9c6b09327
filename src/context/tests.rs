//! Unit tests for parse and format contexts.
