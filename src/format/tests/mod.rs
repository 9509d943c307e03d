//! Unit tests for annotation parsing.
//!
//! These tests verify box extraction, document ordering, and the rejection
//! of malformed or incomplete annotation documents.
