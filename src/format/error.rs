//! Error types for annotation parsing.

use thiserror::Error;

/// Errors that can occur while reading a Pascal VOC annotation document.
#[derive(Error, Debug)]
pub enum VocError {
    /// Malformed XML reported by the reader
    #[error("XML error at byte {position}: {source}")]
    Xml {
        /// Byte offset where the reader stopped
        position: usize,
        /// Underlying reader error
        #[source]
        source: quick_xml::Error,
    },

    /// Document has no root element
    #[error("Document has no root element")]
    NoRoot,

    /// Document has more than one top-level element
    #[error("Unexpected second root element <{name}>")]
    MultipleRoots {
        /// Name of the extra element
        name: String,
    },

    /// Document ended with unclosed elements
    #[error("Unexpected end of document inside <{open}>")]
    UnexpectedEof {
        /// Innermost element still open
        open: String,
    },

    /// Required child element is missing
    #[error("Missing <{element}> in <{parent}> #{index}")]
    MissingElement {
        /// Name of the missing element
        element: &'static str,
        /// Name of the enclosing element
        parent: &'static str,
        /// Zero-based position of the enclosing object in the document
        index: usize,
    },

    /// Child element appears more than once
    #[error("Duplicate <{element}> in <{parent}> #{index}")]
    DuplicateElement {
        /// Name of the repeated element
        element: &'static str,
        /// Name of the enclosing element
        parent: &'static str,
        /// Zero-based position of the enclosing object in the document
        index: usize,
    },

    /// Coordinate leaf is not a number
    #[error("Invalid number {value:?} in <{element}> of object #{index}")]
    InvalidNumber {
        /// Leaf element name
        element: &'static str,
        /// Raw text content
        value: String,
        /// Zero-based position of the enclosing object in the document
        index: usize,
    },
}

impl VocError {
    pub(crate) fn xml(position: usize, source: impl Into<quick_xml::Error>) -> Self {
        Self::Xml {
            position,
            source: source.into(),
        }
    }
}
