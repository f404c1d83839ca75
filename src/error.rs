// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// List of all errors that can abort a document load.
#[derive(Debug)]
pub enum Error {
    /// The provided data is not a well-formed SVG document.
    ///
    /// No partial document and no partial report is produced.
    Parse(mutsvgtree::ParseError),

    /// The rule catalog is not valid JSON of the expected shape.
    InvalidRules(serde_json::Error),
}

impl From<mutsvgtree::ParseError> for Error {
    fn from(e: mutsvgtree::ParseError) -> Self {
        Error::Parse(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidRules(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::Parse(ref e) => {
                write!(f, "SVG loading failed cause {}", e)
            }
            Error::InvalidRules(ref e) => {
                write!(f, "rule catalog parsing failed cause {}", e)
            }
        }
    }
}

impl std::error::Error for Error {}
