// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::time::Duration;

/// Processing options.
#[derive(Clone, Debug)]
pub struct Options {
    /// The default outline thickness, in user units.
    ///
    /// Used by the initial outline pass and whenever a restyled element
    /// has no stroke width of its own.
    ///
    /// Default: 1.0
    pub outline_thickness: f64,

    /// The default pattern tile size, in user units.
    ///
    /// Default: 20.0
    pub pattern_tile_size: f64,

    /// How many augmentation requests may be in flight at once.
    ///
    /// Default: 4
    pub augment_concurrency: usize,

    /// Timeout for a single augmentation request.
    ///
    /// Default: 30 seconds
    pub request_timeout: Duration,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            outline_thickness: 1.0,
            pattern_tile_size: 20.0,
            augment_concurrency: 4,
            request_timeout: Duration::from_secs(30),
        }
    }
}
