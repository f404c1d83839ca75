// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
`tacsvg` evaluates SVG documents for suitability as tactile
(touch-readable) graphics and transforms them toward tactile compliance.

## How it works

A loaded document is decomposed into addressable elements (those carrying
an `id` attribute), each element is classified (`line`, `dashed_line`,
`shape`, `label`) and matched against a catalog of tactile compliance
rules. Rule-based findings can then be augmented by an external
generation service: one concurrent request per element, joined after
every request settles, with per-element failure isolation.

Transformation never touches the original document. A working copy takes
the edits (outline emphasis, pattern-fill synthesis, line restyling) and
every revert copies attributes back from the original, so a single
element can always be restored exactly.

## Example

```no_run
use tacsvg::{Options, RuleCatalog, Session};

let catalog = RuleCatalog::bundled();
let mut session = Session::load(
    "<svg xmlns='http://www.w3.org/2000/svg'><rect id='r1' width='10' height='10'/></svg>",
    &catalog,
    &Options::default(),
).unwrap();

session.apply_pattern_fill("r1", tacsvg::PatternKind::Stripes);
println!("{}", session.transformed_svg());
```
*/

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod augment;
pub mod catalog;
pub mod classify;
pub mod decompose;
pub mod report;
pub mod transform;

mod error;
mod options;
mod session;

pub use mutsvgtree;

pub use crate::augment::{AugmentError, Augmentor, HttpAugmentor};
pub use crate::catalog::RuleCatalog;
pub use crate::classify::{ClassTag, TagSet};
pub use crate::error::Error;
pub use crate::options::Options;
pub use crate::report::{Finding, Report};
pub use crate::session::{Session, StyleState, ViewMode};
pub use crate::transform::{LineStyle, PatternKind};
