//! Document transforms for quire.
//!
//! Every change to a document is a [`Step`]: an atomic edit that can be
//! applied, inverted, serialized and mapped through other changes. A
//! [`Transform`] accumulates steps together with the [`Mapping`] that
//! relates positions before and after them.

/// Single-attribute steps.
pub mod attr_step;
/// Error types.
pub mod error;
/// Position maps and mappings.
pub mod map;
/// Mark transforms.
pub mod mark;
/// Mark steps.
pub mod mark_step;
/// The content fitter and range replacement.
pub mod replace;
/// Replace steps.
pub mod replace_step;
/// The step enum and its JSON form.
pub mod step;
/// Structural transforms and their predicates.
pub mod structure;
/// The step accumulator.
pub mod transform;

pub use attr_step::{AttrStep, DocAttrStep};
pub use error::{Result, StepError, StepResult, TransformError};
pub use map::{Bias, DelFlags, MapResult, Mappable, Mapping, Recover, StepMap};
pub use mark::MarkFilter;
pub use mark_step::{AddMarkStep, AddNodeMarkStep, RemoveMarkStep, RemoveNodeMarkStep};
pub use replace::replace_step;
pub use replace_step::{ReplaceAroundStep, ReplaceStep};
pub use step::Step;
pub use structure::{Wrapper, can_join, can_split, drop_point, find_wrapping, insert_point, join_point, joinable, lift_target};
pub use transform::Transform;
