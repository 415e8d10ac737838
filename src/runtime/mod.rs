/*!
 * Runtime Module
 * Code units, values and the host surface they execute against
 */

pub mod context;
pub mod types;
pub mod unit;
pub mod value;

pub use context::Context;
pub use types::{FieldDesc, TypeDesc, Visibility, WELL_KNOWN_TYPES};
pub use unit::{CodeUnit, Compiler, Entry, NativeEntry};
pub use value::{FieldHandle, TypeHandle, Value};
