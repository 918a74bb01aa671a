//! Marker-based editing of generated TypeScript.
//!
//! Generated files (route tables, application configs, environment models)
//! are edited in place: a marker names the literal to touch, the
//! [`locator`] finds its bracketed region, the [`codec`] converts between
//! [`TsValue`] and source text, and [`splice`] writes entries back.
//!
//! ```
//! use monux_core::SourceFile;
//! use monux_tsedit::{TsCodec, TsValue, splice};
//!
//! let mut file = SourceFile::from_content("app.routes.ts", "export const routes = [];\n");
//! let route = TsValue::Object(vec![("path".into(), "admin".into())]);
//! splice::add_array_item(&mut file, "routes = [", &route, &TsCodec::default()).unwrap();
//! assert!(file.content().contains("path: 'admin'"));
//! ```

pub mod codec;
pub mod error;
pub mod locator;
pub mod scan;
pub mod splice;

pub use codec::{OpaqueExpressions, TsCodec, TsValue};
pub use error::{Error, Result};
pub use locator::{Segment, find_bracketed_region, find_bracketed_region_from, find_line_index};
