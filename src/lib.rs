//! Model-mapped client for JSON-over-HTTP REST APIs.
//!
//! Declared model types are bound to a remote resource collection with CRUD
//! operations, lazily-resolved paginated result sets and typed error
//! propagation from HTTP status codes. The centrepiece is
//! [`resource::ResourceSet`]: a cursor-like object that defers network I/O
//! until results are consumed, caches fetched records incrementally and
//! supports index/slice access like an in-memory sequence.
//!
//! ```no_run
//! use rest_models::{ClientConfig, Lookup, objects};
//! # use rest_models::{FieldDef, Model, ModelState};
//! # use once_cell::sync::Lazy;
//! # use serde_json::Value;
//! # #[derive(Debug, Clone, Default)]
//! # struct Book { id: Option<i64>, state: ModelState }
//! # impl Model for Book {
//! #     fn resource_name() -> &'static str { "book" }
//! #     fn fields() -> &'static [FieldDef<Self>] {
//! #         static FIELDS: Lazy<Vec<FieldDef<Book>>> = Lazy::new(|| vec![
//! #             FieldDef::new("id", |m| m.id.map(Value::from), |m, v, _| { m.id = v.as_i64(); Ok(()) }),
//! #         ]);
//! #         &FIELDS
//! #     }
//! #     fn state(&self) -> &ModelState { &self.state }
//! #     fn state_mut(&mut self) -> &mut ModelState { &mut self.state }
//! # }
//!
//! # fn main() -> rest_models::Result<()> {
//! let config = ClientConfig::from_env();
//! let book: Book = objects(&config).get(Lookup::pk(1))?;
//! let mut recent = objects::<Book>(&config).filter("year", 2024);
//! for book in recent.iter() {
//!     let book = book?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod manager;
pub mod model;
pub mod resource;

pub use client::{ApiResponse, RestClient};
pub use config::ClientConfig;
pub use error::{ApiError, ApiErrorKind, Error, Result, classify};
pub use manager::{Manager, objects};
pub use model::{FieldDef, Model, ModelState, parse_datetime, parse_datetime_in};
pub use resource::{Iter, Lookup, Meta, ResourceSet};
