//! Raya State Machine Lowering
//!
//! Lowers methods containing suspension points (`yield`) into re-entrant
//! state machine types for the Raya compiler.
//!
//! This crate provides:
//! - A resolved tree and entity model (`ast`, `entity`, `ty`, `compilation`)
//! - The lowering itself (`statemachine`)
//! - Diagnostics for unsupported constructs (`diagnostic`)
//! - Options loaded from the `[statemachine]` table of `raya.toml` (`config`)
//! - Dumps of the produced types (`pretty`)
//!
//! # Usage
//!
//! ```ignore
//! use raya_statemachine::{transform_method, Compilation, GeneratorKind, StateMachineOptions};
//!
//! let options = StateMachineOptions::load("raya.toml")?;
//! let mut cx = Compilation::with_name_template(options.unique_name_template.clone())?;
//! // ... populate `cx` from semantic analysis ...
//! let machine = transform_method(&mut cx, method, &GeneratorKind::new(), &options)?;
//! // substitute `machine.construction` for calls of `method`
//! ```

#![warn(rust_2018_idioms)]

pub mod ast;
pub mod compilation;
pub mod config;
pub mod diagnostic;
pub mod entity;
pub mod error;
pub mod pretty;
pub mod statemachine;
pub mod ty;

pub use compilation::{Compilation, UniqueNameAllocator};
pub use config::{ConfigError, StateMachineOptions};
pub use diagnostic::Diagnostic;
pub use error::{StateMachineError, StateMachineResult};
pub use pretty::PrettyPrint;
pub use statemachine::{transform_method, GeneratorKind, StateMachine, StateMachineKind};
pub use ty::Ty;
