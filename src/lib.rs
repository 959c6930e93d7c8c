//! IGDE Shared
//!
//! Editor-side object wrapping for game definitions. An [`ObjectWrapper`]
//! takes a class from a [`GameDefinition`], a property dictionary and a
//! transform, and maintains the engine resources the class describes:
//! components, billboards, lights, speakers, particle emitters, force fields,
//! environment map probes, navigation spaces and blockers, and nested worlds.
//!
//! Resources load asynchronously through a [`ResourceLoader`]. Trigger
//! expressions stored in properties switch sub-object state whenever their
//! [`TriggerTarget`]s fire.
//!
//! The crate is single threaded. Wrappers, worlds and engine resources use
//! `Rc`-based sharing; only loader backends may complete work elsewhere and
//! hand results back through [`Environment::update`].

pub mod codec;
pub mod config;
pub mod engine;
pub mod environment;
pub mod error;
pub mod gamedef;
pub mod loader;
pub mod triggers;
pub mod wrapper;

// Re-export commonly used types
pub use codec::Color;
pub use config::WrapperConfig;
pub use engine::{Shared, World};
pub use environment::{DiskFileSystem, Environment, MemoryFileSystem, VirtualFileSystem};
pub use error::{ExpressionParseError, IgdeError, Result};
pub use gamedef::{GameDefinition, GdClass, GdProperty, PropertyType};
pub use loader::{LoaderBackend, MemoryBackend, Resource, ResourceLoader, ResourceType};
pub use triggers::{
    TriggerExpression, TriggerExpressionParser, TriggerListener, TriggerTarget, TriggerTargetList,
};
pub use wrapper::{ObjectWrapper, SubObject, SubObjectKind, WrapperEvent, WrapperEventKind};
