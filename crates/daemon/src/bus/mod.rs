// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object model: properties, remote objects, dispatch and signals.

mod dispatch;
mod object;
mod properties;
mod signals;
mod table;

pub use dispatch::{Call, Dispatcher, ReplySink};
pub use object::{Args, Deferred, DeferredWork, MethodError, Reply, ServiceObject};
pub use properties::{Access, ChangeHook, Properties, PropertiesChanged, Property};
pub use signals::SignalHub;
pub use table::{object_ref, ObjectRef, ObjectTable};
