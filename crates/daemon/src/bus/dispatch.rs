// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Routes method calls to exported objects.
//!
//! Dispatch always runs on the coordinating thread. Deferred replies become
//! tasks whose continuation finishes the call back on that thread, so an
//! object is never touched from a worker.

use std::panic::{catch_unwind, AssertUnwindSafe};

use subman_core::{MainLoopHandle, Task, TaskFailure, Tasks};
use subman_wire::names::{INTROSPECTABLE_INTERFACE, PROPERTIES_INTERFACE};
use subman_wire::{Fault, Message, Value};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use super::object::{Args, Deferred, MethodError, Reply, ServiceObject};
use super::table::{ObjectRef, ObjectTable};

/// Where replies for one connection go.
pub type ReplySink = mpsc::UnboundedSender<Message>;

/// One incoming method call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub serial: u64,
    pub path: String,
    pub interface: String,
    pub member: String,
    pub args: Vec<Value>,
}

impl Call {
    pub fn from_message(msg: Message) -> Option<Self> {
        match msg {
            Message::MethodCall { serial, path, interface, member, args } => {
                Some(Self { serial, path, interface, member, args })
            }
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    handle: MainLoopHandle,
    table: ObjectTable,
    tasks: Tasks<Value, MethodError>,
}

impl Dispatcher {
    pub fn new(handle: MainLoopHandle, table: ObjectTable, tasks: Tasks<Value, MethodError>) -> Self {
        Self { handle, table, tasks }
    }

    pub fn table(&self) -> &ObjectTable {
        &self.table
    }

    /// Hand `call` to the coordinating thread. Safe from any task or thread.
    pub fn schedule(&self, call: Call, sink: ReplySink) {
        let dispatcher = self.clone();
        if !self.handle.idle_add(move || dispatcher.dispatch(call, sink)) {
            warn!("main loop gone, call dropped");
        }
    }

    /// Run `call` now. Coordinating thread only.
    pub fn dispatch(&self, call: Call, sink: ReplySink) {
        let Call { serial, path, interface, member, args } = call;
        debug!(%path, %interface, %member, serial, "dispatch");

        let Some(object) = self.table.get(&path) else {
            send(&sink, serial, Err(Fault::unknown_object(&path)));
            return;
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let mut guard = object.lock();
            route(&mut *guard, &interface, &member, Args::new(args))
        }));

        let result = match outcome {
            Ok(Ok(Reply::Value(value))) => Ok(value),
            Ok(Ok(Reply::Deferred(deferred))) => {
                self.defer(object, path, member, serial, deferred, sink);
                return;
            }
            Ok(Err(e)) => Err(wrap_error(&path, &member, e)),
            Err(panic) => Err(wrap_panic(&path, &member, panic)),
        };
        send(&sink, serial, result);
    }

    fn defer(&self, object: ObjectRef, path: String, member: String, serial: u64, deferred: Deferred, sink: ReplySink) {
        let task = Task::from_fn(deferred.name, deferred.work).on_complete(move |result| {
            let result = match result {
                Ok(value) => {
                    let finished = catch_unwind(AssertUnwindSafe(|| object.lock().complete(&member, value)));
                    match finished {
                        Ok(Ok(value)) => Ok(value),
                        Ok(Err(e)) => Err(wrap_error(&path, &member, e)),
                        Err(panic) => Err(wrap_panic(&path, &member, panic)),
                    }
                }
                Err(TaskFailure::Failed(e)) => Err(wrap_error(&path, &member, e)),
                Err(failure) => {
                    error!(%path, %member, kind = failure.kind(), error = %failure, "deferred call failed");
                    Err(Fault::service(failure.kind(), &failure))
                }
            };
            send(&sink, serial, result);
        });
        self.tasks.add(task);
    }
}

fn route(object: &mut dyn ServiceObject, interface: &str, member: &str, mut args: Args) -> Result<Reply, MethodError> {
    match interface {
        PROPERTIES_INTERFACE => match member {
            "GetAll" => Ok(object.get_all(args.str(0, "interface_name")?)?.into()),
            "Get" => Ok(object.get(args.str(0, "interface_name")?, args.str(1, "property_name")?)?.into()),
            "Set" => {
                let value = args.take(2, "new_value")?;
                object.set(args.str(0, "interface_name")?, args.str(1, "property_name")?, value)?;
                Ok(Value::Unit.into())
            }
            _ => Err(Fault::unknown_method(interface, member).into()),
        },
        INTROSPECTABLE_INTERFACE => match member {
            "Introspect" => Ok(object.introspect().into()),
            _ => Err(Fault::unknown_method(interface, member).into()),
        },
        _ if interface == object.interface_name() => object.call_method(member, args),
        _ => Err(Fault::unknown_interface(interface).into()),
    }
}

fn wrap_error(path: &str, member: &str, e: MethodError) -> Fault {
    match &e {
        MethodError::Fault(fault) => debug!(%path, %member, kind = ?fault.kind, error = %fault, "call faulted"),
        MethodError::Internal { kind, .. } => error!(%path, %member, kind, error = %e, "call failed"),
    }
    e.into_fault()
}

fn wrap_panic(path: &str, member: &str, panic: Box<dyn std::any::Any + Send>) -> Fault {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    error!(%path, %member, error = %message, "handler panicked");
    Fault::service("Panic", message)
}

fn send(sink: &ReplySink, serial: u64, result: Result<Value, Fault>) {
    if sink.send(Message::reply(serial, result)).is_err() {
        debug!(serial, "caller went away before reply");
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
