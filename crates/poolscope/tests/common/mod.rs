//! Shared fixtures for poolscope integration tests.

#![allow(dead_code)]

use poolscope::prelude::*;
use poolscope::{CallPhase, DispatchTable};
use std::sync::{Arc, Mutex};

pub const SCOPE: ScopeId = ScopeId::new("TEST_POOL_SCOPE");
pub const POOL_CLASS: &str = "test.pool.Pool";

pub fn get_connection() -> InterceptionTarget {
    InterceptionTarget::method(POOL_CLASS, "getConnection", &[])
}

pub fn close() -> InterceptionTarget {
    InterceptionTarget::method(POOL_CLASS, "close", &["boolean"])
}

pub fn pool_class() -> ClassDescriptor {
    ClassDescriptor::new(POOL_CLASS)
        .constructor(&["test.pool.Config"])
        .method("getConnection", &[])
        .method("close", &["boolean"])
        .method("getUrl", &[])
        .method("getNumActive", &[])
        .method("getMaxActive", &[])
}

/// Ordered log of hook events shared between interceptors.
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Records every hook invocation and the phase it observed.
pub struct Recording {
    pub name: &'static str,
    pub log: EventLog,
    pub span: bool,
}

impl Recording {
    pub fn new(name: &'static str, log: &EventLog) -> Self {
        Self {
            name,
            log: log.clone(),
            span: true,
        }
    }

    pub fn silent(mut self) -> Self {
        self.span = false;
        self
    }
}

impl Interceptor for Recording {
    fn name(&self) -> &str {
        self.name
    }

    fn before(&self, ctx: &mut CallContext) -> HookResult<HookAction> {
        // Panics inside hooks are swallowed by the runtime, so record phase mismatches.
        if ctx.phase() != CallPhase::PreHookRunning {
            self.log.lock().unwrap().push(format!("{}:bad-phase", self.name));
        }
        self.log.lock().unwrap().push(format!("{}:before", self.name));
        ctx.set_attribute(format!("{}.seen", self.name), true);
        Ok(HookAction::Continue)
    }

    fn after(&self, ctx: &mut CallContext, outcome: &CallOutcome<'_>) -> HookResult {
        if ctx.phase() != CallPhase::PostHookRunning {
            self.log.lock().unwrap().push(format!("{}:bad-phase", self.name));
        }
        let status = if outcome.is_success() { "ok" } else { "err" };
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:after:{status}", self.name));
        Ok(())
    }

    fn records_span(&self) -> bool {
        self.span
    }
}

/// Fails in the chosen hook, either by returning an error or by panicking.
pub struct Faulty {
    pub fail_before: bool,
    pub fail_after: bool,
    pub panic: bool,
}

impl Faulty {
    fn fail(&self) -> HookResult {
        if self.panic {
            panic!("interceptor bug");
        }
        Err(HookError::new("interceptor bug"))
    }
}

impl Interceptor for Faulty {
    fn name(&self) -> &str {
        "faulty"
    }

    fn before(&self, _ctx: &mut CallContext) -> HookResult<HookAction> {
        if self.fail_before {
            self.fail()?;
        }
        Ok(HookAction::Continue)
    }

    fn after(&self, _ctx: &mut CallContext, _outcome: &CallOutcome<'_>) -> HookResult {
        if self.fail_after {
            self.fail()?;
        }
        Ok(())
    }
}

/// Always skips instrumentation.
pub struct Skipping;

impl Interceptor for Skipping {
    fn name(&self) -> &str {
        "skipping"
    }

    fn before(&self, _ctx: &mut CallContext) -> HookResult<HookAction> {
        Ok(HookAction::Skip)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct PoolExhausted;

impl std::fmt::Display for PoolExhausted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("no connection available")
    }
}

impl CallError for PoolExhausted {}

pub struct Pool {
    pub url: &'static str,
}

impl Instrumented for Pool {
    fn class_name(&self) -> &str {
        POOL_CLASS
    }

    fn read_property(&self, accessor: &str) -> Option<Value> {
        match accessor {
            "getUrl" => Some(self.url.into()),
            _ => None,
        }
    }
}

/// A runtime whose dispatch table holds `bindings`, plus the sink it reports to.
pub fn runtime_with(bindings: Vec<InterceptorBinding>) -> (InterceptorRuntime, Arc<CollectingSink>) {
    let dispatch = Arc::new(DispatchTable::new());
    dispatch.attach(&bindings);
    let sink = Arc::new(CollectingSink::new());
    let runtime = InterceptorRuntime::new(dispatch).with_sink_arc(sink.clone());
    (runtime, sink)
}
