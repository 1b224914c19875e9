//! A tiny stand-in for Tomcat JDBC's `DataSourceProxy`, routed through the runtime the
//! way a rewritten class would be.

use poolscope::prelude::*;
use poolscope_tomcat_jdbc::constants::{
    DATA_SOURCE_PROXY, GET_MAX_ACTIVE, GET_NUM_ACTIVE, GET_URL, POOL_CONFIGURATION,
};
use poolscope_tomcat_jdbc::targets;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

#[derive(Debug)]
pub struct PoolExhausted;

impl fmt::Display for PoolExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("timeout: pool empty, unable to fetch a connection")
    }
}

impl CallError for PoolExhausted {}

pub struct DataSource {
    runtime: Arc<InterceptorRuntime>,
    url: String,
    max_active: i64,
    active: AtomicI64,
}

impl Instrumented for DataSource {
    fn class_name(&self) -> &str {
        DATA_SOURCE_PROXY
    }

    fn read_property(&self, accessor: &str) -> Option<Value> {
        match accessor {
            GET_URL => Some(self.url.as_str().into()),
            GET_NUM_ACTIVE => Some(self.active.load(Ordering::Relaxed).into()),
            GET_MAX_ACTIVE => Some(self.max_active.into()),
            _ => None,
        }
    }
}

impl DataSource {
    pub fn new(
        runtime: &Arc<InterceptorRuntime>,
        url: &str,
        max_active: i64,
    ) -> Result<Arc<Self>, std::convert::Infallible> {
        let target = targets::data_source_constructor();
        let ds = Self {
            runtime: runtime.clone(),
            url: url.to_string(),
            max_active,
            active: AtomicI64::new(0),
        };
        runtime.construct(MethodCall::new(&target), || Ok(Arc::new(ds)))
    }

    pub fn get_connection(self: &Arc<Self>) -> Result<(), PoolExhausted> {
        let target = targets::get_connection();
        let this: ObjectRef = self.clone();
        self.runtime.invoke(MethodCall::new(&target).on(this), || {
            self.active
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                    (n < self.max_active).then_some(n + 1)
                })
                .map(|_| ())
                .map_err(|_| PoolExhausted)
        })
    }

    pub fn close(self: &Arc<Self>) -> Result<(), std::convert::Infallible> {
        let target = targets::data_source_close();
        let this: ObjectRef = self.clone();
        self.runtime
            .invoke(MethodCall::new(&target).on(this).arg(false), || Ok(()))
    }
}

pub fn class_descriptor() -> ClassDescriptor {
    ClassDescriptor::new(DATA_SOURCE_PROXY)
        .constructor(&[POOL_CONFIGURATION])
        .method("getConnection", &[])
        .method("getConnection", &["java.lang.String", "java.lang.String"])
        .method("close", &["boolean"])
        .method(GET_URL, &[])
        .method(GET_NUM_ACTIVE, &[])
        .method(GET_MAX_ACTIVE, &[])
}
