//! A simulated Tomcat JDBC library whose methods route through the interceptor runtime,
//! the way rewritten host classes would.

#![allow(dead_code)]

use poolscope::prelude::*;
use poolscope_tomcat_jdbc::constants::{
    CONNECTION_POOL, DATA_SOURCE_PROXY, GET_MAX_ACTIVE, GET_NUM_ACTIVE, GET_URL,
    POOL_CONFIGURATION,
};
use poolscope_tomcat_jdbc::interceptor::MonitorStates;
use poolscope_tomcat_jdbc::{TomcatJdbcPlugin, targets};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

pub const URL: &str = "jdbc:postgresql://db.internal:5432/orders";
pub const CLASS_BYTES: &[u8] = b"\xca\xfe\xba\xbe";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    Exhausted { max_active: i64 },
    Closed,
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::Exhausted { max_active } => {
                write!(f, "pool full: {max_active} of {max_active} connections in use")
            }
            PoolError::Closed => f.write_str("data source is closed"),
        }
    }
}

impl CallError for PoolError {
    fn kind(&self) -> std::borrow::Cow<'static, str> {
        match self {
            PoolError::Exhausted { .. } => "PoolExhaustedException".into(),
            PoolError::Closed => "SQLException".into(),
        }
    }
}

#[derive(Debug)]
pub struct Connection {
    pub user: Option<String>,
}

/// `org.apache.tomcat.jdbc.pool.ConnectionPool`.
pub struct ConnectionPool {
    runtime: Arc<InterceptorRuntime>,
    max_active: i64,
    active: AtomicI64,
    closed: AtomicBool,
}

impl Instrumented for ConnectionPool {
    fn class_name(&self) -> &str {
        CONNECTION_POOL
    }
}

impl ConnectionPool {
    fn borrow(&self, user: Option<&str>) -> Result<Connection, PoolError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PoolError::Closed);
        }
        let max_active = self.max_active;
        self.active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < max_active).then_some(n + 1)
            })
            .map_err(|_| PoolError::Exhausted { max_active })?;
        Ok(Connection {
            user: user.map(str::to_owned),
        })
    }

    fn release(&self, _conn: Connection) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    /// `close(boolean)`.
    pub fn close(self: &Arc<Self>, force: bool) -> Result<(), PoolError> {
        let target = targets::connection_pool_close();
        let this: ObjectRef = self.clone();
        self.runtime
            .invoke(MethodCall::new(&target).on(this).arg(force), || {
                self.closed.store(true, Ordering::SeqCst);
                Ok(())
            })
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// `org.apache.tomcat.jdbc.pool.DataSourceProxy`.
pub struct DataSourceProxy {
    runtime: Arc<InterceptorRuntime>,
    url: String,
    pool: Arc<ConnectionPool>,
}

impl Instrumented for DataSourceProxy {
    fn class_name(&self) -> &str {
        DATA_SOURCE_PROXY
    }

    fn read_property(&self, accessor: &str) -> Option<Value> {
        match accessor {
            GET_URL => Some(self.url.as_str().into()),
            GET_NUM_ACTIVE => Some(self.pool.active.load(Ordering::SeqCst).into()),
            GET_MAX_ACTIVE => Some(self.pool.max_active.into()),
            _ => None,
        }
    }
}

impl DataSourceProxy {
    /// `DataSourceProxy(PoolConfiguration)`.
    pub fn new(runtime: &Arc<InterceptorRuntime>, max_active: i64) -> Arc<Self> {
        let target = targets::data_source_constructor();
        let rt = runtime.clone();
        let created: Result<_, std::convert::Infallible> =
            runtime.construct(MethodCall::new(&target), move || {
                let pool = Arc::new(ConnectionPool {
                    runtime: rt.clone(),
                    max_active,
                    active: AtomicI64::new(0),
                    closed: AtomicBool::new(false),
                });
                Ok(Arc::new(Self {
                    runtime: rt,
                    url: URL.to_string(),
                    pool,
                }))
            });
        match created {
            Ok(ds) => ds,
            Err(never) => match never {},
        }
    }

    pub fn get_connection(self: &Arc<Self>) -> Result<Connection, PoolError> {
        let target = targets::get_connection();
        let this: ObjectRef = self.clone();
        self.runtime
            .invoke(MethodCall::new(&target).on(this), || self.pool.borrow(None))
    }

    pub fn get_connection_as(
        self: &Arc<Self>,
        user: &str,
        password: &str,
    ) -> Result<Connection, PoolError> {
        let target = targets::get_connection_with_credentials();
        let this: ObjectRef = self.clone();
        self.runtime.invoke(
            MethodCall::new(&target).on(this).arg(user).arg(password),
            || self.pool.borrow(Some(user)),
        )
    }

    pub fn release(&self, conn: Connection) {
        self.pool.release(conn);
    }

    /// `close(boolean)`: closes the underlying pool.
    pub fn close(self: &Arc<Self>, force: bool) -> Result<(), PoolError> {
        let target = targets::data_source_close();
        let this: ObjectRef = self.clone();
        self.runtime
            .invoke(MethodCall::new(&target).on(this).arg(force), || {
                self.pool.close(force)
            })
    }

    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }
}

/// `DataSourceProxy` as shipped by current Tomcat JDBC.
pub fn data_source_proxy_class() -> ClassDescriptor {
    ClassDescriptor::new(DATA_SOURCE_PROXY)
        .constructor(&[POOL_CONFIGURATION])
        .method("getConnection", &[])
        .method("getConnection", &["java.lang.String", "java.lang.String"])
        .method("close", &["boolean"])
        .method(GET_URL, &[])
        .method(GET_NUM_ACTIVE, &[])
        .method(GET_MAX_ACTIVE, &[])
}

/// A `DataSourceProxy` missing one monitoring accessor.
pub fn data_source_proxy_class_without(accessor: &str) -> ClassDescriptor {
    let mut class = data_source_proxy_class();
    class.methods.retain(|m| m.name != accessor);
    class
}

pub fn connection_pool_class() -> ClassDescriptor {
    ClassDescriptor::new(CONNECTION_POOL).method("close", &["boolean"])
}

pub struct Harness {
    pub agent: Agent,
    pub sink: Arc<CollectingSink>,
    pub states: MonitorStates,
}

impl Harness {
    pub fn runtime(&self) -> &Arc<InterceptorRuntime> {
        self.agent.runtime()
    }
}

/// Build an agent with only the Tomcat JDBC plugin and load `classes` through it.
pub fn harness(config: ProfilerConfig, classes: Vec<ClassDescriptor>) -> Harness {
    let plugin = TomcatJdbcPlugin::new();
    let states = plugin.monitor_states();
    let names: Vec<String> = classes.iter().map(|c| c.name.clone()).collect();
    let instrumentor = classes
        .into_iter()
        .fold(StaticInstrumentor::new(), StaticInstrumentor::with_class);
    let sink = Arc::new(CollectingSink::new());
    let agent = Agent::builder()
        .config(config)
        .instrumentor(instrumentor)
        .sink_arc(sink.clone())
        .plugin(plugin)
        .build()
        .expect("plugin setup");
    for name in &names {
        agent.on_class_load(name, CLASS_BYTES);
    }
    Harness {
        agent,
        sink,
        states,
    }
}

pub fn default_harness() -> Harness {
    harness(
        ProfilerConfig::new(),
        vec![data_source_proxy_class(), connection_pool_class()],
    )
}
