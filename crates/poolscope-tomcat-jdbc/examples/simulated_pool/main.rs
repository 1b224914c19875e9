//! Runs a simulated Tomcat JDBC data source under the agent and prints pool usage.
//!
//! ```sh
//! cargo run -p poolscope-tomcat-jdbc --example simulated_pool
//! ```

mod pool;

use poolscope::prelude::*;
use poolscope::telemetry::{CompositeSink, StatsSink};
use poolscope_tomcat_jdbc::TomcatJdbcPlugin;
use poolscope_tomcat_jdbc::constants::DATA_SOURCE_PROXY;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let stats = Arc::new(StatsSink::new());
    let agent = Agent::builder()
        .config(ProfilerConfig::new().with_bool("profiler.jdbc.tomcatjdbc", true))
        .instrumentor(StaticInstrumentor::new().with_class(pool::class_descriptor()))
        .sink(CompositeSink::new().add(TracingSink::new()).add_arc(stats.clone()))
        .plugin(TomcatJdbcPlugin::new())
        .build()?;

    let bytes = agent.on_class_load(DATA_SOURCE_PROXY, b"\xca\xfe\xba\xbe");
    println!("loaded {DATA_SOURCE_PROXY} ({} bytes)", bytes.len());

    let ds = pool::DataSource::new(agent.runtime(), "jdbc:postgresql://localhost/app", 3)?;
    for _ in 0..4 {
        if let Err(e) = ds.get_connection() {
            println!("getConnection failed: {e}");
        }
    }

    for snapshot in agent.pool_monitors().snapshots() {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    if let Some(op) = stats.operation("DataSourceProxy.getConnection") {
        println!("getConnection: {} calls, {} errors", op.calls, op.errors);
    }

    ds.close()?;
    println!("pools after close: {}", agent.pool_monitors().len());
    Ok(())
}
