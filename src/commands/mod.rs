// Command handler modules, one per subcommand

pub mod listen;
pub mod run;
pub mod show;

/// Resolves when Ctrl-C is received. If the handler cannot be installed the
/// future never resolves and the process is stopped by the default signal
/// action instead.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
