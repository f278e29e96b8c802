use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

/// Resolves on the first ctrl-c, or SIGTERM on unix.
pub async fn wait_for_signal() -> io::Result<ShutdownSignal> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate())?;
        tokio::select! {
            r = tokio::signal::ctrl_c() => r.map(|_| ShutdownSignal::Interrupt),
            _ = term.recv() => Ok(ShutdownSignal::Terminate),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(ShutdownSignal::Interrupt)
    }
}

/// Like [`wait_for_signal`], but never resolves if the handlers cannot be
/// installed; the worker then stops only at end of input.
pub async fn wait_for_shutdown() {
    match wait_for_signal().await {
        Ok(signal) => tracing::info!(?signal, "signal received"),
        Err(e) => {
            tracing::error!(error = %e, "cannot install signal handlers");
            std::future::pending::<()>().await;
        }
    }
}
