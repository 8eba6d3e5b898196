use tokio_util::sync::CancellationToken;
use tracing::warn;

static CANCEL: tokio::sync::OnceCell<CancellationToken> = tokio::sync::OnceCell::const_new();

/// Shutdown signal shared by every task in the program.
pub struct Quit(CancellationToken);

impl Quit {
    /// Returns when the program has been asked to quit, either by the OS or
    /// by a task cancelling its [`token`][Self::token].
    pub async fn quit(&self) {
        self.0.cancelled().await
    }

    /// A token for checking the quit state from blocking code.
    pub fn token(&self) -> CancellationToken {
        self.0.clone()
    }
}

pub async fn quit_watch() -> Quit {
    let cancel = CANCEL
        .get_or_init(|| async move {
            let cancel = CancellationToken::new();
            #[cfg(unix)]
            {
                use tokio::signal::unix::{SignalKind, signal};

                // SIGPIPE matters when streaming samples into a closed pipe.
                for kind in [
                    SignalKind::interrupt(),
                    SignalKind::hangup(),
                    SignalKind::terminate(),
                    SignalKind::pipe(),
                    SignalKind::quit(),
                ] {
                    let mut sig = match signal(kind) {
                        Ok(sig) => sig,
                        Err(e) => {
                            warn!("Couldn't install signal handler: {e}");
                            continue;
                        }
                    };
                    let cancel_tx = cancel.clone();
                    tokio::spawn(async move {
                        sig.recv().await;
                        cancel_tx.cancel();
                    });
                }
            }
            #[cfg(not(unix))]
            {
                let cancel_tx = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        cancel_tx.cancel();
                    }
                });
            }
            cancel
        })
        .await;

    Quit(cancel.clone())
}
