use crate::{Engine, Error, Result, ScriptResult};
use log::debug;
use std::sync::mpsc::{self, Sender};
use std::thread;
use tokio::sync::oneshot;

enum Command {
    Goto(String, oneshot::Sender<Result<()>>),
    EvalInPage(String, oneshot::Sender<Result<ScriptResult>>),
    CurrentUrl(oneshot::Sender<String>),
    Close(oneshot::Sender<Result<()>>),
}

/// An async-friendly browser handle backed by a dedicated worker thread.
///
/// The worker thread owns a synchronous `Engine` instance and executes
/// commands sent from async tasks so callers can use an async interface
/// without requiring the engine to be `Send` across threads.
///
/// The handle is deliberately not `Clone`: one handle owns one browser.
/// Dropping it (for example when a request future is cancelled) closes the
/// command channel and the worker closes the engine once its current command
/// returns.
pub struct Browser {
    cmd_tx: Sender<Command>,
}

impl Browser {
    /// Start a worker thread and build the engine on it with `factory`.
    ///
    /// Resolves once the engine has launched, or with the launch error.
    pub async fn spawn<E, F>(factory: F) -> Result<Self>
    where
        E: Engine + 'static,
        F: FnOnce() -> Result<E> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx) = oneshot::channel::<Result<()>>();

        thread::Builder::new()
            .name("pagestyle-browser".into())
            .spawn(move || {
                // Initialize engine on the worker thread
                let mut engine = match factory() {
                    Ok(e) => e,
                    Err(err) => {
                        let _ = init_tx.send(Err(err));
                        return;
                    }
                };

                let _ = init_tx.send(Ok(()));

                // Command loop; ends on Close or when every handle is gone
                while let Ok(cmd) = cmd_rx.recv() {
                    match cmd {
                        Command::Goto(url, resp) => {
                            let res = engine.load_url(&url);
                            let _ = resp.send(res);
                        }
                        Command::EvalInPage(script, resp) => {
                            let res = engine.evaluate_script_in_page(&script);
                            let _ = resp.send(res);
                        }
                        Command::CurrentUrl(resp) => {
                            let _ = resp.send(engine.current_url());
                        }
                        Command::Close(resp) => {
                            let res = engine.close();
                            let _ = resp.send(res);
                            return;
                        }
                    }
                }

                debug!("Browser handle dropped without close; releasing engine");
                let _ = engine.close();
            })
            .map_err(|e| Error::InitializationError(format!("Failed to spawn browser worker: {}", e)))?;

        // Wait for the worker to report initialization success or failure
        init_rx
            .await
            .map_err(|e| Error::Other(format!("Worker init canceled: {}", e)))??;

        Ok(Self { cmd_tx })
    }

    /// Navigate to a URL and wait for the network to settle
    pub async fn goto(&self, url: &str) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Goto(url.to_string(), tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("Goto canceled: {}", e)))?
    }

    /// Evaluate script directly in the page's global context (can access `document` etc.)
    pub async fn eval_in_page(&self, script: &str) -> Result<String> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::EvalInPage(script.to_string(), tx))?;
        let sr = rx
            .await
            .map_err(|e| Error::Other(format!("EvalInPage canceled: {}", e)))??;
        if sr.is_error {
            return Err(Error::ScriptError(sr.value));
        }
        Ok(sr.value)
    }

    /// URL of the current document, after redirects
    pub async fn current_url(&self) -> Result<String> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::CurrentUrl(tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("CurrentUrl canceled: {}", e)))
    }

    /// Shutdown the background worker and close the browser.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Close(tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("Close canceled: {}", e)))?
    }

    fn send(&self, cmd: Command) -> Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| Error::Other("Browser worker is gone".into()))
    }
}
