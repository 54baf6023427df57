use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

/// Execute a function with a timeout.
///
/// Returns `Ok(T)` if the function completes within the timeout, or an
/// `io::Error` of kind `TimedOut` (or `Other` if the task panicked).
/// A timed-out task keeps running on its worker thread; its result is dropped.
pub fn execute_with_timeout<T, F>(
    target: &str,
    operation_name: &str,
    timeout: Duration,
    task: F,
) -> Result<T, std::io::Error>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let cancel_token = Arc::new(AtomicBool::new(false));
    let cancel_token_clone = cancel_token.clone();
    let (tx, rx) = mpsc::channel();

    let thread_name = format!("{}-worker", operation_name.to_lowercase());
    let handle = thread::Builder::new().name(thread_name).spawn(move || {
        let result = task();

        // Only send if we haven't been cancelled
        if !cancel_token_clone.load(Ordering::SeqCst) {
            let _ = tx.send(result);
        }
    })?;

    match rx.recv_timeout(timeout) {
        Ok(result) => {
            let _ = handle.join();
            Ok(result)
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            // The sender was dropped without a value: the task panicked
            let reason = handle
                .join()
                .err()
                .map(extract_panic_info)
                .unwrap_or_else(|| "worker exited without a result".to_string());
            Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("{} failed for '{}': {}", operation_name, target, reason),
            ))
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            cancel_token.store(true, Ordering::SeqCst);

            info!(
                "TIMEOUT: {} took longer than {:?} for '{}'",
                operation_name, timeout, target
            );

            // Reap the stuck worker in the background so the caller moves on
            let cleanup_name = format!("{}-cleanup", operation_name.to_lowercase());
            let spawned = thread::Builder::new().name(cleanup_name).spawn(move || {
                let _ = handle.join();
            });
            if let Err(e) = spawned {
                debug!("Could not spawn cleanup thread: {}", e);
            }

            Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("{} timed out after {:?}", operation_name, timeout),
            ))
        }
    }
}

/// Extract panic info from panic value
pub fn extract_panic_info(panic_err: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic_err.downcast_ref::<&str>() {
        format!("Panic with message: {}", s)
    } else if let Some(s) = panic_err.downcast_ref::<String>() {
        format!("Panic with message: {}", s)
    } else {
        "Unknown panic occurred".to_string()
    }
}
