// ref: https://tokio.rs/tokio/topics/shutdown
use tokio::sync::watch;

/// Owner side: requests cancellation of every linked token
#[derive(Debug)]
pub struct CancelHandle {
    cancel_sender: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn new(sender: watch::Sender<bool>) -> CancelHandle {
        CancelHandle {
            cancel_sender: sender,
        }
    }
    pub fn cancel(&self) {
        // send_replace also works with no live receivers
        self.cancel_sender.send_replace(true);
        tracing::debug!("cancellation requested");
    }
    pub fn is_cancelled(&self) -> bool {
        *self.cancel_sender.borrow()
    }
    pub fn token(&self) -> CancelToken {
        CancelToken::new(self.cancel_sender.subscribe())
    }
}

/// Worker side: checked between units of work
#[derive(Debug, Clone)]
pub struct CancelToken {
    cancel_receiver: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new(receiver: watch::Receiver<bool>) -> CancelToken {
        CancelToken {
            cancel_receiver: receiver,
        }
    }
    /// Token that is never cancelled
    pub fn never() -> CancelToken {
        let (_, receiver) = watch::channel(false);
        CancelToken::new(receiver)
    }
    pub fn is_cancelled(&self) -> bool {
        *self.cancel_receiver.borrow()
    }
    /// Resolves once cancellation is requested; pends forever if the handle is dropped first
    pub async fn cancelled(&mut self) {
        if self.cancel_receiver.wait_for(|c| *c).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

pub fn create_cancel_pair() -> (CancelHandle, CancelToken) {
    let (send, recv) = watch::channel(false);
    (CancelHandle::new(send), CancelToken::new(recv))
}
