use std::sync::Arc;
use tokio::sync::mpsc;
use log::{debug, error, info};

use crate::clock::Clock;
use crate::providers::Transport;
use crate::throttle::CallThrottle;
use crate::TutorFoot;

/// Public API for the tutor backend - owns the task
pub struct TutorBackend
{   hand: crate::TutorHand
  , _task_handle: tokio::task::JoinHandle<()>
}

impl TutorBackend
{   /// Spawn the backend loop around a throttle.
    /// Returns immediately.
    pub fn new<T, C>(throttle: Arc<CallThrottle<T, C>>) -> Self
    where
      T: Transport + 'static,
      C: Clock + Clone + 'static,
    {   debug!("Creating TutorBackend with task ownership");

        let (ask_tx, ask_rx)
          = mpsc::unbounded_channel();
        let (get_status_tx, get_status_rx)
          = mpsc::unbounded_channel();
        let (clear_error_tx, clear_error_rx)
          = mpsc::unbounded_channel();
        let (kill_process_tx, kill_process_rx)
          = mpsc::unbounded_channel();

        let hand = crate::TutorHand
        {   ask_tx
          , get_status_tx
          , clear_error_tx
          , kill_process_tx
        };

        let foot = crate::TutorFoot
        {   ask_rx
          , get_status_rx
          , clear_error_rx
          , kill_process_rx
        };

        let _task_handle = tokio::spawn(async move {
          run_backend_loop(foot, throttle).await
        });

        TutorBackend
        {   hand
          , _task_handle
        }
    }

    /// Queue a prompt - returns almost immediately
    pub fn ask(
      &self
    , prompt: String
    , schema: Option<crate::schema::ResponseSchema>
    ) -> Result<
        mpsc::UnboundedReceiver<crate::AskReply>,
        crate::error::Error
      >
    {   debug!("ask queuing command, structured: {}", schema.is_some());
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::AskArgs
        {   prompt
          , schema
          , reply: reply_tx
        };

        self.hand.ask_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel closed");
            crate::error::Error::Other(
              "Backend disconnected".to_string()
            )
          })?;

        Ok(reply_rx)
    }

    /// Ask and wait for the reply; `None` on any failure
    pub async fn ask_and_wait(
      &self
    , prompt: String
    , schema: Option<crate::schema::ResponseSchema>
    ) -> crate::AskReply
    {   let mut rx = self.ask(prompt, schema).ok()?;
        rx.recv().await.flatten()
    }

    /// Current loading/error state
    pub async fn status(&self)
      -> Result<crate::GetStatusReply, crate::error::Error>
    {   debug!("status queuing command");
        let (reply_tx, mut reply_rx)
          = mpsc::unbounded_channel();

        self.hand.get_status_tx
          .send(crate::GetStatusArgs { reply: reply_tx })
          .map_err(|_| {
            error!("Backend channel closed");
            crate::error::Error::Other(
              "Backend disconnected".to_string()
            )
          })?;

        reply_rx.recv().await.ok_or_else(|| {
          crate::error::Error::Other(
            "Backend dropped status reply".to_string()
          )
        })
    }

    pub async fn clear_error(&self)
      -> Result<(), crate::error::Error>
    {   debug!("clear_error queuing command");
        let (reply_tx, mut reply_rx)
          = mpsc::unbounded_channel();

        self.hand.clear_error_tx
          .send(crate::ClearErrorArgs { reply: reply_tx })
          .map_err(|_| {
            error!("Backend channel closed");
            crate::error::Error::Other(
              "Backend disconnected".to_string()
            )
          })?;

        reply_rx.recv().await.ok_or_else(|| {
          crate::error::Error::Other(
            "Backend dropped clear_error reply".to_string()
          )
        })
    }

    /// Gracefully shutdown the backend
    pub async fn shutdown(self)
      -> Result<(), crate::error::Error>
    {   debug!("Shutting down TutorBackend");
        let (reply_tx, mut reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::KillProcessArgs
        {   reply: reply_tx
        };

        self.hand.kill_process_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel already closed");
            crate::error::Error::Other(
              "Backend already shutdown".to_string()
            )
          })?;

        // Wait for shutdown confirmation
        if let Some(result) = reply_rx.recv().await
        {   debug!("Backend shutdown confirmed");
            result
        } else
        {   error!("Backend shutdown timeout");
            Err(crate::error::Error::Timeout)
        }
    }
}

/// Main backend event loop
///
/// tokio::select! only routes. Asks are spawned so status queries
/// still answer while a call is in flight.
async fn run_backend_loop<T, C>(
  foot: crate::TutorFoot
, throttle: Arc<CallThrottle<T, C>>
)
where
  T: Transport + 'static,
  C: Clock + Clone + 'static,
{   debug!("Starting TutorBackend event loop");
    let TutorFoot
    {   mut ask_rx
      , mut get_status_rx
      , mut clear_error_rx
      , mut kill_process_rx
    } = foot;

    loop
    { tokio::select!
      { Some(cmd) = ask_rx.recv() => {
          debug!("Received Ask");
          let throttle = Arc::clone(&throttle);
          tokio::spawn(async move {
            let result = throttle
              .make_secure_call(&cmd.prompt, cmd.schema.as_ref())
              .await;
            let _ = cmd.reply.send(result);
          });
        }
      , Some(cmd) = get_status_rx.recv() => {
          debug!("Received GetStatus");
          let _ = cmd.reply.send(throttle.status());
        }
      , Some(cmd) = clear_error_rx.recv() => {
          debug!("Received ClearError");
          throttle.clear_error();
          let _ = cmd.reply.send(());
        }
      , Some(cmd) = kill_process_rx.recv() => {
          debug!("Received KillProcess");
          let _ = cmd.reply.send(Ok(()));
          info!("TutorBackend shutting down");
          break;
        }
      , else => {
          debug!("All command channels closed");
          break;
        }
      }
    }
}
