//! Client subcommands: set, get, has, clear, watch and dump

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::client::{ClientError, PasteboardClient, PasteboardObserver};
use crate::ipc::Status;

use super::args::{DumpArgs, SetArgs};
use super::presenter::Presenter;

/// Client-side failures a user needs to see
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Clipboard is empty")]
    Empty,

    #[error("Could not subscribe to clipboard changes at {0}")]
    SubscribeFailed(String),
}

pub async fn handle_set(
    client: &PasteboardClient,
    args: &SetArgs,
    presenter: &Presenter,
) -> Result<(), CommandError> {
    let data = args.to_paste_data();
    client.try_set_paste_data(&data).await?;
    presenter.success(&format!("Stored {} record(s)", data.record_count()));
    Ok(())
}

pub async fn handle_get(client: &PasteboardClient, presenter: &Presenter) -> Result<(), CommandError> {
    let data = client.try_get_paste_data().await?.ok_or(CommandError::Empty)?;
    presenter.paste_data(&data);
    Ok(())
}

pub async fn handle_has(client: &PasteboardClient, presenter: &Presenter) -> Result<(), CommandError> {
    let has = client.try_has_paste_data().await?;
    presenter.output(&has.to_string());
    Ok(())
}

pub async fn handle_clear(
    client: &PasteboardClient,
    presenter: &Presenter,
) -> Result<(), CommandError> {
    client.try_clear().await?;
    presenter.success("Clipboard cleared");
    Ok(())
}

pub async fn handle_dump(
    client: &PasteboardClient,
    args: DumpArgs,
    presenter: &Presenter,
) -> Result<(), CommandError> {
    match client.dump(&args.to_wire_args()).await {
        Ok(text) => {
            presenter.output(text.trim_end());
            Ok(())
        }
        Err(
            e @ ClientError::Status {
                status: Status::PermissionDenied,
                ..
            },
        ) => {
            presenter.warn("Diagnostics are restricted to system and administrator accounts");
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Forwards change callbacks to the watch loop
struct ChannelObserver {
    tx: mpsc::Sender<()>,
}

#[async_trait]
impl PasteboardObserver for ChannelObserver {
    async fn on_changed(&self) {
        // A full channel already holds a pending refresh
        let _ = self.tx.try_send(());
    }
}

/// Print a line per change until Ctrl-C
pub async fn handle_watch(client: &PasteboardClient, presenter: &Presenter) -> Result<(), CommandError> {
    let (tx, mut rx) = mpsc::channel(1);
    let observer: Arc<dyn PasteboardObserver> = Arc::new(ChannelObserver { tx });
    if !client.add_observer(Arc::clone(&observer)).await {
        return Err(CommandError::SubscribeFailed(client.endpoint()));
    }
    presenter.info("Watching clipboard changes (Ctrl-C to stop)");

    loop {
        tokio::select! {
            changed = rx.recv() => {
                if changed.is_none() {
                    break;
                }
                let data = client.get_paste_data().await;
                presenter.change(data.as_ref());
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    client.remove_observer(Some(&observer)).await;
    Ok(())
}
